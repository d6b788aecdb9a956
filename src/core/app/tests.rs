use super::*;
use crate::core::access_code::AccessCode;
use crate::core::chat_stream::{StreamKey, StreamMessage, StreamStatus};
use crate::core::constants::{EMPTY_HISTORY_MESSAGE, THEME_KEY};
use crate::core::errors::{AppError, ValidationError};
use crate::core::models::default_model_ids;
use crate::core::session::{Session, Theme, Turn};
use crate::core::session_store::SessionStore;
use crate::utils::test_utils::{
    content_event, spawn_chat_server, CannedResponse, RecordedView, RenderEvent, TestHarness,
};

const CODE: &str = "TestCode42";

fn code() -> AccessCode {
    AccessCode::parse(CODE).unwrap()
}

fn hello_or_fail(model: &str) -> CannedResponse {
    match model {
        "acme/m2" => CannedResponse::status("500 Internal Server Error"),
        _ => CannedResponse::ok(&[
            &content_event("Hel"),
            &content_event("lo"),
            "data: [DONE]\n",
        ]),
    }
}

fn always_hello(_model: &str) -> CannedResponse {
    hello_or_fail("any")
}

fn config_for(base_url: Option<String>) -> Config {
    Config {
        base_url,
        ..Default::default()
    }
}

fn stored(harness: &TestHarness) -> Option<Session> {
    harness.app.store().load(&code()).expect("load")
}

/// Enter a session with a key and exactly the given active models.
fn ready_harness(base_url: Option<String>, models: &[&str]) -> TestHarness {
    let mut harness = TestHarness::new(config_for(base_url));
    harness.app.enter_session(CODE).expect("enter");
    harness.app.set_api_key("sk-test").expect("key");
    let state = harness.app.state.as_mut().expect("state");
    state.session.active_model_ids = models.iter().map(|m| m.to_string()).collect();
    harness.app.checkpoint();
    harness
}

#[test]
fn invalid_code_leaves_state_untouched() {
    let mut harness = TestHarness::new(Config::default());
    let err = harness.app.enter_session("short").expect_err("invalid");
    assert!(matches!(
        err,
        AppError::Validation(ValidationError::InvalidAccessCode)
    ));
    assert!(harness.app.state().is_none());
    assert!(harness.durable.keys().unwrap().is_empty());

    harness.app.enter_session(CODE).expect("valid");
    let before = harness.app.state().cloned();
    assert!(harness.app.enter_session("bad code!").is_err());
    assert_eq!(harness.app.state().cloned(), before);
}

#[test]
fn new_code_is_claimed_with_defaults() {
    let mut harness = TestHarness::new(Config::default());
    harness.app.enter_session(&format!("  {CODE} ")).expect("enter");

    let state = harness.app.state().expect("state");
    assert_eq!(state.code.as_str(), CODE);
    assert_eq!(state.session.active_model_ids, default_model_ids());
    assert!(state.session.history.is_empty());
    assert!(!state.is_incognito);

    assert_eq!(stored(&harness), Some(state.session.clone()));
    assert_eq!(
        harness.renderer.events(),
        vec![
            RenderEvent::Clear,
            RenderEvent::Welcome(EMPTY_HISTORY_MESSAGE.to_string())
        ]
    );
    assert_eq!(harness.app.preferences().resumable_code(), Some(code()));
}

#[test]
fn submit_preconditions_block_turn_creation() {
    let mut harness = TestHarness::new(Config::default());
    assert!(matches!(
        harness.app.submit_turn("hello"),
        Err(AppError::Validation(ValidationError::NoActiveSession))
    ));

    harness.app.enter_session(CODE).expect("enter");
    assert!(matches!(
        harness.app.submit_turn("hello"),
        Err(AppError::Validation(ValidationError::MissingApiKey))
    ));

    harness.app.set_api_key("sk-test").expect("key");
    assert!(matches!(
        harness.app.submit_turn("   \n"),
        Err(AppError::Validation(ValidationError::EmptyMessage))
    ));

    harness
        .app
        .state
        .as_mut()
        .unwrap()
        .session
        .active_model_ids
        .clear();
    assert!(matches!(
        harness.app.submit_turn("hello"),
        Err(AppError::Validation(ValidationError::NoActiveModels))
    ));

    assert!(harness.app.state().unwrap().session.history.is_empty());
    assert!(!harness.app.has_pending_streams());
}

#[tokio::test]
async fn fan_out_commits_each_model_independently() {
    let base_url = spawn_chat_server(hello_or_fail).await;
    let mut harness = ready_harness(Some(base_url), &["acme/m1", "acme/m2", "acme/m3"]);

    let turn_id = harness.app.submit_turn("  Say hello  ").expect("submit");

    {
        let session = stored(&harness).expect("turn checkpointed before streaming");
        let turn = session.history.last().expect("turn");
        assert_eq!(turn.id, turn_id);
        assert_eq!(turn.user_text, "Say hello");
        assert_eq!(turn.model_ids.len(), 3);
        assert!(turn.responses.is_empty());
    }

    harness.drain_streams().await;

    let state = harness.app.state().expect("state");
    let turn = state.session.history.last().expect("turn");
    assert_eq!(turn.user_text, "Say hello");
    assert_eq!(turn.response("acme/m1"), Some("Hello"));
    assert_eq!(turn.response("acme/m3"), Some("Hello"));
    assert_eq!(turn.response("acme/m2"), Some("Error: API Error: 500"));
    assert_eq!(turn.responses.len(), 3);

    assert_eq!(stored(&harness), Some(state.session.clone()));

    let events = harness.renderer.events();
    let finishes: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            RenderEvent::Finish { model_id, view, .. } => Some((model_id.clone(), view.clone())),
            _ => None,
        })
        .collect();
    assert_eq!(finishes.len(), 3);
    assert!(finishes.contains(&(
        "acme/m2".to_string(),
        RecordedView::Error("Error: API Error: 500".into())
    )));

    let m1_updates: Vec<_> = events
        .iter()
        .filter_map(|event| match event {
            RenderEvent::Update { model_id, text, .. } if model_id == "acme/m1" => {
                Some(text.clone())
            }
            _ => None,
        })
        .collect();
    assert_eq!(m1_updates, vec!["Hel".to_string(), "Hello".to_string()]);
}

#[tokio::test]
async fn incognito_never_touches_durable_storage() {
    let base_url = spawn_chat_server(always_hello).await;
    let mut harness = TestHarness::new(config_for(Some(base_url)));
    assert!(harness.app.toggle_incognito(None));

    harness.app.enter_session(CODE).expect("enter");
    assert!(harness.app.state().unwrap().is_incognito);
    harness.app.set_api_key("sk-test").expect("key");
    harness.app.toggle_model("google/gemini-2.0-flash-exp:free").expect("toggle");
    harness.app.add_custom_model("acme/extra").expect("add");
    harness.app.submit_turn("secret question").expect("submit");
    harness.drain_streams().await;

    assert!(harness.durable.keys().unwrap().is_empty());
    assert_eq!(harness.app.preferences().resumable_code(), None);

    let turn = harness.app.state().unwrap().session.history.last().cloned().unwrap();
    assert_eq!(turn.response("acme/extra"), Some("Hello"));
}

#[test]
fn incognito_entry_ignores_stored_history() {
    let mut harness = TestHarness::new(Config::default());
    let mut session = harness.app.store().fresh_session();
    session.history.push(Turn::new(1, "old", vec!["a".into()]));
    harness.app.store().save(&code(), &session).unwrap();

    harness.app.toggle_incognito(Some(true));
    harness.app.enter_session(CODE).expect("enter");
    let state = harness.app.state().unwrap();
    assert!(state.session.history.is_empty());
    assert_eq!(state.session.active_model_ids, default_model_ids());
    assert_eq!(stored(&harness), Some(session));
}

#[tokio::test]
async fn leaving_incognito_mid_session_keeps_stored_record() {
    let base_url = spawn_chat_server(always_hello).await;
    let mut harness = TestHarness::new(config_for(Some(base_url)));
    let mut saved = harness.app.store().fresh_session();
    saved.api_key = "real-key".into();
    saved.history.push(Turn::new(1, "precious", vec!["a/one".into()]));
    harness.app.store().save(&code(), &saved).unwrap();

    harness.app.toggle_incognito(Some(true));
    harness.app.enter_session(CODE).expect("enter");
    harness.app.set_api_key("sk-incognito").expect("key");
    harness.app.submit_turn("secret incognito text").expect("submit");

    assert!(!harness.app.toggle_incognito(Some(false)));
    assert!(harness.app.is_incognito());
    harness.app.switch_theme(Theme::Dark);
    harness.drain_streams().await;
    harness.app.checkpoint();
    assert_eq!(stored(&harness), Some(saved.clone()));

    harness.app.logout();
    harness.app.enter_session(CODE).expect("re-enter");
    let state = harness.app.state().unwrap();
    assert!(!state.is_incognito);
    assert_eq!(state.session.api_key, "real-key");
    assert_eq!(state.session.history, saved.history);
}

#[test]
fn entering_incognito_mid_session_applies_on_next_entry() {
    let mut harness = TestHarness::new(Config::default());
    harness.app.enter_session(CODE).expect("enter");
    assert!(harness.app.toggle_incognito(None));
    assert!(!harness.app.is_incognito());

    harness.app.set_api_key("sk-still-saved").expect("key");
    assert_eq!(stored(&harness).unwrap().api_key, "sk-still-saved");

    harness.app.logout();
    harness.app.enter_session(CODE).expect("re-enter");
    assert!(harness.app.is_incognito());
    assert!(harness.app.state().unwrap().session.api_key.is_empty());
}

#[test]
fn reentering_replays_saved_history() {
    let mut harness = TestHarness::new(Config::default());
    let mut turn = Turn::new(10, "What is Rust?", vec!["a/one".into(), "b/two".into()]);
    turn.record_response("a/one", "A language.");
    let skipped = Turn::new(11, "ghost", Vec::new());
    let mut session = harness.app.store().fresh_session();
    session.history = vec![turn, skipped];
    harness.app.store().save(&code(), &session).unwrap();

    harness.app.enter_session(CODE).expect("enter");
    assert_eq!(
        harness.renderer.take(),
        vec![
            RenderEvent::Clear,
            RenderEvent::BeginTurn {
                turn_id: 10,
                user_text: "What is Rust?".into(),
                models: vec!["a/one".into(), "b/two".into()],
            },
            RenderEvent::Finish {
                turn_id: 10,
                model_id: "a/one".into(),
                view: RecordedView::Text("A language.".into()),
            },
            RenderEvent::Finish {
                turn_id: 10,
                model_id: "b/two".into(),
                view: RecordedView::Missing,
            },
        ]
    );
}

#[test]
fn duplicate_or_stale_completions_commit_once() {
    let mut harness = ready_harness(None, &["acme/m1"]);
    let turn = Turn::new(99, "q", vec!["acme/m1".into()]);
    harness.app.state.as_mut().unwrap().session.history.push(turn);

    let key = StreamKey::new(99, "acme/m1");
    harness.app.streams.track_for_test(key.clone());
    harness.app.handle_stream_message((
        key.clone(),
        StreamMessage::Finished {
            status: StreamStatus::Done,
            text: "first".into(),
        },
    ));
    harness.app.handle_stream_message((
        key.clone(),
        StreamMessage::Finished {
            status: StreamStatus::Done,
            text: "second".into(),
        },
    ));
    harness
        .app
        .handle_stream_message((key, StreamMessage::Progress("late".into())));

    let state = harness.app.state().unwrap();
    let turn = state.session.history.last().unwrap();
    assert_eq!(turn.response("acme/m1"), Some("first"));
    assert_eq!(stored(&harness).unwrap(), state.session);
    assert!(!harness
        .renderer
        .events()
        .iter()
        .any(|e| matches!(e, RenderEvent::Update { .. })));
}

#[test]
fn logout_cancels_streams_and_forgets_code() {
    let mut harness = ready_harness(None, &["acme/m1"]);
    let key = StreamKey::new(5, "acme/m1");
    harness.app.streams.track_for_test(key.clone());
    assert!(harness.app.has_pending_streams());

    harness.renderer.take();
    harness.app.logout();
    assert_eq!(harness.renderer.events(), vec![RenderEvent::Discard]);
    assert!(!harness.app.has_pending_streams());
    assert!(harness.app.state().is_none());
    assert_eq!(harness.app.preferences().resumable_code(), None);

    harness.app.handle_stream_message((
        key,
        StreamMessage::Finished {
            status: StreamStatus::Done,
            text: "too late".into(),
        },
    ));
    let session = stored(&harness).unwrap();
    assert!(session.history.iter().all(|t| t.responses.is_empty()));
}

#[test]
fn resume_reenters_remembered_session_in_same_tab() {
    let mut first = TestHarness::new(Config::default());
    first.app.enter_session(CODE).expect("enter");
    first.app.set_api_key("sk-keep").expect("key");

    let mut second =
        TestHarness::with_storage(Config::default(), first.durable.clone(), first.tab.clone());
    second.app.resume().expect("something to resume").expect("resumed");
    assert_eq!(second.app.state().unwrap().session.api_key, "sk-keep");

    let mut fresh_tab = TestHarness::with_storage(
        Config::default(),
        first.durable.clone(),
        Arc::new(crate::core::storage::MemoryStorage::new()),
    );
    assert!(fresh_tab.app.resume().is_none());
}

#[test]
fn reset_session_removes_record_and_logs_out() {
    let mut harness = TestHarness::new(Config::default());
    harness.app.enter_session(CODE).expect("enter");
    assert!(stored(&harness).is_some());

    harness.app.reset_session().expect("reset");
    assert!(stored(&harness).is_none());
    assert!(harness.app.state().is_none());
}

#[test]
fn custom_model_management_checkpoints() {
    let mut harness = TestHarness::new(Config::default());
    harness.app.enter_session(CODE).expect("enter");

    let model = harness.app.add_custom_model(" openai/gpt-4o ").expect("add");
    assert_eq!(model.name, "Gpt-4o");
    assert!(harness.app.state().unwrap().is_active("openai/gpt-4o"));
    assert!(matches!(
        harness.app.add_custom_model("openai/gpt-4o"),
        Err(AppError::Validation(ValidationError::DuplicateModel(_)))
    ));
    assert!(matches!(
        harness.app.add_custom_model("deepseek/deepseek-r1:free"),
        Err(AppError::Validation(ValidationError::DuplicateModel(_)))
    ));

    harness
        .app
        .rename_custom_model("openai/gpt-4o", "  GPT Omni ")
        .expect("rename");
    assert_eq!(
        stored(&harness).unwrap().custom_models[0].name,
        "GPT Omni"
    );

    assert!(!harness.app.toggle_model("openai/gpt-4o").expect("toggle off"));
    assert!(harness.app.toggle_model("openai/gpt-4o").expect("toggle on"));
    assert!(harness.app.toggle_model("nobody/none").is_err());

    harness.app.remove_custom_model("openai/gpt-4o").expect("remove");
    let session = stored(&harness).unwrap();
    assert!(session.custom_models.is_empty());
    assert!(!session.active_model_ids.iter().any(|id| id == "openai/gpt-4o"));

    harness.app.toggle_model("mistralai/mistral-7b-instruct:free").expect("toggle");
    harness.app.add_custom_model("acme/x").expect("add");
    harness.app.reset_models().expect("reset");
    let session = stored(&harness).unwrap();
    assert!(session.custom_models.is_empty());
    assert_eq!(session.active_model_ids, default_model_ids());
}

#[test]
fn settings_are_trimmed_and_saved() {
    let mut harness = TestHarness::new(Config::default());
    harness.app.enter_session(CODE).expect("enter");
    harness
        .app
        .save_settings("  sk-abc ", "\n Be terse. ")
        .expect("save");
    let session = stored(&harness).unwrap();
    assert_eq!(session.api_key, "sk-abc");
    assert_eq!(session.system_prompt, "Be terse.");
}

#[test]
fn theme_preference_overrides_session_theme() {
    let mut harness = TestHarness::new(Config::default());
    harness.app.enter_session(CODE).expect("enter");
    harness.app.switch_theme(Theme::Snow);
    assert_eq!(stored(&harness).unwrap().theme, Theme::Snow);
    assert_eq!(
        harness.durable.get(THEME_KEY).unwrap().as_deref(),
        Some("theme-snow")
    );

    harness.durable.set(THEME_KEY, "theme-dark").unwrap();
    harness.app.logout();
    harness.app.enter_session(CODE).expect("re-enter");
    assert_eq!(harness.app.theme(), Theme::Dark);
}

#[test]
fn turn_ids_strictly_increase() {
    let mut harness = TestHarness::new(Config::default());
    let first = harness.app.next_turn_id();
    let second = harness.app.next_turn_id();
    let third = harness.app.next_turn_id();
    assert!(first < second && second < third);
}

#[test]
fn storage_key_is_prefixed_code() {
    assert_eq!(SessionStore::storage_key(&code()), "hareambot_data_TestCode42");
}
