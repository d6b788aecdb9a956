use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::core::app::{App, AppInit};
use crate::core::chat_stream::StreamEnvelope;
use crate::core::config::Config;
use crate::core::storage::MemoryStorage;
use crate::ui::renderer::{ModelLabel, Renderer, ResponseView};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedView {
    Text(String),
    Error(String),
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    Welcome(String),
    Notice(String),
    Clear,
    Discard,
    BeginTurn {
        turn_id: u64,
        user_text: String,
        models: Vec<String>,
    },
    Update {
        turn_id: u64,
        model_id: String,
        text: String,
    },
    Finish {
        turn_id: u64,
        model_id: String,
        view: RecordedView,
    },
}

/// Renderer double that records every call; clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    events: Rc<RefCell<Vec<RenderEvent>>>,
}

impl RecordingRenderer {
    pub fn events(&self) -> Vec<RenderEvent> {
        self.events.borrow().clone()
    }

    pub fn take(&self) -> Vec<RenderEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    fn push(&self, event: RenderEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl Renderer for RecordingRenderer {
    fn show_welcome(&mut self, message: &str) {
        self.push(RenderEvent::Welcome(message.to_string()));
    }

    fn show_notice(&mut self, message: &str) {
        self.push(RenderEvent::Notice(message.to_string()));
    }

    fn clear_transcript(&mut self) {
        self.push(RenderEvent::Clear);
    }

    fn discard_pending(&mut self) {
        self.push(RenderEvent::Discard);
    }

    fn begin_turn(&mut self, turn_id: u64, user_text: &str, models: &[ModelLabel]) {
        self.push(RenderEvent::BeginTurn {
            turn_id,
            user_text: user_text.to_string(),
            models: models.iter().map(|m| m.id.clone()).collect(),
        });
    }

    fn update_response(&mut self, turn_id: u64, model_id: &str, text: &str) {
        self.push(RenderEvent::Update {
            turn_id,
            model_id: model_id.to_string(),
            text: text.to_string(),
        });
    }

    fn finish_response(&mut self, turn_id: u64, model_id: &str, view: ResponseView<'_>) {
        let view = match view {
            ResponseView::Text(text) => RecordedView::Text(text.to_string()),
            ResponseView::Error(text) => RecordedView::Error(text.to_string()),
            ResponseView::Missing => RecordedView::Missing,
        };
        self.push(RenderEvent::Finish {
            turn_id,
            model_id: model_id.to_string(),
            view,
        });
    }
}

pub struct TestHarness {
    pub app: App,
    pub rx: tokio::sync::mpsc::UnboundedReceiver<StreamEnvelope>,
    pub durable: Arc<MemoryStorage>,
    pub tab: Arc<MemoryStorage>,
    pub renderer: RecordingRenderer,
}

impl TestHarness {
    pub fn new(config: Config) -> Self {
        Self::with_storage(
            config,
            Arc::new(MemoryStorage::new()),
            Arc::new(MemoryStorage::new()),
        )
    }

    pub fn with_storage(config: Config, durable: Arc<MemoryStorage>, tab: Arc<MemoryStorage>) -> Self {
        let renderer = RecordingRenderer::default();
        let (app, rx) = App::new(AppInit {
            config,
            durable: durable.clone(),
            tab: tab.clone(),
            renderer: Box::new(renderer.clone()),
        });
        Self {
            app,
            rx,
            durable,
            tab,
            renderer,
        }
    }

    /// Feed stream messages to the app until no stream is running.
    pub async fn drain_streams(&mut self) {
        while self.app.has_pending_streams() {
            match self.rx.recv().await {
                Some(envelope) => self.app.handle_stream_message(envelope),
                None => break,
            }
        }
    }
}

/// What the fake server sends back for one request.
pub struct CannedResponse {
    pub status: &'static str,
    pub chunks: Vec<String>,
}

impl CannedResponse {
    pub fn ok(chunks: &[&str]) -> Self {
        Self {
            status: "200 OK",
            chunks: chunks.iter().map(|c| c.to_string()).collect(),
        }
    }

    pub fn status(status: &'static str) -> Self {
        Self {
            status,
            chunks: Vec::new(),
        }
    }
}

pub fn content_event(text: &str) -> String {
    format!(
        "data: {}\n",
        serde_json::json!({"choices": [{"delta": {"content": text}}]})
    )
}

/// A chat-completions server answering every request by model id. Returns
/// the base URL to put in [`Config::base_url`].
pub async fn spawn_chat_server(respond: fn(&str) -> CannedResponse) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr");

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(handle_connection(stream, respond));
        }
    });

    format!("http://{addr}/v1")
}

async fn handle_connection(mut stream: TcpStream, respond: fn(&str) -> CannedResponse) {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    let header_end = loop {
        let Ok(read) = stream.read(&mut buf).await else {
            return;
        };
        if read == 0 {
            return;
        }
        data.extend_from_slice(&buf[..read]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|line| line.strip_prefix("content-length:"))
        .and_then(|value| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    while data.len() < header_end + content_length {
        match stream.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(read) => data.extend_from_slice(&buf[..read]),
        }
    }

    let body: serde_json::Value =
        serde_json::from_slice(&data[header_end..header_end + content_length])
            .unwrap_or(serde_json::Value::Null);
    let model = body["model"].as_str().unwrap_or_default().to_string();
    let canned = respond(&model);

    let head = format!(
        "HTTP/1.1 {}\r\nContent-Type: text/event-stream\r\nConnection: close\r\n\r\n",
        canned.status
    );
    if stream.write_all(head.as_bytes()).await.is_err() {
        return;
    }
    for chunk in canned.chunks {
        if stream.write_all(chunk.as_bytes()).await.is_err() {
            return;
        }
        let _ = stream.flush().await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }
    let _ = stream.shutdown().await;
}
