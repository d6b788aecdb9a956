use crate::ui::theme::Palette;
use ratatui::style::{Color as TuiColor, Style};
use ratatui::text::{Line, Span};
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, MutexGuard, OnceLock};

// Bounded FIFO cache of highlighted blocks, keyed by (lang_norm, hash)

fn hash_code(lang: &str, code: &str, theme_sig: &str) -> u64 {
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    theme_sig.hash(&mut hasher);
    hasher.finish()
}

struct SimpleCache {
    map: HashMap<(String, u64), Vec<Line<'static>>>,
    order: VecDeque<(String, u64)>,
    cap: usize,
}

impl SimpleCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, k: &(String, u64)) -> Option<Vec<Line<'static>>> {
        self.map.get(k).cloned()
    }

    fn put(&mut self, k: (String, u64), v: Vec<Line<'static>>) {
        if !self.map.contains_key(&k) {
            self.order.push_back(k.clone());
        }
        self.map.insert(k, v);
        while self.map.len() > self.cap {
            match self.order.pop_front() {
                Some(old) => {
                    self.map.remove(&old);
                }
                None => break,
            }
        }
    }
}

const CACHE_CAPACITY: usize = 64;

static SYNTAX_CACHE: Mutex<Option<SimpleCache>> = Mutex::new(None);

fn cache() -> MutexGuard<'static, Option<SimpleCache>> {
    let mut guard = SYNTAX_CACHE
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    if guard.is_none() {
        *guard = Some(SimpleCache::new(CACHE_CAPACITY));
    }
    guard
}

fn normalize_lang_hint(s: &str) -> String {
    let t = s.trim().to_ascii_lowercase();
    match t.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kotlin" | "kt" => "kotlin".into(),
        other => other.into(),
    }
}

fn syntect_theme_name(palette: &Palette) -> &'static str {
    if palette.is_dark() {
        "base16-ocean.dark"
    } else {
        "InspiredGitHub"
    }
}

fn theme_signature(palette: &Palette, chosen_syntect: &str) -> String {
    format!(
        "{}|{:?}|{:?}",
        chosen_syntect, palette.md_codeblock_bg, palette.background_color
    )
}

/// Highlight a fenced code block. `None` when no syntect theme is available
/// or highlighting fails; callers fall back to plain lines.
pub fn highlight_code_block(
    lang_hint: &str,
    code: &str,
    palette: &Palette,
) -> Option<Vec<Line<'static>>> {
    static SYNTAX_SET: OnceLock<syntect::parsing::SyntaxSet> = OnceLock::new();
    static THEME_SET: OnceLock<syntect::highlighting::ThemeSet> = OnceLock::new();
    let ps = SYNTAX_SET.get_or_init(syntect::parsing::SyntaxSet::load_defaults_newlines);
    let ts = THEME_SET.get_or_init(syntect::highlighting::ThemeSet::load_defaults);

    let theme_name = syntect_theme_name(palette);
    let syn_theme = ts
        .themes
        .get(theme_name)
        .or_else(|| ts.themes.get("base16-ocean.light"))?;

    let lang_norm = normalize_lang_hint(lang_hint);
    let sig = theme_signature(palette, theme_name);
    let key = (lang_norm.clone(), hash_code(&lang_norm, code, &sig));
    if let Some(lines) = cache().as_ref().and_then(|c| c.get(&key)) {
        return Some(lines);
    }

    let syntax = ps
        .find_syntax_by_token(&lang_norm)
        .unwrap_or_else(|| ps.find_syntax_plain_text());
    let mut highlighter = syntect::easy::HighlightLines::new(syntax, syn_theme);

    let mut out: Vec<Line<'static>> = Vec::new();
    for line in syntect::util::LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, ps).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let fg = style.foreground;
                let mut st = Style::default().fg(TuiColor::Rgb(fg.r, fg.g, fg.b));
                if let Some(bg) = palette.md_codeblock_bg {
                    st = st.bg(bg);
                }
                Span::styled(text.trim_end_matches('\n').to_string(), st)
            })
            .collect();
        out.push(Line::from(spans));
    }

    if let Some(c) = cache().as_mut() {
        c.put(key, out.clone());
    }
    Some(out)
}
