//! Line-oriented terminal renderer
//!
//! Finished blocks are printed to the transcript writer once, fully rendered
//! and highlighted. While streams run, a single status line on a second
//! writer shows how far each block has got; its preview is re-rendered from
//! the whole accumulated text on every update.

use std::collections::BTreeMap;
use std::io::{self, Write};

use ratatui::crossterm::{
    cursor::{MoveTo, MoveToColumn},
    queue,
    style::{
        Attribute, Color as CColor, Print, ResetColor, SetAttribute, SetBackgroundColor,
        SetForegroundColor,
    },
    terminal::{Clear, ClearType},
};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use tracing::warn;

use crate::core::constants::NO_RESPONSE_SAVED;
use crate::core::session::Theme;
use crate::ui::markdown::render_markdown;
use crate::ui::renderer::{ModelLabel, Renderer, ResponseView};
use crate::ui::theme::Palette;

const USER_PREFIX: &str = "You: ";
const PREVIEW_WIDTH: usize = 48;

struct PendingBlock {
    name: String,
    preview: Vec<Line<'static>>,
}

pub struct TerminalRenderer<W: Write, S: Write> {
    out: W,
    status: S,
    palette: Palette,
    styled: bool,
    pending: BTreeMap<(u64, String), PendingBlock>,
    status_visible: bool,
}

impl TerminalRenderer<io::Stdout, io::Stderr> {
    /// Render to stdout with the status line on stderr.
    pub fn stdout(styled: bool) -> Self {
        Self::new(io::stdout(), io::stderr(), styled)
    }
}

impl<W: Write, S: Write> TerminalRenderer<W, S> {
    pub fn new(out: W, status: S, styled: bool) -> Self {
        Self {
            out,
            status,
            palette: Palette::for_theme(Theme::default()),
            styled,
            pending: BTreeMap::new(),
            status_visible: false,
        }
    }

    pub fn into_parts(self) -> (W, S) {
        (self.out, self.status)
    }

    fn report(result: io::Result<()>) {
        if let Err(err) = result {
            warn!(error = %err, "terminal write failed");
        }
    }

    fn write_lines(&mut self, lines: &[Line<'_>]) -> io::Result<()> {
        self.clear_status()?;
        for line in lines {
            write_line(&mut self.out, line, self.styled)?;
        }
        self.out.flush()
    }

    fn clear_status(&mut self) -> io::Result<()> {
        if self.status_visible {
            queue!(self.status, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
            self.status.flush()?;
            self.status_visible = false;
        }
        Ok(())
    }

    fn draw_status(&mut self) -> io::Result<()> {
        if !self.styled {
            return Ok(());
        }
        if self.pending.is_empty() {
            return self.clear_status();
        }

        let summary = self
            .pending
            .values()
            .map(|block| {
                let last = block
                    .preview
                    .iter()
                    .rev()
                    .map(|line| line.to_string())
                    .find(|text| !text.trim().is_empty());
                match last {
                    Some(text) => format!("{}: {}", block.name, truncate(text.trim(), PREVIEW_WIDTH)),
                    None => format!("{}: …", block.name),
                }
            })
            .collect::<Vec<_>>()
            .join("  |  ");
        let line = Line::from(Span::styled(
            format!("⏳ {summary}"),
            self.palette.streaming_indicator_style,
        ));

        queue!(self.status, MoveToColumn(0), Clear(ClearType::CurrentLine))?;
        write_spans(&mut self.status, &line, true)?;
        self.status.flush()?;
        self.status_visible = true;
        Ok(())
    }

    fn clear_screen(&mut self) -> io::Result<()> {
        self.clear_status()?;
        if self.styled {
            queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        }
        self.out.flush()
    }

    fn header_line(&self, name: &str) -> Line<'static> {
        Line::from(vec![
            Span::styled("── ", self.palette.model_header_style),
            Span::styled(name.to_string(), self.palette.model_header_style),
            Span::styled(" ──", self.palette.model_header_style),
        ])
    }
}

impl<W: Write, S: Write> Renderer for TerminalRenderer<W, S> {
    fn show_welcome(&mut self, message: &str) {
        let line = Line::from(Span::styled(message.to_string(), self.palette.welcome_style));
        let result = self.write_lines(&[line, Line::default()]);
        Self::report(result);
    }

    fn show_notice(&mut self, message: &str) {
        let lines: Vec<Line> = message
            .lines()
            .map(|text| Line::from(Span::styled(text.to_string(), self.palette.notice_style)))
            .collect();
        let result = self.write_lines(&lines).and_then(|_| self.draw_status());
        Self::report(result);
    }

    fn clear_transcript(&mut self) {
        self.pending.clear();
        let result = self.clear_screen();
        Self::report(result);
    }

    fn discard_pending(&mut self) {
        self.pending.clear();
        let result = self.clear_status();
        Self::report(result);
    }

    fn begin_turn(&mut self, turn_id: u64, user_text: &str, models: &[ModelLabel]) {
        let mut lines = Vec::new();
        for (i, text) in user_text.lines().enumerate() {
            let prefix = if i == 0 {
                USER_PREFIX.to_string()
            } else {
                " ".repeat(USER_PREFIX.len())
            };
            lines.push(Line::from(vec![
                Span::styled(prefix, self.palette.user_prefix_style),
                Span::styled(text.to_string(), self.palette.user_text_style),
            ]));
        }
        lines.push(Line::default());

        for model in models {
            self.pending.insert(
                (turn_id, model.id.clone()),
                PendingBlock {
                    name: model.name.clone(),
                    preview: Vec::new(),
                },
            );
        }
        let result = self.write_lines(&lines).and_then(|_| self.draw_status());
        Self::report(result);
    }

    fn update_response(&mut self, turn_id: u64, model_id: &str, text: &str) {
        let Some(block) = self.pending.get_mut(&(turn_id, model_id.to_string())) else {
            return;
        };
        block.preview = render_markdown(text, &self.palette, false);
        let result = self.draw_status();
        Self::report(result);
    }

    fn finish_response(&mut self, turn_id: u64, model_id: &str, view: ResponseView<'_>) {
        let name = self
            .pending
            .remove(&(turn_id, model_id.to_string()))
            .map(|block| block.name)
            .unwrap_or_else(|| model_id.to_string());

        let mut lines = vec![self.header_line(&name)];
        match view {
            ResponseView::Text(text) => {
                lines.extend(render_markdown(text, &self.palette, true));
            }
            ResponseView::Error(text) => {
                lines.extend(
                    text.lines()
                        .map(|l| Line::from(Span::styled(l.to_string(), self.palette.error_style))),
                );
            }
            ResponseView::Missing => {
                lines.push(Line::from(Span::styled(
                    NO_RESPONSE_SAVED,
                    self.palette.missing_style,
                )));
            }
        }
        lines.push(Line::default());

        let result = self.write_lines(&lines).and_then(|_| self.draw_status());
        Self::report(result);
    }

    fn apply_theme(&mut self, theme: Theme) {
        self.palette = Palette::for_theme(theme);
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

fn to_crossterm(color: Color) -> CColor {
    match color {
        Color::Reset => CColor::Reset,
        Color::Black => CColor::Black,
        Color::Red => CColor::DarkRed,
        Color::Green => CColor::DarkGreen,
        Color::Yellow => CColor::DarkYellow,
        Color::Blue => CColor::DarkBlue,
        Color::Magenta => CColor::DarkMagenta,
        Color::Cyan => CColor::DarkCyan,
        Color::Gray => CColor::Grey,
        Color::DarkGray => CColor::DarkGrey,
        Color::LightRed => CColor::Red,
        Color::LightGreen => CColor::Green,
        Color::LightYellow => CColor::Yellow,
        Color::LightBlue => CColor::Blue,
        Color::LightMagenta => CColor::Magenta,
        Color::LightCyan => CColor::Cyan,
        Color::White => CColor::White,
        Color::Rgb(r, g, b) => CColor::Rgb { r, g, b },
        Color::Indexed(i) => CColor::AnsiValue(i),
    }
}

fn apply_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(to_crossterm(fg)))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(to_crossterm(bg)))?;
    }
    let modifiers = [
        (Modifier::BOLD, Attribute::Bold),
        (Modifier::DIM, Attribute::Dim),
        (Modifier::ITALIC, Attribute::Italic),
        (Modifier::UNDERLINED, Attribute::Underlined),
        (Modifier::REVERSED, Attribute::Reverse),
        (Modifier::CROSSED_OUT, Attribute::CrossedOut),
    ];
    for (modifier, attribute) in modifiers {
        if style.add_modifier.contains(modifier) {
            queue!(out, SetAttribute(attribute))?;
        }
    }
    Ok(())
}

fn write_spans<W: Write>(out: &mut W, line: &Line<'_>, styled: bool) -> io::Result<()> {
    for span in &line.spans {
        if styled {
            apply_style(out, line.style.patch(span.style))?;
            queue!(
                out,
                Print(span.content.as_ref()),
                SetAttribute(Attribute::Reset),
                ResetColor
            )?;
        } else {
            out.write_all(span.content.as_bytes())?;
        }
    }
    Ok(())
}

fn write_line<W: Write>(out: &mut W, line: &Line<'_>, styled: bool) -> io::Result<()> {
    write_spans(out, line, styled)?;
    out.write_all(b"\n")
}
