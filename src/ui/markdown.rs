//! Markdown to styled terminal lines
//!
//! Rendering is a pure function of the full text, so a block can be redrawn
//! from scratch whenever its accumulated text grows.

use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};

use crate::ui::theme::Palette;

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Unordered,
    Ordered(u64),
}

struct CodeBlock {
    lang: String,
    lines: Vec<String>,
}

/// Render `content` as lines. `highlight` runs code blocks through syntect;
/// leave it off for in-progress text.
pub fn render_markdown(content: &str, palette: &Palette, highlight: bool) -> Vec<Line<'static>> {
    MarkdownRenderer::new(palette, highlight).render(content)
}

struct MarkdownRenderer<'a> {
    palette: &'a Palette,
    highlight: bool,
    lines: Vec<Line<'static>>,
    spans: Vec<Span<'static>>,
    style_stack: Vec<Style>,
    list_stack: Vec<ListKind>,
    quote_depth: usize,
    code_block: Option<CodeBlock>,
}

impl<'a> MarkdownRenderer<'a> {
    fn new(palette: &'a Palette, highlight: bool) -> Self {
        Self {
            palette,
            highlight,
            lines: Vec::new(),
            spans: Vec::new(),
            style_stack: vec![palette.assistant_text_style],
            list_stack: Vec::new(),
            quote_depth: 0,
            code_block: None,
        }
    }

    fn current_style(&self) -> Style {
        self.style_stack.last().copied().unwrap_or_default()
    }

    fn push_modifier(&mut self, modifier: Modifier) {
        let style = self.current_style().add_modifier(modifier);
        self.style_stack.push(style);
    }

    fn pop_style(&mut self) {
        if self.style_stack.len() > 1 {
            self.style_stack.pop();
        }
    }

    fn list_indent(&self) -> usize {
        self.list_stack.len().saturating_sub(1) * 2
    }

    fn line_prefix(&self) -> Vec<Span<'static>> {
        let mut prefix = Vec::new();
        if self.quote_depth > 0 {
            prefix.push(Span::styled(
                "│ ".repeat(self.quote_depth),
                self.palette.md_blockquote,
            ));
        }
        prefix
    }

    fn flush_line(&mut self) {
        if self.spans.is_empty() {
            return;
        }
        let mut spans = self.line_prefix();
        spans.append(&mut self.spans);
        self.lines.push(Line::from(spans));
    }

    fn push_blank_line(&mut self) {
        if self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            return;
        }
        if !self.lines.is_empty() {
            self.lines.push(Line::default());
        }
    }

    fn push_text(&mut self, text: &str) {
        let style = self.current_style();
        self.spans.push(Span::styled(detab(text), style));
    }

    fn render(mut self, content: &str) -> Vec<Line<'static>> {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_TASKLISTS);

        for event in Parser::new_ext(content, options) {
            match event {
                Event::Start(tag) => self.start_tag(tag),
                Event::End(tag_end) => self.end_tag(tag_end),
                Event::Text(text) => match self.code_block.as_mut() {
                    Some(block) => block.lines.extend(text.lines().map(detab)),
                    None => self.push_text(&text),
                },
                Event::Code(code) => {
                    self.spans
                        .push(Span::styled(detab(&code), self.palette.md_inline_code));
                }
                Event::SoftBreak | Event::HardBreak => {
                    self.flush_line();
                    let indent = self.list_indent() + 2 * usize::from(!self.list_stack.is_empty());
                    if indent > 0 {
                        self.spans.push(Span::raw(" ".repeat(indent)));
                    }
                }
                Event::Rule => {
                    self.flush_line();
                    self.lines
                        .push(Line::from(Span::styled("─".repeat(40), self.palette.md_rule)));
                    self.push_blank_line();
                }
                Event::TaskListMarker(checked) => {
                    let marker = if checked { "[x] " } else { "[ ] " };
                    self.spans
                        .push(Span::styled(marker, self.palette.md_list_marker));
                }
                Event::Html(html) | Event::InlineHtml(html) => {
                    for (i, line) in html.lines().enumerate() {
                        if i > 0 {
                            self.flush_line();
                        }
                        self.push_text(line);
                    }
                }
                _ => {}
            }
        }

        self.flush_line();
        while self.lines.last().is_some_and(|line| line.spans.is_empty()) {
            self.lines.pop();
        }
        self.lines
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.flush_line();
                let level = heading_level(level);
                self.style_stack.push(self.palette.md_heading_style(level));
                self.spans.push(Span::styled(
                    format!("{} ", "#".repeat(level as usize)),
                    self.palette.md_heading,
                ));
            }
            Tag::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth += 1;
                self.style_stack.push(self.palette.md_blockquote);
            }
            Tag::List(start) => {
                self.flush_line();
                self.list_stack.push(match start {
                    Some(n) => ListKind::Ordered(n),
                    None => ListKind::Unordered,
                });
            }
            Tag::Item => {
                self.flush_line();
                let marker = match self.list_stack.last_mut() {
                    Some(ListKind::Ordered(n)) => {
                        let current = *n;
                        *n += 1;
                        format!("{current}. ")
                    }
                    _ => "- ".to_string(),
                };
                let indent = " ".repeat(self.list_indent());
                self.spans.push(Span::raw(indent));
                self.spans
                    .push(Span::styled(marker, self.palette.md_list_marker));
            }
            Tag::CodeBlock(kind) => {
                self.flush_line();
                let lang = match kind {
                    CodeBlockKind::Indented => String::new(),
                    CodeBlockKind::Fenced(info) => {
                        info.split_ascii_whitespace().next().unwrap_or("").into()
                    }
                };
                self.code_block = Some(CodeBlock {
                    lang,
                    lines: Vec::new(),
                });
            }
            Tag::Emphasis => self.push_modifier(Modifier::ITALIC),
            Tag::Strong => self.push_modifier(Modifier::BOLD),
            Tag::Strikethrough => self.push_modifier(Modifier::CROSSED_OUT),
            Tag::Link { .. } | Tag::Image { .. } => {
                self.style_stack.push(self.palette.md_link);
            }
            Tag::TableHead => {
                self.push_modifier(Modifier::BOLD);
            }
            Tag::TableCell => {
                if !self.spans.is_empty() {
                    self.spans
                        .push(Span::styled(" │ ", self.palette.md_list_marker));
                }
            }
            _ => {}
        }
    }

    fn end_tag(&mut self, tag_end: TagEnd) {
        match tag_end {
            TagEnd::Paragraph => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.push_blank_line();
                }
            }
            TagEnd::Heading(_) => {
                self.flush_line();
                self.push_blank_line();
                self.pop_style();
            }
            TagEnd::BlockQuote(_) => {
                self.flush_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.pop_style();
            }
            TagEnd::List(_) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.push_blank_line();
                }
            }
            TagEnd::Item => self.flush_line(),
            TagEnd::CodeBlock => {
                if let Some(block) = self.code_block.take() {
                    self.finish_code_block(block);
                }
                self.push_blank_line();
            }
            TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image => self.pop_style(),
            TagEnd::TableHead => {
                self.flush_line();
                self.pop_style();
            }
            TagEnd::TableRow => self.flush_line(),
            TagEnd::Table => {
                self.flush_line();
                self.push_blank_line();
            }
            _ => {}
        }
    }

    fn finish_code_block(&mut self, block: CodeBlock) {
        if block.lines.is_empty() {
            return;
        }
        let highlighted = if self.highlight {
            crate::utils::syntax::highlight_code_block(
                &block.lang,
                &block.lines.join("\n"),
                self.palette,
            )
        } else {
            None
        };
        let produced = highlighted.unwrap_or_else(|| {
            let mut style = self.palette.md_codeblock_text;
            if let Some(bg) = self.palette.md_codeblock_bg {
                style = style.bg(bg);
            }
            block
                .lines
                .into_iter()
                .map(|line| Line::from(Span::styled(line, style)))
                .collect()
        });

        let indent = self.list_indent() + 2 * usize::from(!self.list_stack.is_empty());
        for mut line in produced {
            let mut spans = self.line_prefix();
            if indent > 0 {
                spans.push(Span::raw(" ".repeat(indent)));
            }
            spans.append(&mut line.spans);
            self.lines.push(Line::from(spans));
        }
    }
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn detab(s: &str) -> String {
    s.replace('\t', "    ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(content: &str) -> Vec<String> {
        render_markdown(content, &Palette::dark(), false)
            .iter()
            .map(|line| line.to_string())
            .collect()
    }

    #[test]
    fn paragraphs_are_separated_by_blank_lines() {
        assert_eq!(plain("one\n\ntwo"), vec!["one", "", "two"]);
    }

    #[test]
    fn lists_get_markers_and_nesting() {
        let lines = plain("- a\n- b\n  1. c\n  2. d\n\nafter");
        assert_eq!(lines, vec!["- a", "- b", "  1. c", "  2. d", "", "after"]);
    }

    #[test]
    fn headings_and_emphasis_are_styled() {
        let lines = render_markdown("# Title\n\nsome **bold** text", &Palette::dark(), false);
        assert_eq!(lines[0].to_string(), "# Title");
        let bold = lines[2]
            .spans
            .iter()
            .find(|span| span.content == "bold")
            .expect("bold span");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn code_blocks_keep_their_lines() {
        let lines = plain("```rust\nlet x = 1;\n\tx\n```\nafter");
        assert_eq!(lines, vec!["let x = 1;", "    x", "", "after"]);
    }

    #[test]
    fn unterminated_fence_renders_while_streaming() {
        let lines = plain("Here:\n\n```py\nprint(1)");
        assert_eq!(lines, vec!["Here:", "", "print(1)"]);
    }

    #[test]
    fn highlighted_code_block_has_same_text() {
        let source = "```rust\nfn main() {}\n```";
        let highlighted: Vec<String> = render_markdown(source, &Palette::light(), true)
            .iter()
            .map(|line| line.to_string())
            .collect();
        assert_eq!(highlighted, plain(source));
    }

    #[test]
    fn blockquotes_are_prefixed() {
        assert_eq!(plain("> quoted"), vec!["│ quoted"]);
    }

    #[test]
    fn tables_render_cells_in_rows() {
        let lines = plain("| a | b |\n|---|---|\n| 1 | 2 |");
        assert_eq!(lines, vec!["a │ b", "1 │ 2"]);
    }

    #[test]
    fn empty_input_renders_nothing() {
        assert!(plain("").is_empty());
    }
}
