use ratatui::style::{Color, Modifier, Style};

use crate::core::session::Theme;

/// Terminal styles for one of the three session themes.
#[derive(Debug, Clone)]
pub struct Palette {
    pub background_color: Color,
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub model_header_style: Style,
    pub assistant_text_style: Style,
    pub error_style: Style,
    pub missing_style: Style,
    pub notice_style: Style,
    pub welcome_style: Style,
    pub streaming_indicator_style: Style,

    pub md_heading: Style,
    pub md_link: Style,
    pub md_inline_code: Style,
    pub md_blockquote: Style,
    pub md_list_marker: Style,
    pub md_rule: Style,
    pub md_codeblock_text: Style,
    pub md_codeblock_bg: Option<Color>,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Light => Self::light(),
            Theme::Dark => Self::dark(),
            Theme::Snow => Self::snow(),
        }
    }

    pub fn light() -> Self {
        Palette {
            background_color: Color::White,
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            model_header_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::Black),
            error_style: Style::default().fg(Color::Red),
            missing_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            notice_style: Style::default().fg(Color::DarkGray),
            welcome_style: Style::default()
                .fg(Color::DarkGray)
                .add_modifier(Modifier::ITALIC),
            streaming_indicator_style: Style::default().fg(Color::DarkGray),

            md_heading: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            md_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),
            md_inline_code: Style::default().fg(Color::Rgb(163, 21, 21)),
            md_blockquote: Style::default().fg(Color::DarkGray),
            md_list_marker: Style::default().fg(Color::DarkGray),
            md_rule: Style::default().fg(Color::Gray),
            md_codeblock_text: Style::default().fg(Color::Black),
            md_codeblock_bg: Some(Color::Rgb(240, 240, 240)),
        }
    }

    pub fn dark() -> Self {
        Palette {
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            model_header_style: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            assistant_text_style: Style::default().fg(Color::White),
            error_style: Style::default().fg(Color::LightRed),
            missing_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            notice_style: Style::default().fg(Color::Gray),
            welcome_style: Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
            streaming_indicator_style: Style::default().fg(Color::Gray),

            md_heading: Style::default()
                .fg(Color::LightCyan)
                .add_modifier(Modifier::BOLD),
            md_link: Style::default()
                .fg(Color::LightBlue)
                .add_modifier(Modifier::UNDERLINED),
            md_inline_code: Style::default().fg(Color::LightYellow),
            md_blockquote: Style::default().fg(Color::Gray),
            md_list_marker: Style::default().fg(Color::Gray),
            md_rule: Style::default().fg(Color::DarkGray),
            md_codeblock_text: Style::default().fg(Color::White),
            md_codeblock_bg: Some(Color::Rgb(30, 30, 30)),
        }
    }

    /// Pale blue-white variant of the light palette.
    pub fn snow() -> Self {
        Palette {
            background_color: Color::Rgb(245, 248, 252),
            user_prefix_style: Style::default()
                .fg(Color::Rgb(40, 90, 160))
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Rgb(40, 90, 160)),
            model_header_style: Style::default()
                .fg(Color::Rgb(70, 110, 150))
                .add_modifier(Modifier::BOLD),
            md_heading: Style::default()
                .fg(Color::Rgb(40, 90, 160))
                .add_modifier(Modifier::BOLD),
            md_codeblock_bg: Some(Color::Rgb(232, 238, 246)),
            ..Self::light()
        }
    }

    pub fn is_dark(&self) -> bool {
        match self.background_color {
            Color::Rgb(r, g, b) => {
                let brightness = 0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32;
                brightness < 128.0
            }
            Color::White | Color::Gray => false,
            _ => true,
        }
    }

    pub fn md_heading_style(&self, level: u8) -> Style {
        match level {
            1 => self.md_heading.add_modifier(Modifier::UNDERLINED),
            _ => self.md_heading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_follow_session_theme_brightness() {
        assert!(Palette::for_theme(Theme::Dark).is_dark());
        assert!(!Palette::for_theme(Theme::Light).is_dark());
        assert!(!Palette::for_theme(Theme::Snow).is_dark());
    }

    #[test]
    fn snow_shares_light_error_styles() {
        let snow = Palette::snow();
        let light = Palette::light();
        assert_eq!(snow.error_style, light.error_style);
        assert_ne!(snow.md_codeblock_bg, light.md_codeblock_bg);
    }
}
