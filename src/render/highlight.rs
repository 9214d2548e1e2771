use crossterm::style::{Attribute, Color, ContentStyle};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, Style as SyntectStyle, Theme, ThemeSet};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

use super::text::{fg, RenderedLine};

pub const DEFAULT_THEME: &str = "base16-ocean.dark";

/// Syntax set and theme, loaded once and shared by every cell.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    pub fn new(theme_name: &str) -> Self {
        let theme_set = ThemeSet::load_defaults();
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme: resolve_theme(&theme_set, theme_name),
        }
    }

    fn syntax_for(&self, lang: &str) -> &SyntaxReference {
        let lang = lang.trim();
        if lang.is_empty() {
            return self.syntax_set.find_syntax_plain_text();
        }
        self.syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text())
    }

    /// Highlights `code` as `lang` (a name or file extension); unknown
    /// languages render as plain text.
    pub fn highlight(&self, code: &str, lang: &str) -> Vec<RenderedLine> {
        let syntax = self.syntax_for(lang);
        let mut highlighter = HighlightLines::new(syntax, &self.theme);
        let mut lines = Vec::new();

        for line in LinesWithEndings::from(code) {
            let mut clean = line;
            if let Some(trimmed) = clean.strip_suffix('\n') {
                clean = trimmed;
            }
            if let Some(trimmed) = clean.strip_suffix('\r') {
                clean = trimmed;
            }

            let mut rendered = RenderedLine::default();
            let tokens = highlighter
                .highlight_line(line, &self.syntax_set)
                .unwrap_or_default();

            if tokens.is_empty() {
                rendered.push(clean, fg(Color::Green));
            } else {
                for (syn_style, token) in tokens {
                    let token = token.trim_end_matches(['\n', '\r']);
                    rendered.push(token, convert_style(syn_style));
                }
            }
            lines.push(rendered);
        }

        lines
    }
}

fn convert_style(style: SyntectStyle) -> ContentStyle {
    let mut converted = fg(Color::Rgb {
        r: style.foreground.r,
        g: style.foreground.g,
        b: style.foreground.b,
    });
    if style.font_style.contains(FontStyle::BOLD) {
        converted.attributes.set(Attribute::Bold);
    }
    if style.font_style.contains(FontStyle::ITALIC) {
        converted.attributes.set(Attribute::Italic);
    }
    if style.font_style.contains(FontStyle::UNDERLINE) {
        converted.attributes.set(Attribute::Underlined);
    }
    converted
}

fn resolve_theme(theme_set: &ThemeSet, name: &str) -> Theme {
    if let Some(theme) = theme_set.themes.get(name) {
        return theme.clone();
    }
    tracing::warn!(theme = name, "unknown theme, falling back to {DEFAULT_THEME}");
    if let Some(theme) = theme_set.themes.get(DEFAULT_THEME) {
        return theme.clone();
    }
    theme_set
        .themes
        .values()
        .next()
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn highlight_keeps_one_line_per_source_line() {
        let highlighter = Highlighter::new(DEFAULT_THEME);
        let lines = highlighter.highlight("import os\n\nprint(os.getcwd())\n", "python");
        let plain: Vec<&str> = lines.iter().map(|line| line.plain.as_str()).collect();
        assert_eq!(plain, vec!["import os", "", "print(os.getcwd())"]);
    }

    #[test]
    fn highlighted_code_is_split_into_styled_tokens() {
        let highlighter = Highlighter::new(DEFAULT_THEME);
        let lines = highlighter.highlight("def f(x):\n    return x\n", "python");
        assert!(lines[0].segments.len() > 1);
        assert!(lines[0]
            .segments
            .iter()
            .all(|segment| segment.style.foreground_color.is_some()));
    }

    #[test]
    fn unknown_language_falls_back_to_plain_text() {
        let highlighter = Highlighter::new(DEFAULT_THEME);
        let lines = highlighter.highlight("whatever\n", "no-such-language");
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].plain, "whatever");
    }

    #[test]
    fn unknown_theme_falls_back() {
        let highlighter = Highlighter::new("not-a-theme");
        assert!(!highlighter.highlight("x = 1", "python").is_empty());
    }
}
