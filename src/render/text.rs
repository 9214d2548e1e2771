use std::borrow::Cow;
use std::sync::OnceLock;

use crossterm::style::{Attribute, Color, ContentStyle};
use regex::Regex;
use unicode_width::UnicodeWidthStr;

const TAB: &str = "    ";

/// Whether styling escapes are written. Resolved once per run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Always,
    Never,
}

impl ColorMode {
    pub fn resolve(force_colors: bool, stdout_is_terminal: bool) -> Self {
        if force_colors || stdout_is_terminal {
            Self::Always
        } else {
            Self::Never
        }
    }
}

#[derive(Clone, Debug)]
pub struct StyledSegment {
    pub text: String,
    pub style: ContentStyle,
}

#[derive(Clone, Debug, Default)]
pub struct RenderedLine {
    pub segments: Vec<StyledSegment>,
    pub plain: String,
}

impl RenderedLine {
    pub fn styled(text: &str, style: ContentStyle) -> Self {
        let mut line = Self::default();
        line.push(text, style);
        line
    }

    pub fn push(&mut self, text: &str, style: ContentStyle) {
        let text = sanitize(text);
        if text.is_empty() {
            return;
        }
        self.plain.push_str(&text);
        self.segments.push(StyledSegment {
            text: text.into_owned(),
            style,
        });
    }

    pub fn append(&mut self, other: Self) {
        self.plain.push_str(&other.plain);
        self.segments.extend(other.segments);
    }

    pub fn is_empty(&self) -> bool {
        self.plain.is_empty()
    }

    /// Display width in terminal columns.
    pub fn width(&self) -> usize {
        display_width(&self.plain)
    }

    pub fn write_to(&self, out: &mut String, color: ColorMode) {
        match color {
            ColorMode::Never => out.push_str(&self.plain),
            ColorMode::Always => {
                for segment in &self.segments {
                    out.push_str(&segment.style.apply(segment.text.as_str()).to_string());
                }
            }
        }
    }
}

/// Terminal columns taken by `text`; CJK and emoji count double.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

pub fn fg(color: Color) -> ContentStyle {
    ContentStyle {
        foreground_color: Some(color),
        ..ContentStyle::default()
    }
}

pub fn with_attr(mut style: ContentStyle, attribute: Attribute) -> ContentStyle {
    style.attributes.set(attribute);
    style
}

/// One unstyled-or-uniformly-styled line per source line.
pub fn plain_lines(text: &str, style: ContentStyle) -> Vec<RenderedLine> {
    text.lines()
        .map(|line| RenderedLine::styled(line, style))
        .collect()
}

fn sanitize(text: &str) -> Cow<'_, str> {
    if !text.chars().any(char::is_control) {
        return Cow::Borrowed(text);
    }
    let mut clean = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\t' => clean.push_str(TAB),
            ch if ch.is_control() => {}
            ch => clean.push(ch),
        }
    }
    Cow::Owned(clean)
}

fn ansi_escape() -> &'static Regex {
    static ANSI: OnceLock<Regex> = OnceLock::new();
    ANSI.get_or_init(|| {
        // CSI, OSC, charset designation, then any other two-byte escape.
        Regex::new(concat!(
            r"\x1b\[[0-?]*[ -/]*[@-~]",
            r"|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)",
            r"|\x1b[()][0-9A-Za-z]",
            r"|\x1b[0-?@-Z\\-_]",
        ))
        .expect("ANSI escape pattern is valid")
    })
}

/// Prepares kernel output for a box: strips terminal escapes and keeps only
/// what a terminal would finally show on carriage-return rewritten lines.
pub fn clean_terminal_text(text: &str) -> String {
    let stripped = ansi_escape().replace_all(text, "");
    stripped
        .split('\n')
        .map(|line| {
            let line = line.strip_suffix('\r').unwrap_or(line);
            line.rsplit('\r').next().unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
