use crossterm::style::{Attribute, Color, ContentStyle};
use pulldown_cmark::{
    Alignment, CodeBlockKind, Event as MdEvent, HeadingLevel, Options, Parser as MdParser, Tag,
    TagEnd,
};

use super::highlight::Highlighter;
use super::text::{display_width, fg, with_attr, RenderedLine};

const RULE: &str = "────────────────────────────────────────";
const MIN_COLUMN_WIDTH: usize = 3;

/// Inline context that contributes to the style of running text.
#[derive(Clone, Copy)]
enum Inline {
    Heading(HeadingLevel),
    Emphasis,
    Strong,
    Link,
}

fn inline_style(stack: &[Inline]) -> ContentStyle {
    stack.iter().fold(ContentStyle::default(), |mut style, inline| {
        match inline {
            Inline::Heading(level) => {
                style.foreground_color = Some(match level {
                    HeadingLevel::H1 => Color::Yellow,
                    HeadingLevel::H2 => Color::Magenta,
                    _ => Color::Cyan,
                });
                style.attributes.set(Attribute::Bold);
            }
            Inline::Emphasis => style.attributes.set(Attribute::Italic),
            Inline::Strong => style.attributes.set(Attribute::Bold),
            Inline::Link => {
                style.foreground_color = Some(Color::Cyan);
                style.attributes.set(Attribute::Underlined);
            }
        }
        style
    })
}

struct CodeBlock {
    lang: String,
    body: String,
}

struct Image {
    target: String,
    alt: String,
}

struct Link {
    target: String,
    text: String,
}

/// Cells collected until the table ends; the header is `rows[0]`.
struct Table {
    alignments: Vec<Alignment>,
    rows: Vec<Vec<String>>,
    row: Vec<String>,
    cell: Option<String>,
}

impl Table {
    fn new(alignments: Vec<Alignment>) -> Self {
        Self {
            alignments,
            rows: Vec::new(),
            row: Vec::new(),
            cell: None,
        }
    }

    fn end_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.row.push(cell.trim().to_string());
        }
    }

    fn end_row(&mut self) {
        self.rows.push(std::mem::take(&mut self.row));
    }

    /// Header, alignment rule, then body rows, padded to shared column widths.
    fn layout(&self) -> Vec<String> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        if columns == 0 {
            return Vec::new();
        }
        fn cell(row: &[String], column: usize) -> &str {
            row.get(column).map_or("", String::as_str)
        }
        let widths: Vec<usize> = (0..columns)
            .map(|column| {
                self.rows
                    .iter()
                    .map(|row| display_width(cell(row, column)))
                    .fold(MIN_COLUMN_WIDTH, usize::max)
            })
            .collect();

        let rule: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(column, &width)| match self.alignments.get(column) {
                Some(Alignment::Left) => format!(":{}", "-".repeat(width - 1)),
                Some(Alignment::Center) => format!(":{}:", "-".repeat(width - 2)),
                Some(Alignment::Right) => format!("{}:", "-".repeat(width - 1)),
                _ => "-".repeat(width),
            })
            .collect();

        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        for (position, row) in self.rows.iter().enumerate() {
            let cells = (0..columns).map(|column| cell(row, column));
            lines.push(padded_row(cells, &widths));
            if position == 0 {
                lines.push(padded_row(rule.iter().map(String::as_str), &widths));
            }
        }
        lines
    }
}

fn padded_row<'s>(cells: impl Iterator<Item = &'s str>, widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .zip(widths)
        .map(|(text, &width)| {
            let fill = width.saturating_sub(display_width(text));
            format!("{text}{}", " ".repeat(fill))
        })
        .collect();
    format!("| {} |", padded.join(" | "))
}

/// Accumulates terminal lines while walking the markdown event stream.
struct MarkdownWriter<'a> {
    highlighter: &'a Highlighter,
    lines: Vec<RenderedLine>,
    current: RenderedLine,

    inline: Vec<Inline>,
    quote_depth: usize,
    // `Some(next)` for ordered lists, `None` for bullets.
    lists: Vec<Option<u64>>,

    link: Option<Link>,
    image: Option<Image>,
    code: Option<CodeBlock>,
    table: Option<Table>,
}

impl<'a> MarkdownWriter<'a> {
    fn new(highlighter: &'a Highlighter) -> Self {
        Self {
            highlighter,
            lines: Vec::new(),
            current: RenderedLine::default(),
            inline: Vec::new(),
            quote_depth: 0,
            lists: Vec::new(),
            link: None,
            image: None,
            code: None,
            table: None,
        }
    }

    fn event(&mut self, event: MdEvent<'_>) {
        match event {
            MdEvent::Start(tag) => self.start(tag),
            MdEvent::End(tag) => self.end(tag),
            MdEvent::Text(text) | MdEvent::Html(text) | MdEvent::InlineHtml(text) => {
                self.text(&text)
            }
            MdEvent::Code(code) => {
                self.inline_text(&code, with_attr(fg(Color::Yellow), Attribute::Bold))
            }
            MdEvent::InlineMath(math) => {
                self.inline_text(&format!("${math}$"), fg(Color::DarkYellow))
            }
            MdEvent::DisplayMath(math) => {
                self.inline_text(&format!("$${math}$$"), fg(Color::DarkYellow))
            }
            MdEvent::SoftBreak => self.inline_text(" ", inline_style(&self.inline)),
            MdEvent::HardBreak => {
                if !self.capture(" ") {
                    self.end_line();
                }
            }
            MdEvent::Rule => {
                self.end_line();
                self.write(RULE, fg(Color::DarkGrey));
                self.blank();
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Heading { level, .. } => {
                self.end_line();
                self.inline.push(Inline::Heading(level));
            }
            Tag::BlockQuote(_) => {
                self.end_line();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.end_line();
                let lang = match kind {
                    CodeBlockKind::Fenced(name) => name.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code = Some(CodeBlock {
                    lang,
                    body: String::new(),
                });
            }
            Tag::List(first) => self.lists.push(first),
            Tag::Item => {
                self.end_line();
                let indent = "  ".repeat(self.lists.len().saturating_sub(1));
                let marker = match self.lists.last_mut() {
                    Some(Some(next)) => {
                        let marker = format!("{next}. ");
                        *next += 1;
                        marker
                    }
                    _ => "- ".to_string(),
                };
                self.write(&format!("{indent}{marker}"), fg(Color::DarkGrey));
            }
            Tag::Emphasis => self.inline.push(Inline::Emphasis),
            Tag::Strong => self.inline.push(Inline::Strong),
            Tag::Link { dest_url, .. } => {
                self.inline.push(Inline::Link);
                self.link = Some(Link {
                    target: dest_url.to_string(),
                    text: String::new(),
                });
            }
            Tag::Image { dest_url, .. } => {
                self.image = Some(Image {
                    target: dest_url.to_string(),
                    alt: String::new(),
                });
            }
            Tag::Table(alignments) => {
                self.end_line();
                self.table = Some(Table::new(alignments));
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.blank(),
            TagEnd::Heading(_) => {
                self.inline.pop();
                self.blank();
            }
            TagEnd::BlockQuote => {
                self.end_line();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                if let Some(code) = self.code.take() {
                    for highlighted in self.highlighter.highlight(&code.body, &code.lang) {
                        let mut line = RenderedLine::styled("  ", fg(Color::DarkGrey));
                        line.append(highlighted);
                        self.lines.push(line);
                    }
                }
                self.blank();
            }
            TagEnd::List(_) => {
                self.lists.pop();
                self.blank();
            }
            TagEnd::Item => self.end_line(),
            TagEnd::Emphasis | TagEnd::Strong => {
                self.inline.pop();
            }
            TagEnd::Link => {
                self.inline.pop();
                if let Some(link) = self.link.take() {
                    if !link.target.is_empty() && link.text.trim() != link.target {
                        self.inline_text(&format!(" <{}>", link.target), fg(Color::DarkGrey));
                    }
                }
            }
            TagEnd::Image => {
                if let Some(image) = self.image.take() {
                    let alt = match image.alt.trim() {
                        "" => "image",
                        alt => alt,
                    };
                    let placeholder = format!("[image: {alt}] ({})", image.target);
                    self.inline_text(&placeholder, fg(Color::Blue));
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.end_cell();
                }
            }
            // The header cells arrive without a row wrapper.
            TagEnd::TableHead | TagEnd::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.end_row();
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    for (position, text) in table.layout().iter().enumerate() {
                        let style = match position {
                            0 => fg(Color::Yellow),
                            1 => fg(Color::DarkGrey),
                            _ => ContentStyle::default(),
                        };
                        self.write(text, style);
                        self.end_line();
                    }
                }
                self.blank();
            }
            _ => {}
        }
    }

    /// Routes text into whatever construct is still open: a code block,
    /// image alt text or a table cell. Returns `false` when none is.
    fn capture(&mut self, text: &str) -> bool {
        if let Some(code) = self.code.as_mut() {
            code.body.push_str(text);
        } else if let Some(image) = self.image.as_mut() {
            image.alt.push_str(text);
        } else if let Some(cell) = self.table.as_mut().and_then(|table| table.cell.as_mut()) {
            cell.push_str(text);
        } else {
            return false;
        }
        true
    }

    fn text(&mut self, text: &str) {
        if self.capture(text) {
            return;
        }
        let style = inline_style(&self.inline);
        // Raw HTML blocks keep their own line structure.
        for (idx, part) in text.split('\n').enumerate() {
            if idx > 0 {
                self.end_line();
            }
            self.write(part, style);
        }
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(text);
        }
    }

    fn inline_text(&mut self, text: &str, style: ContentStyle) {
        if self.capture(text) {
            return;
        }
        self.write(text, style);
        if let Some(link) = self.link.as_mut() {
            link.text.push_str(text);
        }
    }

    fn write(&mut self, text: &str, style: ContentStyle) {
        if text.is_empty() {
            return;
        }
        if self.current.is_empty() && self.quote_depth > 0 {
            self.current
                .push(&"> ".repeat(self.quote_depth), fg(Color::DarkGrey));
        }
        self.current.push(text, style);
    }

    fn end_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(std::mem::take(&mut self.current));
        }
    }

    /// Ends the current line and leaves one empty line after it.
    fn blank(&mut self) {
        self.end_line();
        if self.lines.last().is_some_and(|line| !line.is_empty()) {
            self.lines.push(RenderedLine::default());
        }
    }

    fn finish(mut self) -> Vec<RenderedLine> {
        self.end_line();
        while self.lines.last().is_some_and(RenderedLine::is_empty) {
            self.lines.pop();
        }
        self.lines
    }
}

/// Renders a markdown cell source into terminal lines.
pub fn render_markdown(source: &str, highlighter: &Highlighter) -> Vec<RenderedLine> {
    let mut writer = MarkdownWriter::new(highlighter);
    for event in MdParser::new_ext(source, Options::ENABLE_TABLES | Options::ENABLE_MATH) {
        writer.event(event);
    }
    writer.finish()
}
