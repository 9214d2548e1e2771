//! Cell rendering: turns selected cells into bordered, highlighted text.
//!
//! Each cell becomes a block made of a header, the rendered source and one
//! section per output. Blocks are laid out with or without a box frame and
//! only then written out, so colour handling stays in one place
//! ([`RenderedLine::write_to`]).

mod highlight;
mod markdown;
mod text;

use crossterm::style::{Attribute, Color, ContentStyle};

use crate::notebook::{Cell, CellKind, Output, OutputContent, OutputKind};
use crate::select::DisplayOptions;

pub use highlight::{Highlighter, DEFAULT_THEME};
pub use text::ColorMode;

use markdown::render_markdown;
use text::{clean_terminal_text, display_width, fg, plain_lines, with_attr, RenderedLine};

struct Section {
    /// Divider label; the source section has none.
    label: Option<(String, ContentStyle)>,
    lines: Vec<RenderedLine>,
}

struct CellBlock {
    title: String,
    title_style: ContentStyle,
    sections: Vec<Section>,
}

pub struct CellRenderer<'a> {
    highlighter: &'a Highlighter,
    language: &'a str,
    color: ColorMode,
    bordered: bool,
}

impl<'a> CellRenderer<'a> {
    pub fn new(
        highlighter: &'a Highlighter,
        language: &'a str,
        options: &DisplayOptions,
        color: ColorMode,
    ) -> Self {
        Self {
            highlighter,
            language,
            color,
            bordered: !options.no_cell_border,
        }
    }

    /// Renders every cell into one text blob, blocks separated by a blank line.
    pub fn render(&self, cells: &[Cell]) -> String {
        let mut out = String::new();
        for (position, cell) in cells.iter().enumerate() {
            if position > 0 {
                out.push('\n');
            }
            let block = self.build_block(cell);
            let lines = if self.bordered {
                framed(&block)
            } else {
                unframed(&block)
            };
            for line in &lines {
                line.write_to(&mut out, self.color);
                out.push('\n');
            }
        }
        out
    }

    fn build_block(&self, cell: &Cell) -> CellBlock {
        let (title, title_style) = header(cell);

        let mut source = match cell.kind {
            CellKind::Code => self.highlighter.highlight(&cell.source, self.language),
            CellKind::Markdown => render_markdown(&cell.source, self.highlighter),
            CellKind::Raw => plain_lines(&cell.source, ContentStyle::default()),
        };
        if source.is_empty() {
            source.push(RenderedLine::default());
        }

        let mut sections = vec![Section {
            label: None,
            lines: source,
        }];
        sections.extend(cell.outputs.iter().map(|output| self.output_section(output)));

        CellBlock {
            title,
            title_style,
            sections,
        }
    }

    fn output_section(&self, output: &Output) -> Section {
        let error_style = fg(Color::Red);
        let label = match &output.kind {
            OutputKind::Stream { name } if name == "stderr" => (name.clone(), error_style),
            OutputKind::Stream { name } => (name.clone(), fg(Color::DarkGrey)),
            OutputKind::ExecuteResult {
                execution_count: Some(count),
            } => (format!("Out [{count}]"), error_style),
            OutputKind::ExecuteResult {
                execution_count: None,
            } => ("result".to_string(), error_style),
            OutputKind::DisplayData => ("display".to_string(), fg(Color::DarkGrey)),
            OutputKind::Error { ename, .. } => (format!("error: {ename}"), error_style),
            OutputKind::Unknown(kind) => (kind.clone(), fg(Color::DarkGrey)),
        };

        let placeholder = |text: String| vec![RenderedLine::styled(&text, fg(Color::Blue))];
        let mut lines = match (&output.kind, &output.content) {
            (OutputKind::Unknown(kind), _) => {
                placeholder(format!("[unsupported output: {kind}]"))
            }
            (OutputKind::Error { .. }, OutputContent::Text { text, .. }) => {
                plain_lines(&clean_terminal_text(text), error_style)
            }
            (OutputKind::Error { ename, evalue }, OutputContent::Empty) => {
                vec![RenderedLine::styled(&format!("{ename}: {evalue}"), error_style)]
            }
            (_, OutputContent::Text { text, syntax: None }) => {
                plain_lines(&clean_terminal_text(text), ContentStyle::default())
            }
            (_, OutputContent::Text {
                text,
                syntax: Some(token),
            }) => self.highlighter.highlight(&clean_terminal_text(text), token),
            (_, OutputContent::Image { mime }) => placeholder(format!("[image output: {mime}]")),
            (_, OutputContent::Unsupported { mime }) => {
                placeholder(format!("[not rendering {mime}]"))
            }
            (_, OutputContent::Empty) => Vec::new(),
        };
        if lines.is_empty() {
            lines.push(RenderedLine::default());
        }

        Section {
            label: Some(label),
            lines,
        }
    }
}

fn header(cell: &Cell) -> (String, ContentStyle) {
    let title = match cell.execution_count {
        Some(count) if cell.kind == CellKind::Code => {
            format!("[{}] {} In [{count}]", cell.index, cell.kind)
        }
        _ => format!("[{}] {}", cell.index, cell.kind),
    };
    let color = match cell.kind {
        CellKind::Code => Color::Green,
        CellKind::Markdown => Color::Cyan,
        CellKind::Raw => Color::Grey,
    };
    (title, with_attr(fg(color), Attribute::Bold))
}

fn border_style() -> ContentStyle {
    fg(Color::DarkGrey)
}

/// Rounded box around the whole block. Width follows the widest line, never
/// the terminal, so redirected output matches what a terminal shows.
fn framed(block: &CellBlock) -> Vec<RenderedLine> {
    let border = border_style();
    let title = format!(" {} ", block.title);
    let label_width = block
        .sections
        .iter()
        .filter_map(|section| section.label.as_ref())
        .map(|(label, _)| display_width(label) + 2)
        .max()
        .unwrap_or(0);
    let content_width = block
        .sections
        .iter()
        .flat_map(|section| &section.lines)
        .map(RenderedLine::width)
        .max()
        .unwrap_or(0);
    let inner = content_width
        .max(display_width(&title))
        .max(label_width);

    let edge = |left: &str, text: &str, style: ContentStyle, right: &str| {
        let mut line = RenderedLine::styled(left, border);
        line.push("─", border);
        line.push(text, style);
        line.push(&"─".repeat(inner + 1 - display_width(text)), border);
        line.push(right, border);
        line
    };

    let mut lines = vec![edge("╭", &title, block.title_style, "╮")];
    for section in &block.sections {
        if let Some((label, style)) = &section.label {
            lines.push(edge("├", &format!(" {label} "), *style, "┤"));
        }
        for content in &section.lines {
            let mut line = RenderedLine::styled("│ ", border);
            let padding = inner - content.width();
            line.append(content.clone());
            line.push(&" ".repeat(padding), ContentStyle::default());
            line.push(" │", border);
            lines.push(line);
        }
    }
    let mut bottom = RenderedLine::styled("╰", border);
    bottom.push(&"─".repeat(inner + 2), border);
    bottom.push("╯", border);
    lines.push(bottom);
    lines
}

fn unframed(block: &CellBlock) -> Vec<RenderedLine> {
    let mut lines = vec![RenderedLine::styled(&block.title, block.title_style)];
    for section in &block.sections {
        if let Some((label, style)) = &section.label {
            let mut divider = RenderedLine::styled("── ", border_style());
            divider.push(label, *style);
            lines.push(divider);
        }
        lines.extend(section.lines.iter().cloned());
    }
    lines
}
