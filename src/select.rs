//! Cell selection: which slice of the notebook gets rendered.

use std::ops::RangeInclusive;

use crate::notebook::Cell;

/// Number of cells shown when no range option is given.
pub const DEFAULT_HEAD: usize = 10;

/// Presentation options collected from the command line.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DisplayOptions {
    pub head: Option<usize>,
    pub tail: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub single_page: bool,
    pub full_display: bool,
    pub force_colors: bool,
    pub exclude_output_cells: bool,
    pub no_cell_border: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionMode {
    Head(usize),
    Tail(usize),
    Range {
        start: Option<usize>,
        end: Option<usize>,
    },
    Full,
}

impl SelectionMode {
    /// Precedence: full display, explicit range, head, tail, default head.
    pub fn resolve(options: &DisplayOptions) -> Self {
        if options.full_display {
            return Self::Full;
        }
        if options.start.is_some() || options.end.is_some() {
            return Self::Range {
                start: options.start,
                end: options.end,
            };
        }
        match (options.head, options.tail) {
            (Some(head), _) => Self::Head(head),
            (None, Some(tail)) => Self::Tail(tail),
            (None, None) => Self::Head(DEFAULT_HEAD),
        }
    }

    /// Inclusive index range for a notebook of `len` cells, `None` when empty.
    pub fn bounds(self, len: usize) -> Option<RangeInclusive<usize>> {
        let last = len.checked_sub(1)?;
        match self {
            Self::Full => Some(0..=last),
            Self::Head(count) => {
                let count = count.min(len);
                (count > 0).then(|| 0..=count - 1)
            }
            Self::Tail(count) => {
                let count = count.min(len);
                (count > 0).then(|| len - count..=last)
            }
            Self::Range { start, end } => {
                let start = start.unwrap_or(0).min(last);
                let end = end.unwrap_or(last).min(last);
                (start <= end).then_some(start..=end)
            }
        }
    }
}

/// Returns the cells to display, in notebook order.
pub fn select(cells: &[Cell], options: &DisplayOptions) -> Vec<Cell> {
    let mode = SelectionMode::resolve(options);
    let Some(range) = mode.bounds(cells.len()) else {
        tracing::debug!(?mode, total = cells.len(), "selection is empty");
        return Vec::new();
    };
    tracing::debug!(?mode, ?range, total = cells.len(), "selected cells");

    cells[range]
        .iter()
        .map(|cell| {
            if options.exclude_output_cells {
                cell.without_outputs()
            } else {
                cell.clone()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notebook::{CellKind, Output, OutputContent, OutputKind};
    use pretty_assertions::assert_eq;

    fn cells(count: usize) -> Vec<Cell> {
        (0..count)
            .map(|index| Cell {
                index,
                kind: if index % 2 == 0 {
                    CellKind::Code
                } else {
                    CellKind::Markdown
                },
                source: format!("cell {index}"),
                execution_count: Some(index as u64),
                outputs: vec![Output {
                    kind: OutputKind::Stream {
                        name: "stdout".to_string(),
                    },
                    content: OutputContent::Text {
                        text: format!("out {index}"),
                        syntax: None,
                    },
                }],
            })
            .collect()
    }

    fn indices(selected: &[Cell]) -> Vec<usize> {
        selected.iter().map(|cell| cell.index).collect()
    }

    #[test]
    fn precedence_is_full_range_head_tail_default() {
        let all = DisplayOptions {
            head: Some(2),
            tail: Some(3),
            start: Some(1),
            end: Some(4),
            full_display: true,
            ..DisplayOptions::default()
        };
        assert_eq!(SelectionMode::resolve(&all), SelectionMode::Full);

        let range = DisplayOptions {
            full_display: false,
            ..all.clone()
        };
        assert_eq!(
            SelectionMode::resolve(&range),
            SelectionMode::Range {
                start: Some(1),
                end: Some(4)
            }
        );

        let head = DisplayOptions {
            start: None,
            end: None,
            ..range
        };
        assert_eq!(SelectionMode::resolve(&head), SelectionMode::Head(2));

        let tail = DisplayOptions { head: None, ..head };
        assert_eq!(SelectionMode::resolve(&tail), SelectionMode::Tail(3));

        assert_eq!(
            SelectionMode::resolve(&DisplayOptions::default()),
            SelectionMode::Head(DEFAULT_HEAD)
        );
    }

    #[test]
    fn only_end_still_selects_a_range() {
        let options = DisplayOptions {
            head: Some(1),
            end: Some(2),
            ..DisplayOptions::default()
        };
        assert_eq!(indices(&select(&cells(5), &options)), vec![0, 1, 2]);
    }

    #[test]
    fn head_returns_prefix_in_order() {
        let doc = cells(7);
        for n in 1..=doc.len() {
            let options = DisplayOptions {
                head: Some(n),
                ..DisplayOptions::default()
            };
            assert_eq!(indices(&select(&doc, &options)), (0..n).collect::<Vec<_>>());
        }
    }

    #[test]
    fn tail_returns_suffix_in_order() {
        let doc = cells(7);
        for n in 1..=doc.len() {
            let options = DisplayOptions {
                tail: Some(n),
                ..DisplayOptions::default()
            };
            assert_eq!(
                indices(&select(&doc, &options)),
                (doc.len() - n..doc.len()).collect::<Vec<_>>()
            );
        }
    }

    #[test]
    fn counts_larger_than_document_are_capped() {
        let doc = cells(3);
        let head = DisplayOptions {
            head: Some(50),
            ..DisplayOptions::default()
        };
        let tail = DisplayOptions {
            tail: Some(50),
            ..DisplayOptions::default()
        };
        assert_eq!(indices(&select(&doc, &head)), vec![0, 1, 2]);
        assert_eq!(indices(&select(&doc, &tail)), vec![0, 1, 2]);
    }

    #[test]
    fn range_is_inclusive() {
        let doc = cells(6);
        for start in 0..doc.len() {
            for end in start..doc.len() {
                let options = DisplayOptions {
                    start: Some(start),
                    end: Some(end),
                    ..DisplayOptions::default()
                };
                let selected = select(&doc, &options);
                assert_eq!(selected.len(), end - start + 1);
                assert_eq!(indices(&selected), (start..=end).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn range_bounds_are_clamped() {
        let doc = cells(3);
        let options = DisplayOptions {
            start: Some(1),
            end: Some(5),
            ..DisplayOptions::default()
        };
        assert_eq!(indices(&select(&doc, &options)), vec![1, 2]);

        let options = DisplayOptions {
            start: Some(10),
            end: Some(15),
            ..DisplayOptions::default()
        };
        assert_eq!(indices(&select(&doc, &options)), vec![2]);
    }

    #[test]
    fn inverted_range_is_empty() {
        let doc = cells(8);
        let options = DisplayOptions {
            start: Some(5),
            end: Some(2),
            ..DisplayOptions::default()
        };
        assert!(select(&doc, &options).is_empty());
    }

    #[test]
    fn zero_counts_select_nothing() {
        assert_eq!(SelectionMode::Head(0).bounds(4), None);
        assert_eq!(SelectionMode::Tail(0).bounds(4), None);
    }

    #[test]
    fn empty_document_selects_nothing() {
        let modes = [
            SelectionMode::Full,
            SelectionMode::Head(3),
            SelectionMode::Tail(3),
            SelectionMode::Range {
                start: Some(0),
                end: Some(2),
            },
        ];
        for mode in modes {
            assert_eq!(mode.bounds(0), None);
        }
        assert!(select(&[], &DisplayOptions::default()).is_empty());
    }

    #[test]
    fn twelve_cells_head_five() {
        let options = DisplayOptions {
            head: Some(5),
            no_cell_border: true,
            ..DisplayOptions::default()
        };
        assert_eq!(indices(&select(&cells(12), &options)), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn full_display_ignores_ranges_and_keeps_everything() {
        let doc = cells(15);
        let options = DisplayOptions {
            head: Some(2),
            full_display: true,
            ..DisplayOptions::default()
        };
        assert_eq!(select(&doc, &options), doc);
    }

    #[test]
    fn exclude_output_cells_clears_outputs_only() {
        let doc = cells(4);
        let options = DisplayOptions {
            full_display: true,
            exclude_output_cells: true,
            ..DisplayOptions::default()
        };
        let selected = select(&doc, &options);

        assert_eq!(selected.len(), doc.len());
        for (picked, original) in selected.iter().zip(&doc) {
            assert!(picked.outputs.is_empty());
            assert_eq!(picked.source, original.source);
            assert_eq!(picked.kind, original.kind);
            assert_eq!(picked.index, original.index);
        }
    }

    #[test]
    fn select_leaves_input_untouched() {
        let doc = cells(6);
        let before = doc.clone();
        let options = DisplayOptions {
            tail: Some(3),
            exclude_output_cells: true,
            ..DisplayOptions::default()
        };
        let _ = select(&doc, &options);
        assert_eq!(doc, before);
    }
}
