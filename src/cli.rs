use clap::Parser;

use crate::error::JutError;
use crate::render::DEFAULT_THEME;
use crate::select::DisplayOptions;

#[derive(Debug, Parser)]
#[command(
    name = "jut",
    version,
    about = "Render Jupyter notebooks in the terminal"
)]
pub struct Cli {
    /// Notebook path or http(s) URL. Use '-' to read from stdin.
    pub path: String,

    /// Display the first N cells [default: 10].
    #[arg(short = 'H', long, visible_alias = "he", value_name = "N")]
    pub head: Option<usize>,

    /// Display the last N cells.
    #[arg(short, long, value_name = "N")]
    pub tail: Option<usize>,

    /// First cell index to display (0-based, inclusive).
    #[arg(short, long, value_name = "INDEX")]
    pub start: Option<usize>,

    /// Last cell index to display (0-based, inclusive).
    #[arg(short, long, value_name = "INDEX")]
    pub end: Option<usize>,

    /// Print everything to stdout instead of going through a pager.
    #[arg(short = 'p', long)]
    pub single_page: bool,

    /// Display every cell, ignoring the range options.
    #[arg(short, long)]
    pub full_display: bool,

    /// Emit colors even when stdout is not a terminal.
    #[arg(long)]
    pub force_colors: bool,

    /// Hide cell outputs.
    #[arg(long)]
    pub exclude_output_cells: bool,

    /// Do not draw a border around cells.
    #[arg(long)]
    pub no_cell_border: bool,

    /// Syntax highlighting theme.
    #[arg(long, env = "JUT_THEME", default_value = DEFAULT_THEME)]
    pub theme: String,

    /// Pager command used when not in single-page mode [default: $PAGER, then less].
    #[arg(long, env = "JUT_PAGER")]
    pub pager: Option<String>,

    /// Log debug information to stderr.
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Validated display options.
    pub fn display_options(&self) -> Result<DisplayOptions, JutError> {
        if self.head == Some(0) {
            return Err(JutError::InvalidSelection(
                "--head must be at least 1".to_string(),
            ));
        }
        if self.tail == Some(0) {
            return Err(JutError::InvalidSelection(
                "--tail must be at least 1".to_string(),
            ));
        }
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(JutError::InvalidSelection(format!(
                    "--start ({start}) must not be greater than --end ({end})"
                )));
            }
        }

        Ok(DisplayOptions {
            head: self.head,
            tail: self.tail,
            start: self.start,
            end: self.end,
            single_page: self.single_page,
            full_display: self.full_display,
            force_colors: self.force_colors,
            exclude_output_cells: self.exclude_output_cells,
            no_cell_border: self.no_cell_border,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("jut").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn short_and_long_flags_map_to_options() {
        let cli = parse(&[
            "nb.ipynb",
            "-H",
            "3",
            "-t",
            "2",
            "-s",
            "1",
            "-e",
            "4",
            "-p",
            "-f",
            "--force-colors",
            "--exclude-output-cells",
            "--no-cell-border",
        ]);
        assert_eq!(
            cli.display_options().unwrap(),
            DisplayOptions {
                head: Some(3),
                tail: Some(2),
                start: Some(1),
                end: Some(4),
                single_page: true,
                full_display: true,
                force_colors: true,
                exclude_output_cells: true,
                no_cell_border: true,
            }
        );
    }

    #[test]
    fn he_is_an_alias_for_head() {
        assert_eq!(parse(&["nb.ipynb", "--he", "7"]).head, Some(7));
    }

    #[test]
    fn negative_counts_are_rejected_by_the_parser() {
        assert!(Cli::try_parse_from(["jut", "nb.ipynb", "--tail", "-1"]).is_err());
    }

    #[test]
    fn zero_counts_are_invalid_selections() {
        for flag in ["--head", "--tail"] {
            let err = parse(&["nb.ipynb", flag, "0"])
                .display_options()
                .unwrap_err();
            assert!(matches!(err, JutError::InvalidSelection(_)), "{flag}");
        }
    }

    #[test]
    fn inverted_range_is_an_invalid_selection() {
        let err = parse(&["nb.ipynb", "--start", "10", "--end", "3"])
            .display_options()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid selection: --start (10) must not be greater than --end (3)"
        );
    }

    #[test]
    fn path_is_required() {
        assert!(Cli::try_parse_from(["jut", "--head", "5"]).is_err());
    }
}
