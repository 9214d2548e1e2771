mod cli;
mod error;
mod notebook;
mod pager;
mod render;
mod select;
mod source;

use std::io::{self, IsTerminal};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;

use cli::Cli;
use pager::{Pager, StdoutPager, SystemPager};
use render::{CellRenderer, ColorMode, Highlighter};
use source::ContentSource;

fn init_logging(verbose: bool) {
    if verbose {
        tracing_subscriber::fmt()
            .with_env_filter("jut=debug")
            .with_writer(io::stderr)
            .init();
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = cli.display_options()?;

    let source = ContentSource::from_arg(&cli.path);
    let raw = source.load()?;
    let notebook =
        notebook::decode(&raw).with_context(|| format!("Failed to load {source}"))?;
    tracing::debug!(
        cells = notebook.cells.len(),
        language = %notebook.language,
        "decoded notebook"
    );

    let cells = select::select(&notebook.cells, &options);

    let color = ColorMode::resolve(options.force_colors, io::stdout().is_terminal());
    let highlighter = Highlighter::new(&cli.theme);
    let text = CellRenderer::new(&highlighter, &notebook.language, &options, color).render(&cells);

    let pager: Box<dyn Pager> = if options.single_page {
        Box::new(StdoutPager)
    } else {
        Box::new(SystemPager::new(cli.pager))
    };
    pager.display(&text)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("jut: {err:#}");
            ExitCode::FAILURE
        }
    }
}
