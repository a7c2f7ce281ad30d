//! Splitmark - annotated markdown rendering from the command line.
//!
//! # Usage
//!
//! ```bash
//! splitmark README.md
//! splitmark --out readme.html README.md
//! splitmark --blocks README.md
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use splitmark::render::MdRenderer;

/// Render markdown to block-annotated HTML
#[derive(Parser, Debug)]
#[command(name = "splitmark", version, about, long_about = None)]
struct Cli {
    /// Markdown file to render
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Write the annotated HTML here instead of stdout
    #[arg(short, long, value_name = "PATH")]
    out: Option<PathBuf>,

    /// Print the block table (index and source line range) to stderr
    #[arg(long)]
    blocks: bool,

    /// Disable the built-in fenced-code handlers (TABLE, csv)
    #[arg(long)]
    no_handlers: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    if !cli.file.exists() {
        anyhow::bail!("File not found: {}", cli.file.display());
    }
    let markdown = fs::read_to_string(&cli.file)
        .with_context(|| format!("reading {}", cli.file.display()))?;

    let renderer = if cli.no_handlers {
        MdRenderer::new()
    } else {
        MdRenderer::with_default_handlers()
    };
    let rendered = renderer.render(&markdown);

    if cli.blocks {
        let mut index = splitmark::blocks::BlockIndex::new();
        index.rebuild(rendered.markers.iter().map(String::as_str));
        for block in &index {
            eprintln!(
                "block {:>3}  lines {:>4}..{:<4}",
                block.index, block.start_line, block.end_line
            );
        }
    }

    match cli.out {
        Some(path) => fs::write(&path, rendered.html)
            .with_context(|| format!("writing {}", path.display()))?,
        None => print!("{}", rendered.html),
    }
    Ok(())
}
