//! Command-line front end: tokenize or translate a source file.
//!
//! ```ignore
//! quadc lex program.txt
//! quadc translate --max-quads 20 program.txt
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use quadc::translate::DEFAULT_MAX_DEPTH;
use quadc::{tokenize, translate_with, TranslateOptions};

#[derive(Parser)]
#[command(name = "quadc")]
#[command(about = "Translate a small procedural language into quadruples", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Tokenize the input file and print tokens
    Lex {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Translate the input file and print the quadruples
    Translate {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Fail if the program needs more than this many quadruples
        #[arg(long, value_name = "N")]
        max_quads: Option<usize>,

        /// Fail if blocks and parentheses nest deeper than this
        #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
        max_depth: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Lex { file } => lex_file(&file),
        Commands::Translate {
            file,
            max_quads,
            max_depth,
        } => translate_file(
            &file,
            TranslateOptions {
                max_quads,
                max_depth,
            },
        ),
    }
}

fn read_source(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file '{}'", path.display()))
}

fn lex_file(path: &Path) -> Result<()> {
    let source = read_source(path)?;
    let tokens =
        tokenize(&source).with_context(|| format!("failed to tokenize '{}'", path.display()))?;

    for token in &tokens {
        println!(
            "{}:{}:{} {:?} {}",
            path.display(),
            token.line,
            token.column,
            token.class,
            token.value
        );
    }
    Ok(())
}

fn translate_file(path: &Path, options: TranslateOptions) -> Result<()> {
    let source = read_source(path)?;
    let tokens =
        tokenize(&source).with_context(|| format!("failed to tokenize '{}'", path.display()))?;
    let translation = translate_with(&tokens, options)
        .with_context(|| format!("failed to translate '{}'", path.display()))?;

    for (index, quad) in translation.iter() {
        println!("{index:>4}: {quad}");
    }
    println!("{:>4}: (exit)", translation.exit());
    Ok(())
}
