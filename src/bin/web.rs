//! Serve the compiler form.
//!
//! ```ignore
//! RUST_LOG=info web --listen 0.0.0.0:8080 --store ./code.txt
//! ```

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

use quadc::web::{get_server, SubmissionStore};
use quadc::translate::DEFAULT_MAX_DEPTH;
use quadc::TranslateOptions;

#[derive(Parser)]
#[command(name = "web")]
#[command(about = "Web form for translating programs into quadruples", long_about = None)]
struct Config {
    /// Address to listen on
    #[arg(long, env = "QUADC_LISTEN", default_value = "localhost:8080")]
    listen: String,

    /// File to keep the last submitted program in
    #[arg(long, env = "QUADC_STORE", value_name = "PATH")]
    store: Option<PathBuf>,

    /// Reject programs that need more than this many quadruples
    #[arg(long, env = "QUADC_MAX_QUADS", value_name = "N")]
    max_quads: Option<usize>,

    /// Reject programs whose blocks and parentheses nest deeper than this
    #[arg(long, env = "QUADC_MAX_DEPTH", value_name = "N", default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // install global collector configured based on RUST_LOG env var.
    tracing_subscriber::fmt::init();
    let config = Config::parse();

    let store = SubmissionStore::open(config.store.clone())
        .await
        .with_context(|| format!("failed to open submission store {:?}", config.store))?;
    let server = get_server(
        store,
        TranslateOptions {
            max_quads: config.max_quads,
            max_depth: config.max_depth,
        },
    );

    let listener = tokio::net::TcpListener::bind(config.listen.as_str())
        .await
        .with_context(|| format!("failed to listen on {}", config.listen))?;
    tracing::info!("serving on http://{}/compiler", config.listen);
    axum::serve(listener, server).await.context("server failed")
}
