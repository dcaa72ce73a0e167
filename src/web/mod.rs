//! Web server for interactive exploration.
//!
//! A single form accepts a program; the page shows the most recent submission
//! along with its tokens, its quadruples (or the first error), and its flow graph.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Result};
use axum::routing::{get, post};
use axum::Form;
use maud::Markup;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::render::{render_flow, render_quads, render_tokens};
use crate::{tokenize, translate_with, TranslateOptions};

const STYLE: &[u8] = include_bytes!("style.css");

/// Name of the form field holding the program text.
const SOURCE_FIELD: &str = "sourceCode";

/// The most recently submitted program.
///
/// Held in memory; if a path is configured, every submission is also written there,
/// and the store starts from the file's contents.
#[derive(Default, Clone)]
pub struct SubmissionStore {
    source: Arc<Mutex<String>>,
    path: Option<PathBuf>,
}

impl SubmissionStore {
    pub async fn open(path: Option<PathBuf>) -> std::io::Result<Self> {
        let source = match &path {
            Some(path) => match tokio::fs::read_to_string(path).await {
                Ok(source) => source,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
                Err(e) => return Err(e),
            },
            None => String::new(),
        };
        Ok(SubmissionStore {
            source: Arc::new(Mutex::new(source)),
            path,
        })
    }

    pub async fn latest(&self) -> String {
        self.source.lock().await.clone()
    }

    pub async fn submit(&self, source: String) -> std::io::Result<()> {
        // Hold the lock across the write, so the file matches memory.
        let mut latest = self.source.lock().await;
        if let Some(path) = &self.path {
            tokio::fs::write(path, &source).await?;
        }
        *latest = source;
        Ok(())
    }
}

#[derive(Clone)]
struct Compiler {
    store: SubmissionStore,
    options: TranslateOptions,
}

impl Compiler {
    async fn view(compiler: State<Compiler>) -> Result<Markup, (StatusCode, String)> {
        let source = compiler.store.latest().await;
        let options = compiler.options;
        // Rendering waits on the dot process; keep it off the async workers.
        tokio::task::spawn_blocking(move || render_page(&source, options))
            .await
            .map_err(|e| {
                tracing::warn!("failed to render page: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("failed to render page: {e}"),
                )
            })
    }

    async fn submit(
        compiler: State<Compiler>,
        Form(form): Form<HashMap<String, String>>,
    ) -> Result<impl IntoResponse, (StatusCode, String)> {
        let source = form.get(SOURCE_FIELD).cloned().unwrap_or_default();
        tracing::info!("new submission: {} bytes", source.len());
        compiler.store.submit(source).await.map_err(|e| {
            tracing::warn!("failed to store submission: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("failed to store submission: {e}"),
            )
        })?;
        Ok(Redirect::to("/compiler"))
    }
}

/// The compiler page, with results for the given source.
/// Each call tokenizes and translates from scratch.
pub fn render_page(source: &str, options: TranslateOptions) -> Markup {
    let results = if source.trim().is_empty() {
        maud::html!(p class="hint" { "Submit a program to see its translation." })
    } else {
        match tokenize(source) {
            Err(e) => maud::html!(
                h3 { "Tokens" }
                p class="error" { (e) }
            ),
            Ok(tokens) => {
                let translated = match translate_with(&tokens, options) {
                    Ok(translation) => maud::html!(
                        (render_quads(&translation))
                        h3 { "Flow" }
                        (render_flow(&translation))
                    ),
                    Err(e) => maud::html!(p class="error" { (e) }),
                };
                maud::html!(
                    div id="results" {
                        div {
                            h3 { "Tokens" }
                            (render_tokens(&tokens))
                        }
                        div {
                            h3 { "Quadruples" }
                            (translated)
                        }
                    }
                )
            }
        }
    };

    maud::html!(
        (maud::DOCTYPE)
        html {
            head {
                title { "quadc" }
                link rel="stylesheet" href="/style.css";
            }
            body {
                main {
                    form method="post" action="/compiler/new" {
                        textarea name=(SOURCE_FIELD) rows="16" cols="60" { (source) }
                        button type="submit" { "Translate" }
                    }
                    (results)
                }
            }
        }
    )
}

pub fn get_server(store: SubmissionStore, options: TranslateOptions) -> axum::Router {
    let compiler = Compiler { store, options };

    axum::Router::new()
        .route("/", get(axum::response::Redirect::temporary("/compiler")))
        .route(
            "/style.css",
            get(|| async { ([(axum::http::header::CONTENT_TYPE, "text/css")], STYLE) }),
        )
        .route("/compiler", get(Compiler::view))
        .route("/compiler/new", post(Compiler::submit))
        .with_state(compiler)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn store_keeps_latest_submission() {
        let store = SubmissionStore::open(None).await.unwrap();
        assert_eq!(store.latest().await, "");
        store.submit("main(){x=1;}".to_owned()).await.unwrap();
        store.submit("main(){y=2;}".to_owned()).await.unwrap();
        assert_eq!(store.latest().await, "main(){y=2;}");
    }

    #[tokio::test]
    async fn store_persists_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("code.txt");

        let store = SubmissionStore::open(Some(path.clone())).await.unwrap();
        assert_eq!(store.latest().await, "");
        store.submit("main(){x=1;}".to_owned()).await.unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "main(){x=1;}");

        // A new store picks up where the last one left off.
        let reopened = SubmissionStore::open(Some(path)).await.unwrap();
        assert_eq!(reopened.latest().await, "main(){x=1;}");
    }

    #[tokio::test]
    async fn store_reports_write_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A directory can't be written as a file.
        let store = SubmissionStore::open(None).await.unwrap();
        let store = SubmissionStore {
            path: Some(dir.path().to_owned()),
            ..store
        };
        assert!(store.submit("main(){x=1;}".to_owned()).await.is_err());
        assert_eq!(store.latest().await, "");
    }

    #[tokio::test]
    async fn submit_redirects_to_view() {
        let compiler = Compiler {
            store: SubmissionStore::default(),
            options: Default::default(),
        };
        let form = HashMap::from([(SOURCE_FIELD.to_owned(), "main(){x=1;}".to_owned())]);
        let response = Compiler::submit(State(compiler.clone()), Form(form))
            .await
            .unwrap()
            .into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/compiler");
        assert_eq!(compiler.store.latest().await, "main(){x=1;}");
    }

    #[tokio::test]
    async fn view_renders_latest_submission() {
        let compiler = Compiler {
            store: SubmissionStore::default(),
            options: Default::default(),
        };
        compiler
            .store
            .submit("main(){x=1+2;}".to_owned())
            .await
            .unwrap();
        let page = Compiler::view(State(compiler)).await.unwrap().into_string();
        assert!(page.contains("Quadruples"), "{page}");
        assert!(page.contains("<code>T1</code>"), "{page}");
    }

    #[test]
    fn empty_page_has_form_only() {
        let page = render_page("", Default::default()).into_string();
        assert!(page.contains(r#"name="sourceCode""#), "{page}");
        assert!(!page.contains("Quadruples"), "{page}");
    }

    #[test]
    fn page_shows_lexical_error() {
        let page = render_page("main(){x=1.2.3;}", Default::default()).into_string();
        assert!(page.contains("malformed number"), "{page}");
        assert!(page.contains("column 13"), "{page}");
    }

    #[test]
    fn page_shows_tokens_and_syntax_error() {
        let page = render_page("main(){x=1}", Default::default()).into_string();
        assert!(page.contains("<td>RBrace</td>"), "{page}");
        assert!(page.contains("syntax error"), "{page}");
    }

    #[test]
    fn page_reports_quad_limit() {
        let options = TranslateOptions {
            max_quads: Some(1),
            ..Default::default()
        };
        let page = render_page("main(){x=1+2;}", options).into_string();
        assert!(page.contains("more than 1 quadruples"), "{page}");
    }
}
