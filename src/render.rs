//! Rendering of tokens and quadruples for inspection:
//! HTML tables (via maud) and a control-flow graph (via Graphviz).

use std::io::Write;
use std::process::Stdio;

use dot_writer::{Attributes, DotWriter, Shape};
use maud::{html, Markup, PreEscaped};

use crate::reader::Token;
use crate::translate::{Op, Target, Translation};

pub fn render_tokens(tokens: &[Token]) -> Markup {
    html!(
        table class="tokens" {
            tr { th { "value" } th { "class" } th { "line" } th { "column" } }
            @for token in tokens {
                tr {
                    td { code { (token.value) } }
                    td { (format!("{:?}", token.class)) }
                    td { (token.line) }
                    td { (token.column) }
                }
            }
        }
    )
}

pub fn render_quads(translation: &Translation) -> Markup {
    html!(
        table class="quads" {
            tr { th { "#" } th { "op" } th { "arg1" } th { "arg2" } th { "res" } }
            @for (index, quad) in translation.iter() {
                tr class=(if quad.target().is_some() { "jump" } else { "" }) {
                    td { (index) }
                    td { code { (quad.op) } }
                    td { code { (quad.arg1) } }
                    td { code { (quad.arg2) } }
                    td { code { (quad.res) } }
                }
            }
            tr class="exit" { td { (translation.exit()) } td colspan="4" { "(exit)" } }
        }
    )
}

fn node_for_index(index: usize) -> String {
    format!("q{index}")
}

/// Escape the characters that are structural in a Graphviz record label.
fn escape_record(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for ch in s.chars() {
        if matches!(ch, '{' | '}' | '|' | '<' | '>' | '"' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Render the control flow of a translation into a Graphviz graph.
///
/// Every quadruple is a node; the exit address gets a node of its own.
/// Conditional jumps have a "true" edge to their target and a "false" edge to the next quadruple.
pub fn render_flow_graph(translation: &Translation) -> Vec<u8> {
    let mut outbuf = Vec::new();
    {
        let mut writer = DotWriter::from(&mut outbuf);
        let mut graph = writer.digraph();

        for (index, quad) in translation.iter() {
            let mut node = graph.node_named(&node_for_index(index.get()));
            node.set_shape(Shape::Record);
            node.set_label(&format!("{{{index}|{}}}", escape_record(&quad.to_string())));
        }
        {
            let mut exit = graph.node_named(&node_for_index(translation.exit().get()));
            exit.set_shape(Shape::None);
            exit.set_label("exit");
        }

        for (index, quad) in translation.iter() {
            let this = node_for_index(index.get());
            let next = node_for_index(index.get() + 1);
            let target = match quad.target() {
                Some(Target::Resolved(target)) => target,
                Some(Target::Pending(_)) => continue,
                None => {
                    graph.edge(this, next);
                    continue;
                }
            };
            let target = node_for_index(target.get());
            match quad.op {
                Op::JumpIf(_) => {
                    graph
                        .edge(this.clone(), target)
                        .attributes()
                        .set_label("true");
                    graph.edge(this, next).attributes().set_label("false");
                }
                _ => {
                    graph.edge(this, target);
                }
            }
        }
    }
    outbuf
}

/// Run the DOT source through Graphviz, producing SVG.
///
/// If rendering fails, or `QUADC_SAVE_GRAPH` is set, the DOT source is kept in a
/// temporary file and its path is logged.
pub fn render_svg(gv: &[u8]) -> Result<String, String> {
    let mut dotgraph = std::process::Command::new("dot")
        .arg("-Tsvg")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| format!("failed to launch graph render: {e}"))?;
    dotgraph
        .stdin
        .take()
        .ok_or_else(|| "graphviz process has no input".to_owned())?
        .write_all(gv)
        .map_err(|e| format!("failed to provide graphviz input: {e}"))?;
    let dotgraph = dotgraph
        .wait_with_output()
        .map_err(|e| format!("failed to complete dot command: {e}"))?;

    if !dotgraph.status.success() || std::env::var_os("QUADC_SAVE_GRAPH").is_some() {
        save_graph(gv);
    }

    if dotgraph.status.success() {
        Ok(String::from_utf8_lossy(&dotgraph.stdout).to_string())
    } else {
        Err(format!(
            "failed to render flow graph: dot failed: {}",
            &String::from_utf8_lossy(&dotgraph.stderr)
        ))
    }
}

fn save_graph(gv: &[u8]) {
    let saved = tempfile::NamedTempFile::new().and_then(|mut f| {
        f.write_all(gv)?;
        let (_, pathbuf) = f.keep()?;
        Ok(pathbuf)
    });
    match saved {
        Ok(pathbuf) => tracing::info!("DOT source in {}", pathbuf.display()),
        Err(e) => tracing::warn!("could not save DOT source: {e}"),
    }
}

/// The flow graph as inline SVG, or the DOT source if Graphviz is unavailable.
pub fn render_flow(translation: &Translation) -> Markup {
    let gv = render_flow_graph(translation);
    match render_svg(&gv) {
        Ok(svg) => html!(div class="flow" { (PreEscaped(svg)) }),
        Err(e) => html!(
            div class="flow" {
                p class="error" { (e) }
                pre { (String::from_utf8_lossy(&gv)) }
            }
        ),
    }
}
