//! Render the control flow of a program as Graphviz.
//!
//! Usage:
//!
//! ```ignore
//! <program.txt quads_to_graphviz | dot -T png >output.png
//! ```

use std::io::{stdout, Read, Write};

use quadc::render::render_flow_graph;

/// Reads a program on input, renders its quadruples as Graphviz.
pub fn main() -> std::io::Result<()> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let translation = quadc::compile(&input, Default::default())?;
    stdout().write_all(&render_flow_graph(&translation))
}
