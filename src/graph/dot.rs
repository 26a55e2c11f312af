use core::fmt;
use std::collections::BTreeSet;

use super::DependencyGraph;
use crate::scope::Scope;

const INDENT: &str = "  ";

fn escape(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}

impl DependencyGraph {
    /// Graphviz rendering of the graph.
    ///
    /// Singletons are boxes, prototypes ovals and lazy singletons diamonds.
    /// Primary components are filled, conditional ones outlined in blue.
    #[must_use]
    pub fn to_dot(&self) -> String {
        let mut out = String::new();
        self.write_dot(&mut out).unwrap_or_default();
        out
    }

    /// # Errors
    /// Returns an error when the writer fails
    pub fn write_dot(&self, out: &mut impl fmt::Write) -> fmt::Result {
        out.write_str("digraph G {\n")?;
        writeln!(out, "{INDENT}rankdir=TB;")?;
        writeln!(out, "{INDENT}node [shape=box, style=rounded, fontname=\"Arial\"];")?;
        writeln!(out, "{INDENT}edge [fontname=\"Arial\"];\n")?;

        let leaves = self.leaf_nodes();
        if !leaves.is_empty() {
            write!(out, "{INDENT}{{ rank=same; ")?;
            for (idx, id) in leaves.into_iter().enumerate() {
                if idx > 0 {
                    out.write_str("; ")?;
                }
                write!(out, "\"{}\"", escape(&self.node(id).identity().to_string()))?;
            }
            out.write_str(" }\n\n")?;
        }

        for node in &self.nodes {
            let declaration = node.declaration();
            write!(
                out,
                "{INDENT}\"{}\" [label=\"{}\"",
                escape(&declaration.identity().to_string()),
                escape(declaration.identity().short_name())
            )?;
            if declaration.is_primary() {
                out.write_str(", style=\"filled\", fillcolor=\"lightyellow\"")?;
            }
            let shape = match declaration.scope() {
                Scope::Singleton => "box",
                Scope::Prototype => "oval",
                Scope::LazySingleton => "diamond",
            };
            write!(out, ", shape=\"{shape}\"")?;
            if !declaration.conditions().is_empty() {
                out.write_str(", color=\"blue\"")?;
            }
            out.write_str("];\n")?;
        }
        out.write_str("\n")?;

        let mut written = BTreeSet::new();
        for edge in &self.edges {
            if !written.insert((edge.from, edge.to)) {
                continue;
            }
            write!(
                out,
                "{INDENT}\"{}\" -> \"{}\" [label=\"{}\"",
                escape(&self.node(edge.from).identity().to_string()),
                escape(&self.node(edge.to).identity().to_string()),
                edge.kind.label()
            )?;
            if !edge.kind.is_eager() {
                out.write_str(", style=\"dashed\"")?;
            }
            out.write_str("];\n")?;
        }

        out.write_str("}\n")
    }
}
