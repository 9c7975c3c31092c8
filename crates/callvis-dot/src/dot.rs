//! Low-level DOT text emission.

use std::fmt::Write;

const INDENT: &str = "    ";

const KEYWORDS: &[&str] = &["node", "edge", "graph", "digraph", "subgraph", "strict"];

/// Escape special characters for quoted DOT strings.
pub fn escape_label(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

/// Write indentation to output.
pub fn write_indent(output: &mut String, level: usize) {
    for _ in 0..level {
        output.push_str(INDENT);
    }
}

/// `name` as a DOT ID: bare when it is a plain identifier, quoted and
/// escaped otherwise.
pub fn graph_id(name: &str) -> String {
    let mut chars = name.chars();
    let plain = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !KEYWORDS.iter().any(|kw| kw.eq_ignore_ascii_case(name));
    if plain {
        name.to_string()
    } else {
        format!("\"{}\"", escape_label(name))
    }
}

fn write_attr_list<'a>(output: &mut String, attrs: impl IntoIterator<Item = (&'a str, &'a str)>) {
    for (key, value) in attrs {
        let _ = write!(output, "{}=\"{}\" ", key, escape_label(value));
    }
}

/// Builder for nested-cluster DOT output.
///
/// Every line is written at the current nesting depth; clusters bump the
/// depth until their matching [`DotWriter::end_cluster`].
pub struct DotWriter {
    output: String,
    indent: usize,
}

impl DotWriter {
    /// Start a digraph named `name`.
    pub fn new(name: &str) -> Self {
        Self::with_capacity(name, 4096)
    }

    pub fn with_capacity(name: &str, capacity: usize) -> Self {
        let mut output = String::with_capacity(capacity);
        let _ = writeln!(output, "digraph {} {{", graph_id(name));
        Self { output, indent: 1 }
    }

    /// `key="value";` at the current level.
    pub fn attr(&mut self, key: &str, value: &str) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "{}=\"{}\";", key, escape_label(value));
        self
    }

    /// Default node attributes, in the order given.
    pub fn node_defaults(&mut self, attrs: &[(&str, &str)]) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        self.output.push_str("node [");
        for (i, (key, value)) in attrs.iter().enumerate() {
            if i > 0 {
                self.output.push(' ');
            }
            let _ = write!(self.output, "{}=\"{}\"", key, escape_label(value));
        }
        self.output.push_str("];\n");
        self
    }

    /// Default edge attributes.
    pub fn edge_defaults(&mut self, minlen: u32) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "edge [minlen=\"{minlen}\"]");
        self
    }

    pub fn blank(&mut self) -> &mut Self {
        self.output.push('\n');
        self
    }

    /// Open `subgraph "<id>" {`.
    pub fn start_cluster(&mut self, id: &str) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = writeln!(self.output, "subgraph \"{}\" {{", escape_label(id));
        self.indent += 1;
        self
    }

    pub fn end_cluster(&mut self) -> &mut Self {
        self.indent = self.indent.saturating_sub(1);
        write_indent(&mut self.output, self.indent);
        self.output.push_str("}\n");
        self
    }

    /// `"<id>" [ k="v" ... ]`
    pub fn node<'a>(
        &mut self,
        id: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = write!(self.output, "\"{}\" [ ", escape_label(id));
        write_attr_list(&mut self.output, attrs);
        self.output.push_str("]\n");
        self
    }

    /// `"<from>" -> "<to>" [ k="v" ... ]`
    pub fn edge<'a>(
        &mut self,
        from: &str,
        to: &str,
        attrs: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> &mut Self {
        write_indent(&mut self.output, self.indent);
        let _ = write!(
            self.output,
            "\"{}\" -> \"{}\" [ ",
            escape_label(from),
            escape_label(to)
        );
        write_attr_list(&mut self.output, attrs);
        self.output.push_str("]\n");
        self
    }

    /// Close the digraph and return the text.
    pub fn build(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }

    pub fn indent(&self) -> usize {
        self.indent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_escape_label() {
        assert_eq!(escape_label("a\"b"), "a\\\"b");
        assert_eq!(escape_label("pkg\nName"), "pkg\\nName");
        assert_eq!(escape_label("c:\\x"), "c:\\\\x");
    }

    #[test]
    fn test_graph_id() {
        assert_eq!(graph_id("callgraph"), "callgraph");
        assert_eq!(graph_id("_calls2"), "_calls2");
        assert_eq!(graph_id("my graph"), "\"my graph\"");
        assert_eq!(graph_id("app-v2"), "\"app-v2\"");
        assert_eq!(graph_id("2nd"), "\"2nd\"");
        assert_eq!(graph_id("a\"b"), "\"a\\\"b\"");
        assert_eq!(graph_id(""), "\"\"");
        assert_eq!(graph_id("Graph"), "\"Graph\"");
    }

    #[test]
    fn test_writer_layout() {
        let mut w = DotWriter::new("g");
        w.attr("label", "t")
            .blank()
            .node_defaults(&[("shape", "box"), ("margin", "0.05,0.0")])
            .edge_defaults(2)
            .start_cluster("cluster_x")
            .attr("label", "x")
            .node("x.A", [("label", "A"), ("tooltip", "a\nb")]);
        assert_eq!(w.indent(), 2);
        w.end_cluster().edge("x.A", "x.A", []);
        assert_eq!(w.indent(), 1);

        let expected = concat!(
            "digraph g {\n",
            "    label=\"t\";\n",
            "\n",
            "    node [shape=\"box\" margin=\"0.05,0.0\"];\n",
            "    edge [minlen=\"2\"]\n",
            "    subgraph \"cluster_x\" {\n",
            "        label=\"x\";\n",
            "        \"x.A\" [ label=\"A\" tooltip=\"a\\nb\" ]\n",
            "    }\n",
            "    \"x.A\" -> \"x.A\" [ ]\n",
            "}\n",
        );
        assert_eq!(w.build(), expected);
    }
}
