//! Graphviz DOT output.
//!
//! The output depends only on the diagram: the same diagram always yields the
//! same bytes.

use std::fmt::Write;

use crate::diagram::{Attrs, Cluster, ClusterId, Diagram, Edge, EdgeDir, Node};

const FONT_NAME: &str = "Sans-Serif";
const FONT_COLOR: &str = "#2D3436";

/// Cluster backgrounds, cycled by nesting depth.
const CLUSTER_BG_COLORS: [&str; 4] = ["#E5F5FD", "#EBF3E7", "#ECE8F6", "#FDF7E3"];

fn default_graph_attrs() -> Attrs {
    [
        ("pad", "2.0"),
        ("splines", "ortho"),
        ("nodesep", "0.60"),
        ("ranksep", "0.75"),
        ("fontname", FONT_NAME),
        ("fontsize", "15"),
        ("fontcolor", FONT_COLOR),
    ]
    .into_iter()
    .collect()
}

fn default_node_attrs() -> Attrs {
    [
        ("shape", "box"),
        ("style", "rounded,filled"),
        ("width", "1.4"),
        ("height", "1.0"),
        ("margin", "0.2,0.1"),
        ("penwidth", "0"),
        ("fontname", FONT_NAME),
        ("fontsize", "13"),
        ("fontcolor", FONT_COLOR),
    ]
    .into_iter()
    .collect()
}

fn default_edge_attrs() -> Attrs {
    [("color", "#7B8894"), ("fontname", FONT_NAME), ("fontsize", "12")]
        .into_iter()
        .collect()
}

/// Escape special characters for quoted DOT strings.
pub fn escape(input: &str) -> String {
    input
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace("\r\n", "\\n")
        .replace('\n', "\\n")
}

struct DotWriter {
    output: String,
    indent: usize,
}

impl DotWriter {
    fn new(name: &str) -> Self {
        let mut output = String::with_capacity(2048);
        let _ = writeln!(output, "digraph \"{}\" {{", escape(name));
        Self { output, indent: 1 }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("  ");
        }
    }

    fn write_attr_list(&mut self, attrs: &Attrs) {
        self.output.push('[');
        for (i, (key, value)) in attrs.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            let _ = write!(self.output, "{}=\"{}\"", key, escape(value));
        }
        self.output.push(']');
    }

    /// `graph [...]`, `node [...]` or `edge [...]`.
    fn defaults(&mut self, kind: &str, attrs: &Attrs) {
        if attrs.is_empty() {
            return;
        }
        self.write_indent();
        let _ = write!(self.output, "{kind} ");
        self.write_attr_list(attrs);
        self.output.push_str(";\n");
    }

    fn node(&mut self, id: &str, attrs: &Attrs) {
        self.write_indent();
        let _ = write!(self.output, "{id} ");
        self.write_attr_list(attrs);
        self.output.push_str(";\n");
    }

    fn edge(&mut self, from: &str, to: &str, attrs: &Attrs) {
        self.write_indent();
        let _ = write!(self.output, "{from} -> {to}");
        if !attrs.is_empty() {
            self.output.push(' ');
            self.write_attr_list(attrs);
        }
        self.output.push_str(";\n");
    }

    fn open_subgraph(&mut self, id: &str) {
        self.write_indent();
        let _ = writeln!(self.output, "subgraph {id} {{");
        self.indent += 1;
    }

    fn close_subgraph(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        self.write_indent();
        self.output.push_str("}\n");
    }

    fn blank(&mut self) {
        self.output.push('\n');
    }

    fn finish(mut self) -> String {
        self.output.push_str("}\n");
        self.output
    }
}

pub fn to_dot(diagram: &Diagram) -> String {
    let mut w = DotWriter::new(&diagram.title);

    let mut graph = default_graph_attrs();
    graph.set("rankdir", diagram.direction.as_str());
    graph.set("label", diagram.title.as_str());
    merge(&mut graph, &diagram.graph_attr);
    w.defaults("graph", &graph);

    let mut node = default_node_attrs();
    merge(&mut node, &diagram.node_attr);
    w.defaults("node", &node);

    let mut edge = default_edge_attrs();
    merge(&mut edge, &diagram.edge_attr);
    w.defaults("edge", &edge);

    w.blank();
    write_scope(&mut w, diagram, None);

    if !diagram.edges().is_empty() {
        w.blank();
    }
    for e in diagram.edges() {
        w.edge(&e.from.to_string(), &e.to.to_string(), &edge_attrs(e));
    }

    let dot = w.finish();
    tracing::debug!(
        title = %diagram.title,
        nodes = diagram.nodes().len(),
        edges = diagram.edges().len(),
        clusters = diagram.clusters().len(),
        bytes = dot.len(),
        "generated dot source"
    );
    dot
}

fn merge(base: &mut Attrs, overrides: &Attrs) {
    for (k, v) in overrides.iter() {
        base.set(k, v);
    }
}

fn write_scope(w: &mut DotWriter, diagram: &Diagram, scope: Option<ClusterId>) {
    for node in diagram.nodes_in(scope) {
        w.node(&node.id.to_string(), &node_attrs(node));
    }
    for cluster in diagram.clusters_in(scope) {
        w.open_subgraph(&cluster.id.to_string());
        w.defaults("graph", &cluster_attrs(cluster));
        write_scope(w, diagram, Some(cluster.id));
        w.close_subgraph();
    }
}

fn node_attrs(node: &Node) -> Attrs {
    let mut attrs = Attrs::new();
    attrs
        .set("label", node.label.as_str())
        .set("fillcolor", node.kind.fill_color())
        .set("fontcolor", node.kind.font_color())
        .set("tooltip", node.kind.to_string());
    attrs
}

fn cluster_attrs(cluster: &Cluster) -> Attrs {
    let mut attrs = Attrs::new();
    attrs
        .set("label", cluster.label.as_str())
        .set("style", "rounded")
        .set("labeljust", "l")
        .set("pencolor", "#AEB6BE")
        .set("fontname", FONT_NAME)
        .set("fontsize", "12")
        .set("bgcolor", CLUSTER_BG_COLORS[cluster.depth % CLUSTER_BG_COLORS.len()]);
    attrs
}

fn edge_attrs(edge: &Edge) -> Attrs {
    let mut attrs = Attrs::new();
    if let Some(label) = &edge.label {
        attrs.set("label", label.as_str());
    }
    if let Some(color) = &edge.color {
        attrs.set("color", color.as_str());
    }
    if let Some(style) = edge.style {
        attrs.set("style", style.as_str());
    }
    if edge.dir != EdgeDir::Forward {
        attrs.set("dir", edge.dir.as_str());
    }
    attrs
}
