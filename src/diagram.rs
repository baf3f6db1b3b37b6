use std::fmt;
use std::path::{Path, PathBuf};

use crate::catalog::NodeKind;
use crate::error::DiagramError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClusterId(usize);

impl ClusterId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster_{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    TopBottom,
    BottomTop,
    #[default]
    LeftRight,
    RightLeft,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TopBottom => "TB",
            Direction::BottomTop => "BT",
            Direction::LeftRight => "LR",
            Direction::RightLeft => "RL",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "TB" => Some(Direction::TopBottom),
            "BT" => Some(Direction::BottomTop),
            "LR" => Some(Direction::LeftRight),
            "RL" => Some(Direction::RightLeft),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutFormat {
    #[default]
    Png,
    Jpg,
    Svg,
    Pdf,
    Dot,
}

impl OutFormat {
    /// File extension, also the Graphviz `-T` argument.
    pub fn extension(self) -> &'static str {
        match self {
            OutFormat::Png => "png",
            OutFormat::Jpg => "jpg",
            OutFormat::Svg => "svg",
            OutFormat::Pdf => "pdf",
            OutFormat::Dot => "dot",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "png" => Some(OutFormat::Png),
            "jpg" => Some(OutFormat::Jpg),
            "svg" => Some(OutFormat::Svg),
            "pdf" => Some(OutFormat::Pdf),
            "dot" => Some(OutFormat::Dot),
            _ => None,
        }
    }
}

/// Ordered rendering hints. Setting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attrs(Vec<(String, String)>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.0.push((key, value)),
        }
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Attrs {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attrs = Attrs::new();
        for (k, v) in iter {
            attrs.set(k, v);
        }
        attrs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    pub cluster: Option<ClusterId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    pub id: ClusterId,
    pub label: String,
    pub parent: Option<ClusterId>,
    /// Nesting depth, 0 for a cluster declared at the top level.
    pub depth: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EdgeDir {
    #[default]
    Forward,
    Back,
    Both,
    None,
}

impl EdgeDir {
    pub fn as_str(self) -> &'static str {
        match self {
            EdgeDir::Forward => "forward",
            EdgeDir::Back => "back",
            EdgeDir::Both => "both",
            EdgeDir::None => "none",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
    Dotted,
    Bold,
}

impl LineStyle {
    pub fn as_str(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
            LineStyle::Bold => "bold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
    pub label: Option<String>,
    pub color: Option<String>,
    pub style: Option<LineStyle>,
    pub dir: EdgeDir,
}

impl Edge {
    pub fn label(&mut self, label: impl Into<String>) -> &mut Self {
        self.label = Some(label.into());
        self
    }

    pub fn color(&mut self, color: impl Into<String>) -> &mut Self {
        self.color = Some(color.into());
        self
    }

    pub fn style(&mut self, style: LineStyle) -> &mut Self {
        self.style = Some(style);
        self
    }

    pub fn dir(&mut self, dir: EdgeDir) -> &mut Self {
        self.dir = dir;
        self
    }
}

/// A titled graph of service nodes, clusters and edges, plus the options
/// handed to the renderer.
///
/// Nodes and edges are only added through [`Diagram::node`] and
/// [`Diagram::connect`], so every edge endpoint is a node declared earlier in
/// the same diagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagram {
    pub title: String,
    /// Output file stem. Derived from the title when unset.
    pub filename: Option<String>,
    pub direction: Direction,
    pub outformats: Vec<OutFormat>,
    pub graph_attr: Attrs,
    pub node_attr: Attrs,
    pub edge_attr: Attrs,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    clusters: Vec<Cluster>,
    scope: Vec<ClusterId>,
}

impl Diagram {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            filename: None,
            direction: Direction::default(),
            outformats: vec![OutFormat::default()],
            graph_attr: Attrs::new(),
            node_attr: Attrs::new(),
            edge_attr: Attrs::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
            clusters: Vec::new(),
            scope: Vec::new(),
        }
    }

    /// Declares a node inside the innermost open cluster, if any.
    pub fn node(&mut self, kind: NodeKind, label: impl Into<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            label: label.into(),
            cluster: self.scope.last().copied(),
        });
        id
    }

    /// Opens a cluster for the duration of `f`. Nodes and clusters declared
    /// inside `f` belong to it.
    pub fn cluster<R>(&mut self, label: impl Into<String>, f: impl FnOnce(&mut Diagram) -> R) -> R {
        let id = ClusterId(self.clusters.len());
        self.clusters.push(Cluster {
            id,
            label: label.into(),
            parent: self.scope.last().copied(),
            depth: self.scope.len(),
        });
        self.scope.push(id);
        let result = f(self);
        self.scope.pop();
        result
    }

    pub fn connect(&mut self, from: NodeId, to: NodeId) -> Result<&mut Edge, DiagramError> {
        for id in [from, to] {
            if id.0 >= self.nodes.len() {
                return Err(DiagramError::UnknownNode(id));
            }
        }
        self.edges.push(Edge {
            from,
            to,
            label: None,
            color: None,
            style: None,
            dir: EdgeDir::Forward,
        });
        let last = self.edges.len() - 1;
        Ok(&mut self.edges[last])
    }

    /// One forward edge from `from` to each of `targets`. Nothing is added if
    /// any endpoint is unknown.
    pub fn connect_all(&mut self, from: NodeId, targets: &[NodeId]) -> Result<(), DiagramError> {
        if let Some(bad) = std::iter::once(&from)
            .chain(targets)
            .find(|id| id.0 >= self.nodes.len())
        {
            return Err(DiagramError::UnknownNode(*bad));
        }
        for &to in targets {
            self.connect(from, to)?;
        }
        Ok(())
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn get_cluster(&self, id: ClusterId) -> Option<&Cluster> {
        self.clusters.get(id.0)
    }

    /// Nodes declared directly in `cluster`, or at the top level for `None`.
    pub fn nodes_in(&self, cluster: Option<ClusterId>) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.cluster == cluster)
    }

    /// Clusters nested directly in `parent`, or at the top level for `None`.
    pub fn clusters_in(&self, parent: Option<ClusterId>) -> impl Iterator<Item = &Cluster> {
        self.clusters.iter().filter(move |c| c.parent == parent)
    }

    /// File stem: the explicit filename, or the title split on whitespace,
    /// joined with `_` and lowercased.
    pub fn output_stem(&self) -> String {
        match &self.filename {
            Some(name) => name.clone(),
            None => self
                .title
                .split_whitespace()
                .collect::<Vec<_>>()
                .join("_")
                .to_lowercase(),
        }
    }

    pub fn output_paths(&self, dir: &Path) -> Vec<PathBuf> {
        let stem = self.output_stem();
        self.outformats
            .iter()
            .map(|fmt| dir.join(format!("{stem}.{}", fmt.extension())))
            .collect()
    }
}
