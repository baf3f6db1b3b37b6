use std::path::PathBuf;
use std::process::ExitStatus;

use crate::diagram::NodeId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiagramError {
    #[error("edge endpoint {0} is not a node of this diagram")]
    UnknownNode(NodeId),
}

/// Errors raised while reading a descriptor. Line numbers are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DescriptorError {
    #[error("syntax error on line {line}: unexpected `{context}`")]
    Syntax { line: usize, context: String },

    #[error("descriptor must start with `diagram \"<title>\"`")]
    MissingHeader,

    #[error("line {line}: cluster is never closed with `}}`")]
    UnclosedCluster { line: usize },

    #[error("line {line}: unknown node `{name}`")]
    UnknownNode { name: String, line: usize },

    #[error("line {line}: node `{name}` is already declared")]
    DuplicateNode { name: String, line: usize },

    #[error("line {line}: unknown node kind `{path}`")]
    UnknownKind { path: String, line: usize },

    #[error("line {line}: unknown direction `{value}` (expected TB, BT, LR or RL)")]
    UnknownDirection { value: String, line: usize },

    #[error("line {line}: unknown output format `{value}` (expected png, jpg, svg, pdf or dot)")]
    UnknownFormat { value: String, line: usize },

    #[error(transparent)]
    Diagram(#[from] DiagramError),
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("graphviz executable `{}` not found; install graphviz or set ARCHDIAG_DOT", bin.display())]
    GraphvizNotFound { bin: PathBuf },

    #[error("failed to pipe dot source to `{}`: {source}", bin.display())]
    Pipe {
        bin: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("graphviz exited with {status}: {stderr}")]
    GraphvizFailed { status: ExitStatus, stderr: String },
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Diagram(#[from] DiagramError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("unknown output format `{0}` in ARCHDIAG_FORMAT")]
    FormatEnv(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
