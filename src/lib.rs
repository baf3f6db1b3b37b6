pub mod architectures;
pub mod catalog;
pub mod descriptor;
pub mod diagram;
pub mod dot;
pub mod error;
pub mod render;

use std::path::PathBuf;
use std::process::ExitCode;

pub use architectures::Architecture;
pub use catalog::NodeKind;
pub use descriptor::parse_descriptor;
pub use diagram::{Diagram, Direction, EdgeDir, LineStyle, NodeId, OutFormat};
pub use error::{DescriptorError, DiagramError, Error, RenderError, Result};
pub use render::Renderer;

/// Overrides the output format of the standalone architecture programs.
pub const FORMAT_ENV: &str = "ARCHDIAG_FORMAT";

pub fn render_descriptor(source: &str, renderer: &Renderer) -> Result<Vec<PathBuf>> {
    let diagram = parse_descriptor(source)?;
    Ok(renderer.render(&diagram)?)
}

/// Installs the stderr log subscriber, filtered by `RUST_LOG`. Safe to call
/// more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

/// Body of the `aws_architecture*` programs: render one architecture into
/// the working directory.
pub fn run_standalone(architecture: Architecture) -> ExitCode {
    init_tracing();
    match render_standalone(architecture, &Renderer::from_env()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("ERROR: {e}");
            ExitCode::FAILURE
        }
    }
}

fn render_standalone(architecture: Architecture, renderer: &Renderer) -> Result<Vec<PathBuf>> {
    let mut diagram = architecture.build()?;
    if let Ok(token) = std::env::var(FORMAT_ENV) {
        let format = OutFormat::from_token(&token).ok_or(Error::FormatEnv(token))?;
        diagram.outformats = vec![format];
    }
    tracing::debug!(architecture = architecture.name(), "rendering");
    Ok(renderer.render(&diagram)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_descriptor_to_dot_file() {
        let tmp = tempfile::tempdir().unwrap();
        let renderer = Renderer {
            out_dir: tmp.path().to_path_buf(),
            ..Renderer::default()
        };
        let source = "diagram \"Quick Look\"\noutformat dot\na = aws.storage.S3 \"A\"\n";
        let paths = render_descriptor(source, &renderer).unwrap();
        assert_eq!(paths, vec![tmp.path().join("quick_look.dot")]);
        let written = std::fs::read_to_string(&paths[0]).unwrap();
        assert!(written.starts_with("digraph \"Quick Look\" {"));
    }

    #[test]
    fn render_descriptor_reports_parse_errors() {
        let err = render_descriptor("nonsense", &Renderer::default()).unwrap_err();
        assert!(matches!(err, Error::Descriptor(_)), "got {err:?}");
    }
}
