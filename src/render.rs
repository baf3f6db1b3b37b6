use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::diagram::{Diagram, OutFormat};
use crate::dot::to_dot;
use crate::error::RenderError;

pub const DOT_BIN_ENV: &str = "ARCHDIAG_DOT";
pub const OUT_DIR_ENV: &str = "ARCHDIAG_OUT_DIR";

/// Writes diagrams to disk, through Graphviz for every format except `dot`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderer {
    pub dot_bin: PathBuf,
    pub out_dir: PathBuf,
}

impl Default for Renderer {
    fn default() -> Self {
        Self {
            dot_bin: PathBuf::from("dot"),
            out_dir: PathBuf::from("."),
        }
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `ARCHDIAG_DOT` and `ARCHDIAG_OUT_DIR`.
    pub fn from_env() -> Self {
        let mut renderer = Self::default();
        if let Some(bin) = std::env::var_os(DOT_BIN_ENV) {
            renderer.dot_bin = PathBuf::from(bin);
        }
        if let Some(dir) = std::env::var_os(OUT_DIR_ENV) {
            renderer.out_dir = PathBuf::from(dir);
        }
        renderer
    }

    /// Renders every output format of `diagram`, returning the written paths
    /// in format order. Stops at the first failure.
    pub fn render(&self, diagram: &Diagram) -> Result<Vec<PathBuf>, RenderError> {
        let source = to_dot(diagram);
        let paths = diagram.output_paths(&self.out_dir);
        for (format, path) in diagram.outformats.iter().zip(&paths) {
            match format {
                OutFormat::Dot => write_file(path, source.as_bytes())?,
                _ => self.run_graphviz(*format, &source, path)?,
            }
            tracing::info!(path = %path.display(), "diagram written");
        }
        Ok(paths)
    }

    fn run_graphviz(&self, format: OutFormat, source: &str, path: &Path) -> Result<(), RenderError> {
        tracing::debug!(
            bin = %self.dot_bin.display(),
            format = format.extension(),
            path = %path.display(),
            "running graphviz"
        );

        let mut child = Command::new(&self.dot_bin)
            .arg(format!("-T{}", format.extension()))
            .arg("-o")
            .arg(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(stdin) = child.stdin.take() {
            if let Err(err) = feed(stdin, source) {
                let _ = child.kill();
                let _ = child.wait();
                return Err(RenderError::Pipe {
                    bin: self.dot_bin.clone(),
                    source: err,
                });
            }
        }

        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if !output.status.success() {
            return Err(RenderError::GraphvizFailed {
                status: output.status,
                stderr,
            });
        }
        if !stderr.is_empty() {
            tracing::warn!(%stderr, "graphviz reported warnings");
        }
        Ok(())
    }

    fn spawn_error(&self, source: io::Error) -> RenderError {
        if source.kind() == io::ErrorKind::NotFound {
            RenderError::GraphvizNotFound {
                bin: self.dot_bin.clone(),
            }
        } else {
            RenderError::Io {
                path: self.dot_bin.clone(),
                source,
            }
        }
    }
}

/// Writes the DOT source and closes the pipe. A broken pipe means graphviz
/// exited early; its exit status says why.
fn feed(mut stdin: impl Write, source: &str) -> io::Result<()> {
    match stdin.write_all(source.as_bytes()) {
        Err(e) if e.kind() != io::ErrorKind::BrokenPipe => Err(e),
        _ => Ok(()),
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), RenderError> {
    std::fs::write(path, contents).map_err(|source| RenderError::Io {
        path: path.to_path_buf(),
        source,
    })
}
