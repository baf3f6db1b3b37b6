use std::io::Read;
use std::path::PathBuf;

use clap::Parser;

use archdiag::{Architecture, Diagram, OutFormat, Renderer};

#[derive(Parser)]
#[command(
    name = "archdiag",
    about = "Render architecture diagram descriptors with Graphviz",
    version
)]
struct Cli {
    /// Descriptor file (reads from stdin if neither FILE nor --builtin is given)
    #[arg(conflicts_with = "builtin")]
    file: Option<PathBuf>,

    /// Render a built-in architecture: aws-architecture1, aws-architecture2, aws-architecture3
    #[arg(long, value_parser = parse_builtin)]
    builtin: Option<Architecture>,

    /// Output format, repeatable (png, jpg, svg, pdf, dot); overrides the descriptor
    #[arg(long = "format", short = 'f', value_parser = parse_format)]
    formats: Vec<OutFormat>,

    /// Directory the output files are written to
    #[arg(long, short = 'o', env = "ARCHDIAG_OUT_DIR", default_value = ".")]
    out_dir: PathBuf,

    /// Output file stem; overrides the descriptor and the title-derived name
    #[arg(long)]
    filename: Option<String>,

    /// Graphviz executable
    #[arg(long, env = "ARCHDIAG_DOT", default_value = "dot")]
    dot_bin: PathBuf,

    /// Print the DOT source to stdout instead of rendering
    #[arg(long)]
    print_dot: bool,
}

fn parse_format(s: &str) -> Result<OutFormat, String> {
    OutFormat::from_token(s).ok_or_else(|| format!("unknown format `{s}`"))
}

fn parse_builtin(s: &str) -> Result<Architecture, String> {
    Architecture::from_name(s).ok_or_else(|| format!("unknown built-in architecture `{s}`"))
}

fn load(cli: &Cli) -> archdiag::Result<Diagram> {
    if let Some(architecture) = cli.builtin {
        return Ok(architecture.build()?);
    }
    let source = match &cli.file {
        Some(path) => std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("ERROR: failed to read {}: {e}", path.display());
            std::process::exit(1);
        }),
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf).unwrap_or_else(|e| {
                eprintln!("ERROR: failed to read stdin: {e}");
                std::process::exit(1);
            });
            buf
        }
    };
    Ok(archdiag::parse_descriptor(&source)?)
}

fn main() {
    archdiag::init_tracing();
    let cli = Cli::parse();

    let mut diagram = match load(&cli) {
        Ok(diagram) => diagram,
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    };
    if !cli.formats.is_empty() {
        diagram.outformats = cli.formats.clone();
    }
    if let Some(name) = &cli.filename {
        diagram.filename = Some(name.clone());
    }

    if cli.print_dot {
        print!("{}", archdiag::dot::to_dot(&diagram));
        return;
    }

    let renderer = Renderer {
        dot_bin: cli.dot_bin,
        out_dir: cli.out_dir,
    };
    match renderer.render(&diagram) {
        Ok(paths) => {
            for path in paths {
                println!("{}", path.display());
            }
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}
