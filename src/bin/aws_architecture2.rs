use std::process::ExitCode;

use archdiag::Architecture;

fn main() -> ExitCode {
    archdiag::run_standalone(Architecture::Aws2)
}
