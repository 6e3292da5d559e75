#![forbid(unsafe_code)]

use std::process::ExitCode;

fn main() -> ExitCode {
    ppm_import::cli::main()
}
