//! # verify CLI
//!
//! Checks that the contents of a memory card were copied into an archive.
//!
//! ## Usage
//! ```bash
//! verify /media/SDCARD ~/Pictures
//! verify /media/SDCARD ~/Pictures --exclude '^backup/' --fingerprint metadata
//! ```

mod cli;

use console::style;
use std::process::ExitCode;

fn main() -> ExitCode {
    match cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("error:").red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
