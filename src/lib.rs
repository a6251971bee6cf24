//! # SD Card Verify
//!
//! Confirms that every photo and video on a memory card has a copy somewhere
//! in a (possibly huge) archive before the card is wiped.
//!
//! ## How it works
//! - Every qualifying file on the card is fingerprinted into a catalog
//! - The archive is walked newest-first and each match is struck off
//! - The search stops once the catalog is empty or the archive files become
//!   older than anything on the card
//! - Whatever is left in the catalog is reported as missing
//!
//! ## Architecture
//! - `core` - The verification engine
//! - `events` - Event-driven progress reporting
//! - `error` - Error types per layer
//! - `cli` - Command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{Result, VerifyError};

/// Initialize tracing for the library
///
/// Logs go to stderr so that `--output json` stays machine readable.
/// `RUST_LOG` takes precedence over the `verbose` default.
pub fn init_tracing(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive(verbose)));

    // A subscriber may already be installed (tests, embedding applications)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter used when `RUST_LOG` is unset
fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "warn"
    }
}
