//! # Pipeline Module
//!
//! Orchestrates a full verification run.
//!
//! ## Stages
//! 1. **Index** - fingerprint every qualifying file on the card
//! 2. **Search** - walk the target newest-first, consuming matches
//! 3. **Report** - list the card files that were never matched
//!
//! ## Parallelism
//! Card files are fingerprinted with rayon. The target search is sequential
//! unless a worker count above one is configured.

mod executor;

pub use executor::{VerificationReport, Verifier, VerifierBuilder, VerifyConfig};
