//! Subcommand implementations.
//!
//! Each command calls the backend once (the price command runs the full
//! resolution flow) and writes its result as YAML to stdout.

pub mod catalog;
pub mod price;
pub mod trends;

use std::io::Write;

use plaze_storefront::api::{ApiError, ApiSession};
use plaze_storefront::config::ConfigError;
use plaze_storefront::forms::FormError;
use plaze_storefront::resolution::ResolveError;
use plaze_storefront::session::MemorySessionStore;
use serde::Serialize;
use thiserror::Error;

/// API handle the commands share.
pub type Api<'a> = ApiSession<'a, MemorySessionStore>;

/// Errors a command can end with.
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Input(#[from] FormError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_yaml::Error),

    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// Write `value` as a YAML document to stdout.
fn emit<T: Serialize>(value: &T) -> Result<(), CliError> {
    let mut out = std::io::stdout().lock();
    serde_yaml::to_writer(&mut out, value)?;
    out.flush()?;
    Ok(())
}
