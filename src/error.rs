//! Errors that abort a probing run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The domain list could not be read.
    #[error("cannot read input '{}': {source}", .path.display())]
    Input { path: PathBuf, source: io::Error },

    /// A DNS exchange failed or returned something unusable.
    ///
    /// Fatal to the whole run: there are no retries and no partial
    /// output, so one failed probe forfeits the batch.
    #[error("resolution failed: {detail}")]
    Resolution { detail: String },

    /// The report could not be written.
    #[error("cannot write output '{}': {source}", .path.display())]
    Output { path: PathBuf, source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;
