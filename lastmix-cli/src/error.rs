//! CLI error type.

use std::fmt;

use lastmix::LastmixError;

/// Errors reported by the `lastmix` binary. All exit with status 1.
#[derive(Debug)]
pub enum CliError {
    /// Invalid combination of command line arguments.
    Usage(String),
    /// Error from the library.
    Lastmix(LastmixError),
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Usage(message) => write!(f, "{}", message),
            CliError::Lastmix(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Usage(_) => None,
            CliError::Lastmix(e) => Some(e),
        }
    }
}

impl From<LastmixError> for CliError {
    fn from(e: LastmixError) -> Self {
        CliError::Lastmix(e)
    }
}
