//! Error types.
//!
//! - [`AppError`]: application-level failures (CLI, file I/O, invalid config),
//!   carrying the process exit code.
//! - [`FitError`]: why a single candidate threshold produced no row. These are
//!   never surfaced past the fitting engine; they are counted in diagnostics.

use thiserror::Error;

/// Exit code for usage, configuration and I/O problems.
pub const EXIT_USAGE: u8 = 2;
/// Exit code when no usable data remains.
pub const EXIT_NO_DATA: u8 = 3;
/// Exit code for numerical/computation failures.
pub const EXIT_COMPUTE: u8 = 4;

#[derive(Clone, Error)]
#[error("{message}")]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

/// Outcome of a failed per-threshold fit.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("only {count} exceedances (need at least {required})")]
    InsufficientExceedances { count: usize, required: usize },

    #[error("likelihood fit did not converge: {reason}")]
    NonConvergence { reason: String },
}

impl FitError {
    pub fn non_convergence(reason: impl Into<String>) -> Self {
        FitError::NonConvergence {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_error_displays_message_only() {
        let err = AppError::new(EXIT_USAGE, "bad flag");
        assert_eq!(err.to_string(), "bad flag");
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn fit_error_messages_name_the_cause() {
        let err = FitError::InsufficientExceedances {
            count: 4,
            required: 10,
        };
        assert_eq!(err.to_string(), "only 4 exceedances (need at least 10)");
        assert!(
            FitError::non_convergence("max iterations")
                .to_string()
                .contains("max iterations")
        );
    }
}
