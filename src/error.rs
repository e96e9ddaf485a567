//! Process-level error for `ptl`.
//!
//! Every failure carries the exit code `main` returns:
//! - [`EXIT_USAGE`]: bad flags, missing config, unreadable or invalid files
//! - [`EXIT_RUNTIME`]: network, backend response, terminal and log I/O
//!
//! Malformed series points are not errors; ingest drops and reports them.

/// Exit code for problems the user can fix with different input.
pub const EXIT_USAGE: u8 = 2;

/// Exit code for failures while fetching, rendering or writing diagnostics.
pub const EXIT_RUNTIME: u8 = 4;

#[derive(Clone)]
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

    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(EXIT_RUNTIME, message)
    }

    /// Prefix the message and move the error to `exit_code`.
    ///
    /// Used when a lower layer's failure means something else to the caller,
    /// e.g. a backend-shaped parse error inside a user-supplied snapshot file.
    pub fn reclassify(self, exit_code: u8, context: &str) -> Self {
        Self::new(exit_code, format!("{context}: {}", self.message))
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
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

impl std::error::Error for AppError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_pick_exit_codes() {
        assert_eq!(AppError::usage("bad flag").exit_code(), EXIT_USAGE);
        assert_eq!(AppError::runtime("timeout").exit_code(), EXIT_RUNTIME);
        assert_eq!(AppError::usage("bad flag").to_string(), "bad flag");
    }

    #[test]
    fn reclassify_prefixes_and_moves_the_code() {
        let err = AppError::runtime("not an array").reclassify(EXIT_USAGE, "Invalid snapshot products");
        assert_eq!(err.exit_code(), EXIT_USAGE);
        assert_eq!(err.message(), "Invalid snapshot products: not an array");
    }
}
