//! Error types.
//!
//! `AppError` is the run-level error: it carries the process exit code and a
//! message for `main` to print. `InsufficientData` is the per-title error: it
//! is reported next to the title it belongs to and never aborts the run.

/// Exit code for invalid arguments or configuration.
pub const EXIT_USAGE: u8 = 2;
/// Exit code for failures writing output artifacts.
pub const EXIT_OUTPUT: u8 = 3;
/// Exit code for malformed upstream data.
pub const EXIT_DATA: u8 = 4;

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

    pub fn output(message: impl Into<String>) -> Self {
        Self::new(EXIT_OUTPUT, message)
    }

    pub fn data(message: impl Into<String>) -> Self {
        Self::new(EXIT_DATA, message)
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
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

/// Too few usable points for a stage of the analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsufficientData {
    /// Which stage refused the input (`"smoothing"`, `"summary"`).
    pub stage: &'static str,
    pub required: usize,
    pub available: usize,
}

impl InsufficientData {
    pub fn new(stage: &'static str, required: usize, available: usize) -> Self {
        Self {
            stage,
            required,
            available,
        }
    }
}

impl std::fmt::Display for InsufficientData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "insufficient data for {}: need {} points, have {}",
            self.stage, self.required, self.available
        )
    }
}

impl std::error::Error for InsufficientData {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message_names_stage_and_counts() {
        let err = InsufficientData::new("smoothing", 7, 3);
        assert_eq!(
            err.to_string(),
            "insufficient data for smoothing: need 7 points, have 3"
        );
    }

    #[test]
    fn constructors_set_exit_codes() {
        assert_eq!(AppError::usage("x").exit_code(), EXIT_USAGE);
        assert_eq!(AppError::output("x").exit_code(), EXIT_OUTPUT);
        assert_eq!(AppError::data("x").exit_code(), EXIT_DATA);
        assert_eq!(AppError::data("bad payload").to_string(), "bad payload");
    }
}
