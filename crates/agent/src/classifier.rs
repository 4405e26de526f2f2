//! Shell outcome classifier.
//!
//! Shell tools report everything as text, so failure detection happens here
//! on the observed output. The classifier is a pure function, independent of
//! the loop, and returns a tagged outcome instead of a bare bool.

/// Substrings that mark a shell result as a generic failure.
const ERROR_SIGNATURES: &[&str] =
    &["STDERR", "Error:", "Traceback", "Exception", "command not found"];

/// How a shell execution went, judged from its text output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellOutcome {
    Success,
    /// The command hit the wall-clock timeout.
    Timeout,
    /// The safety guard refused to run the command.
    SafetyBlock,
    /// stderr output, interpreter traceback, missing binary, etc.
    GenericError,
}

impl ShellOutcome {
    /// Anything but `Success` makes the result a candidate for correction.
    pub fn is_failure(&self) -> bool {
        !matches!(self, ShellOutcome::Success)
    }
}

/// Classify a shell tool's text output.
///
/// Specific alerts are matched before the generic signature list so a
/// timeout is not misreported as a plain error.
pub fn classify_shell_output(output: &str) -> ShellOutcome {
    if output.contains("TIMEOUT ALERT") {
        return ShellOutcome::Timeout;
    }
    if output.contains("SAFETY ALERT") {
        return ShellOutcome::SafetyBlock;
    }
    if ERROR_SIGNATURES.iter().any(|sig| output.contains(sig)) {
        return ShellOutcome::GenericError;
    }
    ShellOutcome::Success
}
