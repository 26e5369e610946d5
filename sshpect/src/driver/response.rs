//! Response type for command execution results.

use std::time::Duration;

use serde::Serialize;

use crate::channel::MatchStatus;

/// Response from a command execution.
///
/// A timed-out or disconnected command still produces a response: `output`
/// carries whatever arrived, and `status` says how the wait ended.
#[derive(Debug, Clone, Serialize)]
pub struct Response {
    /// The command that was sent.
    pub command: String,

    /// Everything read back, through the matched prompt when one matched
    /// (lossy UTF-8).
    pub output: String,

    /// How the prompt wait ended.
    pub status: MatchStatus,

    /// Time from write to read completion.
    pub elapsed: Duration,
}

impl Response {
    /// Create a new response.
    pub fn new(
        command: impl Into<String>,
        output: impl Into<String>,
        status: MatchStatus,
        elapsed: Duration,
    ) -> Self {
        Self {
            command: command.into(),
            output: output.into(),
            status,
            elapsed,
        }
    }

    /// Whether the prompt (or a caller-supplied pattern) was seen.
    pub fn is_success(&self) -> bool {
        self.status.is_match()
    }

    /// The output lines as an iterator.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.output.lines()
    }

    /// Check if the output contains a substring.
    pub fn contains(&self, pattern: &str) -> bool {
        self.output.contains(pattern)
    }
}

impl std::fmt::Display for Response {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(status: MatchStatus) -> Response {
        Response::new(
            "uname -a",
            "Linux lab 6.1.0\n$ ",
            status,
            Duration::from_millis(120),
        )
    }

    #[test]
    fn test_success_tracks_status() {
        assert!(sample(MatchStatus::Matched { pattern: 0 }).is_success());
        assert!(!sample(MatchStatus::TimedOut).is_success());
        assert!(!sample(MatchStatus::Disconnected).is_success());
    }

    #[test]
    fn test_lines_and_contains() {
        let response = sample(MatchStatus::Matched { pattern: 0 });
        assert_eq!(response.lines().next(), Some("Linux lab 6.1.0"));
        assert!(response.contains("lab"));
        assert!(!response.contains("darwin"));
    }

    #[test]
    fn test_display_shows_output() {
        let response = sample(MatchStatus::Matched { pattern: 0 });
        assert_eq!(response.to_string(), "Linux lab 6.1.0\n$ ");
    }

    #[test]
    fn test_serializes_with_status() {
        let value =
            serde_json::to_value(sample(MatchStatus::Matched { pattern: 2 })).unwrap();
        assert_eq!(value["command"], "uname -a");
        assert_eq!(value["status"]["matched"]["pattern"], 2);

        let timed_out = serde_json::to_value(sample(MatchStatus::TimedOut)).unwrap();
        assert_eq!(timed_out["status"], "timed_out");
    }
}
