//! Assertions over captured log lines.
//!
//! Both console formats work: plain text lines carry the level as a word,
//! JSON lines as `"level":"WARN"`. Message matching is case-insensitive.

/// Log lines captured from a run's stderr.
///
/// ```ignore
/// let result = cli.run(&["rip", "/dev/sr7", "--dry-run"]);
/// LogVerifier::from_stderr(&result.stderr)
///     .assert_warn("no drive status for device")
///     .assert_no_errors();
/// ```
pub struct LogVerifier {
    lines: Vec<String>,
}

impl LogVerifier {
    #[must_use]
    pub fn from_stderr(stderr: &str) -> Self {
        Self {
            lines: stderr.lines().map(String::from).collect(),
        }
    }

    fn at_level<'a>(&'a self, level: &'a str) -> impl Iterator<Item = &'a String> + 'a {
        self.lines.iter().filter(move |line| line.contains(level))
    }

    fn assert_logged(&self, level: &str, message: &str) -> &Self {
        let needle = message.to_lowercase();
        assert!(
            self.at_level(level)
                .any(|line| line.to_lowercase().contains(&needle)),
            "no {level} line mentions {message:?} in:\n{}",
            self.lines.join("\n")
        );
        self
    }

    pub fn assert_info(&self, message: &str) -> &Self {
        self.assert_logged("INFO", message)
    }

    pub fn assert_warn(&self, message: &str) -> &Self {
        self.assert_logged("WARN", message)
    }

    pub fn assert_no_errors(&self) -> &Self {
        let errors: Vec<&String> = self.at_level("ERROR").collect();
        assert!(errors.is_empty(), "unexpected ERROR lines: {errors:#?}");
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXT: &str = "\
2026-10-15T10:00:00.000000Z  INFO Starting autoripper destination=/rips
2026-10-15T10:00:01.000000Z  WARN No drive status for device; skipping device=/dev/sr7";

    const JSON: &str = r#"{"timestamp":"2026-10-15T10:00:02Z","level":"INFO","fields":{"message":"The media was ejected","device":"/dev/sr0"},"target":"autoripper::reconcile"}"#;

    #[test]
    fn text_lines_match_by_level_and_message() {
        LogVerifier::from_stderr(TEXT)
            .assert_info("starting AUTORIPPER")
            .assert_warn("no drive status")
            .assert_no_errors();
    }

    #[test]
    fn json_lines_match_too() {
        LogVerifier::from_stderr(JSON).assert_info("media was ejected");
    }

    #[test]
    #[should_panic(expected = "no WARN line")]
    fn wrong_level_is_reported() {
        LogVerifier::from_stderr(TEXT).assert_warn("starting autoripper");
    }
}
