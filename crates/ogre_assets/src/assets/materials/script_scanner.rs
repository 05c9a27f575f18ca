//! Raw material-script text to normalized lines
//!
//! A pure pass over the input: no shared state, restartable on any text.

/// Line-comment marker; any line containing it is dropped entirely.
const COMMENT_MARKER: &str = "//";

/// Normalizes raw script text into clean, dispatchable lines.
pub struct ScriptScanner;

impl ScriptScanner {
    /// Strip comment lines and blanks, trim each line, and collapse internal
    /// whitespace runs to single spaces.
    pub fn scan(source: &str) -> Vec<String> {
        source
            .lines()
            .filter(|line| !line.contains(COMMENT_MARKER))
            .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
            .filter(|line| !line.is_empty())
            .collect()
    }
}
