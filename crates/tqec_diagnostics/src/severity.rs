//! Diagnostic severity levels ordered from least to most severe.

use crate::code::Category;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The severity level of a diagnostic message.
///
/// Ordered from least severe (`Note`) to most severe (`Error`) by declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub enum Severity {
    /// An informational note, such as a pass summary.
    Note,
    /// A degraded but usable result (e.g. a search that hit its iteration cap).
    Warning,
    /// A result that must not be used.
    Error,
}

impl Severity {
    /// Returns `true` if this severity is [`Error`](Severity::Error).
    pub fn is_error(self) -> bool {
        self == Severity::Error
    }

    /// Formats `count` diagnostics of this severity, e.g. `1 warning` or `3 errors`.
    pub fn counted(self, count: usize) -> String {
        let plural = if count == 1 { "" } else { "s" };
        format!("{count} {self}{plural}")
    }
}

impl From<Category> for Severity {
    fn from(category: Category) -> Self {
        match category {
            Category::Error => Severity::Error,
            Category::Warning => Severity::Warning,
            Category::Note => Severity::Note,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering() {
        assert!(Severity::Note < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
    }

    #[test]
    fn category_sets_severity() {
        assert_eq!(Severity::from(Category::Error), Severity::Error);
        assert_eq!(Severity::from(Category::Note), Severity::Note);
    }

    #[test]
    fn counted_pluralizes() {
        assert_eq!(Severity::Warning.counted(1), "1 warning");
        assert_eq!(Severity::Error.counted(0), "0 errors");
        assert_eq!(Severity::Note.counted(3), "3 notes");
    }

    #[test]
    fn is_error() {
        assert!(Severity::Error.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(!Severity::Note.is_error());
    }
}
