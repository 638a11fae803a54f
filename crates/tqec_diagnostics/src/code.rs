//! Diagnostic codes: a category prefix, the optimizer stage that owns the
//! code, and a number.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The category of a diagnostic code, determining its prefix letter.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum Category {
    /// Error diagnostics, prefixed with `E`.
    Error,
    /// Warning diagnostics, prefixed with `W`.
    Warning,
    /// Informational summaries, prefixed with `N`.
    Note,
}

impl Category {
    /// Returns the single-character prefix for this category.
    pub fn prefix(self) -> char {
        match self {
            Category::Error => 'E',
            Category::Warning => 'W',
            Category::Note => 'N',
        }
    }
}

/// The optimizer stage that raised a diagnostic.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Loop pruning and the rewrite rules.
    Reduce,
    /// Module placement and annealing.
    Place,
    /// Port pairing and grid routing.
    Route,
    /// The per-phase pipeline around placement and routing.
    Phase,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Reduce => "reduce",
            Stage::Place => "place",
            Stage::Route => "route",
            Stage::Phase => "phase",
        };
        f.write_str(name)
    }
}

/// A structured diagnostic code: a category prefix, the stage that owns the
/// code, and a number.
///
/// Displayed as the prefix followed by a zero-padded 3-digit number, e.g.
/// `W301` or `E303`. The stage is not part of the display.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct DiagnosticCode {
    /// The category of this diagnostic.
    pub category: Category,
    /// The stage that emits this code.
    pub stage: Stage,
    /// The numeric identifier within the category.
    pub number: u16,
}

impl DiagnosticCode {
    /// Creates a new diagnostic code.
    pub const fn new(category: Category, stage: Stage, number: u16) -> Self {
        Self {
            category,
            stage,
            number,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:03}", self.category.prefix(), self.number)
    }
}
