//! Push-only collection of semantic diagnostics.
//!
//! Every analysis pass receives `&mut Diagnostics` and reports into it
//! without unwinding, so one run over the tree surfaces every independent
//! violation.

use std::fmt;

use crate::{ErrorKind, SemanticError};

/// Diagnostics gathered across the analysis passes, in report order.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    errors: Vec<SemanticError>,
}

impl Diagnostics {
    /// Creates a new, empty diagnostics collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a violation. Never stops the caller.
    pub fn report(&mut self, error: SemanticError) {
        tracing::trace!(kind = ?error.kind(), %error, "diagnostic reported");
        self.errors.push(error);
    }

    /// Returns `true` if anything was reported.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Total number of reported diagnostics.
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Number of diagnostics of one kind.
    pub fn count_of(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }

    /// Iterate over diagnostics in report order.
    pub fn iter(&self) -> impl Iterator<Item = &SemanticError> {
        self.errors.iter()
    }

    /// Diagnostics of one kind, in report order.
    pub fn of_kind(&self, kind: ErrorKind) -> impl Iterator<Item = &SemanticError> {
        self.errors.iter().filter(move |e| e.kind() == kind)
    }

    /// Returns `true` if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consume the collection.
    pub fn into_vec(self) -> Vec<SemanticError> {
        self.errors
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for error in &self.errors {
            writeln!(f, "{}", error)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a SemanticError;
    type IntoIter = std::slice::Iter<'a, SemanticError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}
