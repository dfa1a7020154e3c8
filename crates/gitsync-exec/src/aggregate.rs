//! Aggregation of independent command failures.

use std::fmt;

use crate::ExecError;

/// One or more command failures reported as a single error.
///
/// Failures keep their original order and full text; the display form joins
/// them with newlines.
#[derive(Debug)]
pub struct ExecErrors(Vec<ExecError>);

impl ExecErrors {
    /// Returns the number of failures.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; an `ExecErrors` holds at least one failure.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the failures in the order they occurred.
    pub fn iter(&self) -> impl Iterator<Item = &ExecError> {
        self.0.iter()
    }

    /// Consumes the aggregate, returning the individual failures.
    #[must_use]
    pub fn into_inner(self) -> Vec<ExecError> {
        self.0
    }
}

impl fmt::Display for ExecErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("\n")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ExecErrors {}

/// Merges the outcomes of several commands into a single error.
///
/// `None` entries are skipped. Returns `None` when no entry holds an error.
pub fn merge_errors<I>(errors: I) -> Option<ExecErrors>
where
    I: IntoIterator<Item = Option<ExecError>>,
{
    let errors: Vec<ExecError> = errors.into_iter().flatten().collect();
    if errors.is_empty() {
        None
    } else {
        Some(ExecErrors(errors))
    }
}
