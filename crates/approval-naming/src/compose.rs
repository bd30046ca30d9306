//! Name composition
//!
//! Joins a base identity with the active qualifiers. Parts are taken as-is:
//! they were sanitized when they were pushed.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Separator between the base and each qualifier
pub const SEPARATOR: char = '.';

/// Base identity plus a snapshot of the active qualifiers
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComposedName {
    /// Resolved or overridden base identity
    pub base: String,
    /// Qualifier values, oldest first
    pub parts: Vec<String>,
}

impl ComposedName {
    /// Create from a base and qualifier snapshot
    #[inline]
    #[must_use]
    pub fn new(base: impl Into<String>, parts: Vec<String>) -> Self {
        Self {
            base: base.into(),
            parts,
        }
    }

    /// Whether any qualifier is active
    #[inline]
    #[must_use]
    pub fn is_qualified(&self) -> bool {
        !self.parts.is_empty()
    }
}

impl Display for ComposedName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.base)?;
        for part in &self.parts {
            write!(f, "{SEPARATOR}{part}")?;
        }
        Ok(())
    }
}

/// Compose `base.part1.part2...` in the given order
///
/// # Example
/// ```
/// use approval_naming::compose::compose_name;
///
/// let name = compose_name("Tests.render", &["ForScenario.dark", "ForUser.ci"]);
/// assert_eq!(name, "Tests.render.ForScenario.dark.ForUser.ci");
/// ```
#[must_use]
pub fn compose_name<S: AsRef<str>>(base: &str, parts: &[S]) -> String {
    let len = base.len() + parts.iter().map(|p| p.as_ref().len() + 1).sum::<usize>();
    let mut name = String::with_capacity(len);
    name.push_str(base);
    for part in parts {
        name.push(SEPARATOR);
        name.push_str(part.as_ref());
    }
    name
}
