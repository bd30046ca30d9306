//! Qualifier registry
//!
//! Built-in qualifiers ([`QualifierKind`]) plus a process-wide registry of
//! user-defined qualifier functions. Every function here returns a value
//! that is already safe to push: trusted prefixes (`ForMachine.`, `ForUser.`,
//! `ForScenario.`) are kept verbatim and the variable part is scrubbed.
//!
//! The `*_qualifier` functions take the raw host value as input and hold the
//! formatting rules; the zero-argument functions feed them from the host.

use crate::config::FailureMode;
use crate::environment::{self, Toolchain, RUSTC_DESCRIPTION};
use crate::error::NamingError;
use crate::sanitize::scrub;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fmt::{self, Display};
use std::sync::Arc;

/// Prefix of machine-name qualifiers
pub const MACHINE_PREFIX: &str = "ForMachine.";

/// Prefix of user-name qualifiers
pub const USER_PREFIX: &str = "ForUser.";

/// Prefix of scenario qualifiers
pub const SCENARIO_PREFIX: &str = "ForScenario.";

/// Prefix of runtime-version qualifiers
pub const RUNTIME_VERSION_PREFIX: &str = "Rustc_v";

/// Built-in qualifier kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QualifierKind {
    /// `ForMachine.<hostname>`
    MachineName,
    /// `ForUser.<username>`
    UserName,
    /// Normalized OS caption, well-known Windows releases collapsed
    OperatingSystem,
    /// OS caption without collapsing
    FullOperatingSystem,
    /// `Rust_<major>.<minor>` or `RustNightly_<major>.<minor>`
    Runtime,
    /// `Rustc_v<full version>`
    RuntimeVersion,
    /// `ForScenario.<labels joined by '.'>`
    Scenario(Vec<String>),
}

impl QualifierKind {
    /// Scenario from any displayable labels
    #[must_use]
    pub fn scenario<I>(labels: I) -> Self
    where
        I: IntoIterator,
        I::Item: Display,
    {
        Self::Scenario(labels.into_iter().map(|l| l.to_string()).collect())
    }

    /// Short name used in diagnostics
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::MachineName => "machine name",
            Self::UserName => "user name",
            Self::OperatingSystem => "operating system",
            Self::FullOperatingSystem => "full operating system",
            Self::Runtime => "runtime",
            Self::RuntimeVersion => "runtime version",
            Self::Scenario(_) => "scenario",
        }
    }

    /// Compute the qualifier value
    ///
    /// `mode` only affects the OS and runtime kinds.
    ///
    /// # Errors
    /// - [`NamingError::UnsupportedEnvironment`] in strict mode when the OS or
    ///   runtime cannot be classified
    /// - [`NamingError::InvalidScenarioLabel`] for a scenario without labels
    pub fn evaluate(&self, mode: FailureMode) -> Result<String, NamingError> {
        match self {
            Self::MachineName => Ok(machine_name()),
            Self::UserName => Ok(user_name()),
            Self::OperatingSystem => os_name(mode),
            Self::FullOperatingSystem => full_os_name(mode),
            Self::Runtime => runtime(mode),
            Self::RuntimeVersion => Ok(runtime_version()),
            Self::Scenario(labels) => scenario(labels.as_slice()),
        }
    }
}

impl Display for QualifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Machine-name qualifier of this host
#[must_use]
pub fn machine_name() -> String {
    machine_qualifier(&environment::hostname())
}

/// `ForMachine.` + scrubbed host name
#[must_use]
pub fn machine_qualifier(host: &str) -> String {
    format!("{MACHINE_PREFIX}{}", scrub(host))
}

/// User-name qualifier of the current user
#[must_use]
pub fn user_name() -> String {
    user_qualifier(&environment::user_name())
}

/// `ForUser.` + scrubbed user name
#[must_use]
pub fn user_qualifier(user: &str) -> String {
    format!("{USER_PREFIX}{}", scrub(user))
}

/// OS qualifier with well-known Windows releases collapsed
///
/// # Errors
/// Returns [`NamingError::UnsupportedEnvironment`] in strict mode when the
/// host exposes no OS caption.
pub fn os_name(mode: FailureMode) -> Result<String, NamingError> {
    os_qualifier(environment::os_caption().as_deref(), mode, true)
}

/// OS qualifier without collapsing
///
/// # Errors
/// Same as [`os_name`].
pub fn full_os_name(mode: FailureMode) -> Result<String, NamingError> {
    os_qualifier(environment::os_caption().as_deref(), mode, false)
}

/// Normalize an OS caption: optional Windows collapsing, trim, spaces to `_`
///
/// Without a caption, strict mode fails and best effort returns the raw
/// platform name (`std::env::consts::OS`).
///
/// # Errors
/// Returns [`NamingError::UnsupportedEnvironment`] for a missing caption in
/// strict mode.
pub fn os_qualifier(
    caption: Option<&str>,
    mode: FailureMode,
    collapse: bool,
) -> Result<String, NamingError> {
    let Some(caption) = caption.map(str::trim).filter(|c| !c.is_empty()) else {
        return match mode {
            FailureMode::Strict => Err(NamingError::UnsupportedEnvironment {
                qualifier: "operating system",
                detected: format!("no OS caption available on `{}`", std::env::consts::OS),
            }),
            FailureMode::BestEffort => Ok(scrub(std::env::consts::OS)),
        };
    };
    let caption = if collapse {
        environment::transform_easy_os_name(caption)
    } else {
        caption.to_string()
    };
    Ok(scrub(&caption.trim().replace(' ', "_")))
}

/// Runtime qualifier of the toolchain that built this crate
///
/// # Errors
/// Returns [`NamingError::UnsupportedEnvironment`] in strict mode when the
/// toolchain is neither stable nor nightly.
pub fn runtime(mode: FailureMode) -> Result<String, NamingError> {
    runtime_qualifier(RUSTC_DESCRIPTION, mode)
}

/// Classify a `rustc --version` line into a runtime qualifier
///
/// # Errors
/// Returns [`NamingError::UnsupportedEnvironment`] in strict mode for
/// descriptions that are neither stable nor nightly.
pub fn runtime_qualifier(description: &str, mode: FailureMode) -> Result<String, NamingError> {
    match environment::classify_toolchain(description) {
        Toolchain::Stable { major, minor } => Ok(format!("Rust_{major}.{minor}")),
        Toolchain::Nightly { major, minor } => Ok(format!("RustNightly_{major}.{minor}")),
        Toolchain::Unclassified => match mode {
            FailureMode::Strict => Err(NamingError::UnsupportedEnvironment {
                qualifier: "runtime",
                detected: description.to_string(),
            }),
            FailureMode::BestEffort => Ok(scrub(description.trim())),
        },
    }
}

/// Full toolchain version qualifier, e.g. `Rustc_v1.80.1`
#[must_use]
pub fn runtime_version() -> String {
    runtime_version_qualifier(RUSTC_DESCRIPTION)
}

/// `Rustc_v` + version token, or the scrubbed description if unparseable
#[must_use]
pub fn runtime_version_qualifier(description: &str) -> String {
    match environment::toolchain_version(description) {
        Some(version) => format!("{RUNTIME_VERSION_PREFIX}{version}"),
        None => scrub(description.trim()),
    }
}

/// `ForScenario.` + scrubbed labels joined by `.`
///
/// # Errors
/// Returns [`NamingError::InvalidScenarioLabel`] for an empty label list.
pub fn scenario<S: AsRef<str>>(labels: &[S]) -> Result<String, NamingError> {
    if labels.is_empty() {
        return Err(NamingError::InvalidScenarioLabel);
    }
    let joined = labels
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(".");
    Ok(format!("{SCENARIO_PREFIX}{}", scrub(&joined)))
}

/// User-defined qualifier function
pub type QualifierFn = Arc<dyn Fn() -> Result<String, NamingError> + Send + Sync>;

static REGISTRY: Lazy<RwLock<HashMap<String, QualifierFn>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a custom qualifier, returning any function it replaces
///
/// Output of custom qualifiers is scrubbed in full; there is no trusted prefix.
pub fn register<F>(name: impl Into<String>, qualifier: F) -> Option<QualifierFn>
where
    F: Fn() -> Result<String, NamingError> + Send + Sync + 'static,
{
    let name = name.into();
    tracing::debug!(%name, "registered custom qualifier");
    REGISTRY.write().insert(name, Arc::new(qualifier))
}

/// Remove a custom qualifier
pub fn unregister(name: &str) -> bool {
    REGISTRY.write().remove(name).is_some()
}

/// Evaluate a custom qualifier
///
/// # Errors
/// - [`NamingError::UnknownQualifier`] if nothing is registered under `name`
/// - [`NamingError::EmptyQualifier`] if the function returned an empty value
/// - any error returned by the function itself
pub fn evaluate_registered(name: &str) -> Result<String, NamingError> {
    // Clone out of the lock so the function may itself use the registry.
    let qualifier = REGISTRY
        .read()
        .get(name)
        .cloned()
        .ok_or_else(|| NamingError::UnknownQualifier {
            name: name.to_string(),
        })?;
    let value = scrub(&qualifier()?);
    if value.is_empty() {
        return Err(NamingError::EmptyQualifier {
            kind: name.to_string(),
        });
    }
    Ok(value)
}
