//! Public naming entry points
//!
//! Collaborators use two calls: [`current_name`] to get the composed name at
//! this point of execution, and one of the `with_*`/`unique_for_*`/
//! `for_scenario*` functions to enter a scope that adds a qualifier.
//!
//! # Example
//! ```
//! use approval_naming::namer;
//!
//! let _base = namer::with_base_name("Render.header").unwrap();
//! {
//!     let _dark = namer::for_scenario("dark mode").unwrap();
//!     let _wide = namer::for_scenario_parts(["wide", "1080p"]).unwrap();
//!     assert_eq!(
//!         namer::current_name().unwrap(),
//!         "Render.header.ForScenario.dark mode.ForScenario.wide.1080p"
//!     );
//! }
//! assert_eq!(namer::current_name().unwrap(), "Render.header");
//! ```

use crate::compose::{compose_name, ComposedName};
use crate::config::{self, FailureMode};
use crate::error::NamingError;
use crate::qualifier::{self, QualifierKind};
use crate::resolver::resolve_base_identity;
use crate::scope::{self, ScopeGuard};
use std::fmt::Display;

/// Composed name at this point of execution
///
/// The base is the innermost base override, or else the test resolved from
/// the call stack.
///
/// # Errors
/// Returns [`NamingError::BaseIdentityUnavailable`] when no override is
/// active and the running test cannot be resolved.
pub fn current_name() -> Result<String, NamingError> {
    current_composed().map(|name| name.to_string())
}

/// Structured form of [`current_name`]
///
/// # Errors
/// Same as [`current_name`].
pub fn current_composed() -> Result<ComposedName, NamingError> {
    let base = match scope::base_override() {
        Some(base) => base,
        None => resolve_base_identity()?.to_string(),
    };
    Ok(ComposedName::new(base, scope::snapshot()))
}

/// Compose the active qualifiers onto an explicit base
#[must_use]
pub fn name_for(base: &str) -> String {
    compose_name(base, scope::snapshot().as_slice())
}

/// Evaluate a qualifier and push it
///
/// Strict qualifiers use the configured default [`FailureMode`]. Evaluation
/// happens before the stack is touched, so a failing qualifier is never
/// pushed.
///
/// # Errors
/// Any error from [`QualifierKind::evaluate`].
pub fn with_qualifier(kind: &QualifierKind) -> Result<ScopeGuard, NamingError> {
    with_qualifier_mode(kind, config::current().failure_mode)
}

/// [`with_qualifier`] with an explicit failure mode
///
/// # Errors
/// Any error from [`QualifierKind::evaluate`].
pub fn with_qualifier_mode(
    kind: &QualifierKind,
    mode: FailureMode,
) -> Result<ScopeGuard, NamingError> {
    let value = kind.evaluate(mode).map_err(|err| {
        tracing::debug!(%kind, ?mode, "qualifier evaluation failed: {}", err);
        err
    })?;
    scope::enter(&value)
}

/// Push a registered custom qualifier
///
/// # Errors
/// Any error from [`qualifier::evaluate_registered`].
pub fn with_registered(name: &str) -> Result<ScopeGuard, NamingError> {
    let value = qualifier::evaluate_registered(name)?;
    scope::enter(&value)
}

/// Use `name` as the base identity while the guard is alive
///
/// # Errors
/// Returns [`NamingError::EmptyQualifier`] for an empty name.
pub fn with_base_name(name: &str) -> Result<ScopeGuard, NamingError> {
    scope::enter_base(name)
}

/// `ForMachine.<hostname>`
///
/// # Errors
/// Never fails in practice; the signature matches the other entry points.
pub fn unique_for_machine_name() -> Result<ScopeGuard, NamingError> {
    with_qualifier(&QualifierKind::MachineName)
}

/// `ForUser.<username>`
///
/// # Errors
/// Never fails in practice; the signature matches the other entry points.
pub fn unique_for_user_name() -> Result<ScopeGuard, NamingError> {
    with_qualifier(&QualifierKind::UserName)
}

/// Normalized OS caption, with the configured failure mode
///
/// # Errors
/// [`NamingError::UnsupportedEnvironment`] in strict mode without an OS caption.
pub fn unique_for_os() -> Result<ScopeGuard, NamingError> {
    with_qualifier(&QualifierKind::OperatingSystem)
}

/// Normalized OS caption, with an explicit failure mode
///
/// # Errors
/// [`NamingError::UnsupportedEnvironment`] in strict mode without an OS caption.
pub fn unique_for_os_with(mode: FailureMode) -> Result<ScopeGuard, NamingError> {
    with_qualifier_mode(&QualifierKind::OperatingSystem, mode)
}

/// Toolchain family and version, with the configured failure mode
///
/// # Errors
/// [`NamingError::UnsupportedEnvironment`] in strict mode for toolchains that
/// are neither stable nor nightly.
pub fn unique_for_runtime() -> Result<ScopeGuard, NamingError> {
    with_qualifier(&QualifierKind::Runtime)
}

/// Toolchain family and version, with an explicit failure mode
///
/// # Errors
/// [`NamingError::UnsupportedEnvironment`] in strict mode for toolchains that
/// are neither stable nor nightly.
pub fn unique_for_runtime_with(mode: FailureMode) -> Result<ScopeGuard, NamingError> {
    with_qualifier_mode(&QualifierKind::Runtime, mode)
}

/// Full toolchain version, e.g. `Rustc_v1.80.1`
///
/// # Errors
/// Never fails in practice; the signature matches the other entry points.
pub fn unique_for_runtime_version() -> Result<ScopeGuard, NamingError> {
    with_qualifier(&QualifierKind::RuntimeVersion)
}

/// `ForScenario.<label>`, with invalid file-name characters replaced
///
/// # Errors
/// Never fails in practice; the signature matches the other entry points.
pub fn for_scenario(label: impl Display) -> Result<ScopeGuard, NamingError> {
    with_qualifier(&QualifierKind::scenario([label]))
}

/// `ForScenario.<a>.<b>...` from several values
///
/// # Errors
/// [`NamingError::InvalidScenarioLabel`] when `labels` is empty.
pub fn for_scenario_parts<I>(labels: I) -> Result<ScopeGuard, NamingError>
where
    I: IntoIterator,
    I::Item: Display,
{
    with_qualifier(&QualifierKind::scenario(labels))
}
