//! Approval Naming
//!
//! Scoped environment qualifiers and call-stack based names for
//! approval-style snapshot tests.
//!
//! # Overview
//!
//! The naming context provides:
//! - **Scope stack**: thread-local, nestable qualifiers released by RAII guards
//! - **Qualifiers**: machine, user, OS, toolchain and free-form scenario tags
//! - **Base identity**: the running test, resolved from the call stack
//! - **Sanitization**: every qualifier is safe to use in a file name
//!
//! # Example
//!
//! ```rust
//! use approval_naming::prelude::*;
//!
//! fn render_header() -> Result<(), NamingError> {
//!     let _base = namer::with_base_name("Render.header")?;
//!     let _scenario = namer::for_scenario("invalid/chars")?;
//!     assert_eq!(
//!         namer::current_name()?,
//!         "Render.header.ForScenario.invalid_chars"
//!     );
//!     Ok(())
//! }
//! # render_header().unwrap();
//! ```

#![warn(missing_docs)]

pub mod compose;
pub mod config;
pub mod environment;
pub mod error;
pub mod namer;
pub mod qualifier;
pub mod resolver;
pub mod sanitize;
pub mod scope;

// Re-exports
pub use compose::{compose_name, ComposedName};
pub use config::{FailureMode, NamingConfig};
pub use error::{NamingError, ScopeMisuseError};
pub use namer::{current_name, with_base_name, with_qualifier};
pub use qualifier::QualifierKind;
pub use resolver::{resolve_base_identity, BaseIdentity};
pub use sanitize::scrub;
pub use scope::{EntryKind, QualifierEntry, ScopeGuard, ScopeId};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for naming scopes
    pub use crate::namer;
    pub use crate::{
        BaseIdentity, ComposedName, FailureMode, NamingError, QualifierKind, ScopeGuard,
        ScopeMisuseError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
