//! Base identity resolution from the call stack
//!
//! Walks a captured backtrace from the innermost frame outward, skipping
//! frames that belong to this crate, the test utilities and the standard
//! library, and reports the first remaining frame as the running test.
//! The module path of that frame becomes the enclosing chain, so a test in
//! `outer::inner::case` resolves to `outer.inner.case`.
//!
//! This depends on the shape of the call stack: a helper function in the
//! test crate that calls into the namer is reported instead of the test
//! itself. Register such helpers with
//! [`NamingConfig::with_skip_prefix`](crate::config::NamingConfig::with_skip_prefix)
//! or bypass resolution entirely with a base override.

use crate::compose::SEPARATOR;
use crate::config::{self, NamingConfig};
use crate::error::NamingError;
use crate::sanitize::scrub;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt::{self, Display, Formatter};
use std::thread;

/// Path prefixes always skipped during resolution
pub const DEFAULT_SKIP_PREFIXES: &[&str] = &[
    env!("CARGO_CRATE_NAME"),
    "approval_naming_test_utils",
    "std",
    "core",
    "alloc",
    "test",
    "backtrace",
    "backtrace_rs",
];

static FRAME_INDEX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+:\s*").expect("frame regex"));

static HASH_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"::h[0-9a-f]{16}$").expect("hash regex"));

/// Enclosing chain and function name of the running test
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BaseIdentity {
    /// Enclosing modules or types, outermost first
    pub enclosing: Vec<String>,
    /// Test function name
    pub method: String,
}

impl BaseIdentity {
    /// Create from an enclosing chain and method name
    #[inline]
    #[must_use]
    pub fn new(enclosing: Vec<String>, method: impl Into<String>) -> Self {
        Self {
            enclosing,
            method: method.into(),
        }
    }

    /// Split a `::`-separated path; the last segment is the method
    ///
    /// Segments are scrubbed, since thread names are free-form text.
    #[must_use]
    pub fn from_path(path: &str) -> Option<Self> {
        let mut segments: Vec<String> = path
            .split("::")
            .filter(|s| !s.is_empty())
            .map(scrub)
            .collect();
        let method = segments.pop()?;
        Some(Self::new(segments, method))
    }
}

impl Display for BaseIdentity {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for segment in &self.enclosing {
            write!(f, "{segment}{SEPARATOR}")?;
        }
        f.write_str(&self.method)
    }
}

/// Resolve the running test from the current call stack
///
/// Falls back to the thread name (the test harness names each test thread
/// after the test path) when no frame qualifies, e.g. without debug symbols.
///
/// # Errors
/// Returns [`NamingError::BaseIdentityUnavailable`] if neither source
/// identifies a test.
pub fn resolve_base_identity() -> Result<BaseIdentity, NamingError> {
    let skip = skip_prefixes(&config::current());
    let backtrace = Backtrace::force_capture();
    if backtrace.status() == BacktraceStatus::Captured {
        if let Some(identity) = identity_from_backtrace(&backtrace.to_string(), &skip) {
            tracing::trace!(%identity, "resolved base identity from backtrace");
            return Ok(identity);
        }
    }

    let current = thread::current();
    if let Some(identity) = current
        .name()
        .filter(|name| *name != "main")
        .and_then(BaseIdentity::from_path)
    {
        tracing::debug!(%identity, "resolved base identity from thread name");
        return Ok(identity);
    }

    Err(NamingError::BaseIdentityUnavailable)
}

/// Default prefixes plus the configured extras
#[must_use]
pub fn skip_prefixes(config: &NamingConfig) -> Vec<String> {
    DEFAULT_SKIP_PREFIXES
        .iter()
        .map(|p| (*p).to_string())
        .chain(config.skip_prefixes.iter().cloned())
        .collect()
}

/// First user frame of a rendered backtrace, innermost first
#[must_use]
pub fn identity_from_backtrace(rendered: &str, skip: &[String]) -> Option<BaseIdentity> {
    rendered
        .lines()
        .filter_map(frame_symbol)
        .filter_map(normalize_symbol)
        .find(|path| !is_skipped(path, skip))
        .and_then(|path| BaseIdentity::from_path(&path))
}

/// Symbol text of one backtrace line, `None` for location lines
fn frame_symbol(line: &str) -> Option<&str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with("at ") {
        return None;
    }
    let symbol = match FRAME_INDEX_RE.find(line) {
        Some(m) => &line[m.end()..],
        None => line,
    };
    (!symbol.is_empty()).then_some(symbol)
}

/// Reduce a demangled symbol to a plain `a::b::c` path
///
/// Drops hash suffixes, closure segments and generic arguments, and turns
/// `<T as Trait>::method` into `T::method`. Returns `None` for symbols that
/// are not Rust paths (C runtime frames, `<unknown>`).
#[must_use]
pub fn normalize_symbol(symbol: &str) -> Option<String> {
    let symbol = HASH_SUFFIX_RE.replace(symbol.trim(), "");
    let symbol = unqualify(&symbol);
    let symbol = strip_generics(&symbol);
    let segments: Vec<&str> = symbol
        .split("::")
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.starts_with('{'))
        .collect();
    if segments.len() < 2 || !segments.iter().all(|s| is_identifier(s)) {
        return None;
    }
    Some(segments.join("::"))
}

fn is_skipped(path: &str, skip: &[String]) -> bool {
    skip.iter().any(|prefix| {
        path.strip_prefix(prefix.as_str())
            .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
    })
}

/// `<T as Trait>::m` -> `T::m`, `<impl Trait for T>::m` -> `T::m`
fn unqualify(symbol: &str) -> String {
    if !symbol.starts_with('<') {
        return symbol.to_string();
    }
    let Some(close) = matching_angle(symbol) else {
        return symbol.to_string();
    };
    let inner = &symbol[1..close];
    let rest = symbol[close + 1..].trim_start_matches("::");
    let (self_ty, trait_path) = if let Some(imp) = inner.strip_prefix("impl ") {
        split_top_level(imp, " for ", true).map_or((imp, None), |(tr, ty)| (ty, Some(tr)))
    } else {
        split_top_level(inner, " as ", false).map_or((inner, None), |(ty, tr)| (ty, Some(tr)))
    };
    // Generic parameters, fn pointers, references and the like name no
    // module; the trait path is the only usable location.
    let self_ty = match trait_path {
        Some(tr) if !is_plain_path(self_ty) => tr,
        _ => self_ty,
    };
    if rest.is_empty() {
        self_ty.to_string()
    } else {
        format!("{self_ty}::{rest}")
    }
}

/// Whether `ty` is a `a::b::C` path, generic arguments aside
fn is_plain_path(ty: &str) -> bool {
    let path = strip_generics(ty);
    path.contains("::") && path.split("::").all(is_identifier)
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

/// Split at the first (or last) `pat` outside any `<...>` group
fn split_top_level<'a>(text: &'a str, pat: &str, last: bool) -> Option<(&'a str, &'a str)> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut found = None;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' => depth = depth.saturating_sub(1),
            _ if depth == 0 && bytes[i..].starts_with(pat.as_bytes()) => {
                found = Some(i);
                if !last {
                    break;
                }
            }
            _ => {}
        }
    }
    found.map(|i| (&text[..i], &text[i + pat.len()..]))
}

/// Index of the `>` closing the `<` at position 0
fn matching_angle(symbol: &str) -> Option<usize> {
    let bytes = symbol.as_bytes();
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'<' => depth += 1,
            b'>' if i > 0 && bytes[i - 1] == b'-' => {}
            b'>' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Remove every `<...>` group, including a leading turbofish `::`
fn strip_generics(symbol: &str) -> String {
    let mut out = String::with_capacity(symbol.len());
    let mut depth = 0usize;
    let mut prev = '\0';
    for c in symbol.chars() {
        match c {
            '<' => {
                if depth == 0 && out.ends_with("::") {
                    out.truncate(out.len() - 2);
                }
                depth += 1;
            }
            '>' if prev == '-' => {}
            '>' => depth = depth.saturating_sub(1),
            _ if depth == 0 => out.push(c),
            _ => {}
        }
        prev = c;
    }
    out
}
