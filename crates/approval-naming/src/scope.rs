//! Thread-local qualifier stack
//!
//! Every thread owns one [`ScopeStack`]. Entries are pushed by [`enter`] and
//! removed when the returned [`ScopeGuard`] is dropped or explicitly exited.
//! Release is by identity, so exiting scopes out of order keeps the remaining
//! entries in entry order. Nothing here is shared between threads, which is
//! what lets tests run in parallel without locking.

use crate::error::{NamingError, ScopeMisuseError};
use crate::sanitize::scrub;
use std::cell::RefCell;
use std::fmt::{self, Display, Formatter};
use std::marker::PhantomData;
use std::thread::{self, ThreadId};

thread_local! {
    static STACK: RefCell<ScopeStack> = RefCell::new(ScopeStack::new());
}

/// Opaque token tying a stack entry to the guard that releases it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId {
    thread: ThreadId,
    seq: u64,
}

impl ScopeId {
    /// Thread whose stack holds the entry
    #[inline]
    #[must_use]
    pub fn thread(&self) -> ThreadId {
        self.thread
    }
}

impl Display for ScopeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{:?}", self.seq, self.thread)
    }
}

/// What an entry contributes to the composed name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Appended after the base, in entry order
    Qualifier,
    /// Replaces the resolved base identity while active
    BaseOverride,
}

/// One pushed qualifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifierEntry {
    value: String,
    scope_id: ScopeId,
    kind: EntryKind,
}

impl QualifierEntry {
    /// Sanitized, non-empty value
    #[inline]
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Owning scope
    #[inline]
    #[must_use]
    pub fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    /// Entry kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> EntryKind {
        self.kind
    }
}

/// Ordered qualifier entries of one thread
#[derive(Debug)]
struct ScopeStack {
    owner: ThreadId,
    entries: Vec<QualifierEntry>,
    next_seq: u64,
}

impl ScopeStack {
    fn new() -> Self {
        Self {
            owner: thread::current().id(),
            entries: Vec::new(),
            next_seq: 0,
        }
    }

    fn push(&mut self, value: String, kind: EntryKind) -> ScopeId {
        let scope_id = ScopeId {
            thread: self.owner,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.entries.push(QualifierEntry {
            value,
            scope_id,
            kind,
        });
        scope_id
    }

    /// Remove by identity; returns the entry and whether it was the top
    fn remove(&mut self, id: ScopeId) -> Result<(QualifierEntry, bool), ScopeMisuseError> {
        if id.thread != self.owner {
            return Err(ScopeMisuseError::ForeignContext { scope: id });
        }
        match self.entries.iter().rposition(|e| e.scope_id == id) {
            Some(pos) => {
                let was_top = pos + 1 == self.entries.len();
                Ok((self.entries.remove(pos), was_top))
            }
            None if id.seq < self.next_seq => Err(ScopeMisuseError::AlreadyReleased { scope: id }),
            None => Err(ScopeMisuseError::UnknownScope { scope: id }),
        }
    }
}

/// Handle releasing one stack entry
///
/// Dropping the guard releases the entry, including while unwinding from a
/// panic, so a failing test never leaks its qualifiers into the next test on
/// the same thread. The guard is `!Send`: it can only be released on the
/// thread whose stack holds the entry.
///
/// # Panics
/// Dropping a guard whose entry was already released through [`exit`] panics,
/// unless the thread is already panicking, in which case the misuse is logged.
#[derive(Debug)]
#[must_use = "dropping the guard immediately releases the qualifier"]
pub struct ScopeGuard {
    id: ScopeId,
    released: bool,
    _not_send: PhantomData<*const ()>,
}

impl ScopeGuard {
    fn new(id: ScopeId) -> Self {
        Self {
            id,
            released: false,
            _not_send: PhantomData,
        }
    }

    /// Scope token of this guard
    #[inline]
    #[must_use]
    pub fn id(&self) -> ScopeId {
        self.id
    }

    /// Release the entry now
    ///
    /// # Errors
    /// Returns [`ScopeMisuseError::AlreadyReleased`] if the entry was already
    /// released through [`exit`].
    pub fn exit(mut self) -> Result<(), ScopeMisuseError> {
        self.released = true;
        exit(self.id)
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(err) = exit(self.id) {
            if thread::panicking() {
                tracing::error!(scope = %self.id, "scope release failed while unwinding: {}", err);
            } else {
                panic!("{err}");
            }
        }
    }
}

/// Push a qualifier onto this thread's stack
///
/// The value is scrubbed before it is pushed.
///
/// # Errors
/// Returns [`NamingError::EmptyQualifier`] for an empty value.
pub fn enter(value: &str) -> Result<ScopeGuard, NamingError> {
    push(value, EntryKind::Qualifier)
}

/// Replace the resolved base identity while the guard is alive
///
/// The innermost active override wins.
///
/// # Errors
/// Returns [`NamingError::EmptyQualifier`] for an empty name.
pub fn enter_base(name: &str) -> Result<ScopeGuard, NamingError> {
    push(name, EntryKind::BaseOverride)
}

fn push(value: &str, kind: EntryKind) -> Result<ScopeGuard, NamingError> {
    if value.is_empty() {
        return Err(NamingError::EmptyQualifier {
            kind: format!("{kind:?}"),
        });
    }
    let value = scrub(value);
    let id = STACK.with(|stack| stack.borrow_mut().push(value.clone(), kind));
    tracing::debug!(scope = %id, ?kind, value = %value, "entered naming scope");
    Ok(ScopeGuard::new(id))
}

/// Release an entry by scope token
///
/// # Errors
/// - [`ScopeMisuseError::AlreadyReleased`] if the entry is gone
/// - [`ScopeMisuseError::ForeignContext`] if the token belongs to another thread
/// - [`ScopeMisuseError::UnknownScope`] if the token was never issued here
pub fn exit(id: ScopeId) -> Result<(), ScopeMisuseError> {
    // The stack may already be torn down during thread exit; nothing can leak then.
    let Ok(result) = STACK.try_with(|stack| stack.borrow_mut().remove(id)) else {
        return Ok(());
    };
    let (entry, was_top) = result?;
    if was_top {
        tracing::debug!(scope = %id, value = %entry.value, "exited naming scope");
    } else {
        tracing::warn!(scope = %id, value = %entry.value, "naming scope exited out of order");
    }
    Ok(())
}

/// Number of active entries on this thread
#[must_use]
pub fn depth() -> usize {
    STACK.with(|stack| stack.borrow().entries.len())
}

/// Active qualifier values, oldest first
#[must_use]
pub fn snapshot() -> Vec<String> {
    STACK.with(|stack| {
        stack
            .borrow()
            .entries
            .iter()
            .filter(|e| e.kind == EntryKind::Qualifier)
            .map(|e| e.value.clone())
            .collect()
    })
}

/// Innermost active base override
#[must_use]
pub fn base_override() -> Option<String> {
    STACK.with(|stack| {
        stack
            .borrow()
            .entries
            .iter()
            .rev()
            .find(|e| e.kind == EntryKind::BaseOverride)
            .map(|e| e.value.clone())
    })
}

/// Check that no entries are active on this thread
///
/// # Errors
/// Returns [`ScopeMisuseError::Leaked`] listing the remaining values.
pub fn ensure_balanced() -> Result<(), ScopeMisuseError> {
    let remaining: Vec<String> = STACK.with(|stack| {
        stack
            .borrow()
            .entries
            .iter()
            .map(|e| e.value.clone())
            .collect()
    });
    if remaining.is_empty() {
        Ok(())
    } else {
        Err(ScopeMisuseError::Leaked { remaining })
    }
}

/// Remove every entry on this thread
///
/// For harness cleanup after a leak was reported; guards of drained entries
/// report [`ScopeMisuseError::AlreadyReleased`] when released.
pub fn drain() -> Vec<QualifierEntry> {
    let drained = STACK.with(|stack| std::mem::take(&mut stack.borrow_mut().entries));
    if !drained.is_empty() {
        tracing::warn!(count = drained.len(), "drained leaked naming scopes");
    }
    drained
}
