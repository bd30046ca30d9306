//! Testing utilities for approval-naming
//!
//! Shared test helpers: naming-context leak checks, isolated execution
//! contexts and tracing setup.

#![allow(missing_docs)]

use approval_naming::scope;
use std::panic;
use std::sync::{Arc, OnceLock};
use std::thread;

/// Install a test-friendly tracing subscriber once per process
///
/// Honors `RUST_LOG`; defaults to `warn`.
pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    static INITIALISED: OnceLock<()> = OnceLock::new();

    INITIALISED.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
        let _ = fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_names(true)
            .try_init();
    });
}

/// Asserts the naming context is empty when created and when dropped
///
/// A leak is drained before panicking so later tests on a reused thread
/// start clean. While unwinding from another panic the stack is drained
/// without a second panic.
#[derive(Debug)]
pub struct ContextCheck {
    _private: (),
}

impl ContextCheck {
    pub fn new() -> Self {
        if let Err(err) = scope::ensure_balanced() {
            scope::drain();
            panic!("naming context not empty at test start: {err}");
        }
        Self { _private: () }
    }
}

impl Default for ContextCheck {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ContextCheck {
    fn drop(&mut self) {
        if thread::panicking() {
            scope::drain();
            return;
        }
        if let Err(err) = scope::ensure_balanced() {
            scope::drain();
            panic!("naming scopes leaked: {err}");
        }
    }
}

/// Run `f` on a fresh named thread with a leak check, propagating panics
pub fn run_isolated<F, R>(name: &str, f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let handle = thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            let _check = ContextCheck::new();
            f()
        })
        .expect("spawn isolated test thread");

    match handle.join() {
        Ok(result) => result,
        Err(payload) => panic::resume_unwind(payload),
    }
}

/// Run `f(index)` on `count` threads at once and collect results in index order
pub fn run_in_parallel<F, R>(count: usize, f: F) -> Vec<R>
where
    F: Fn(usize) -> R + Send + Sync + 'static,
    R: Send + 'static,
{
    let f = Arc::new(f);
    let barrier = Arc::new(std::sync::Barrier::new(count));
    let handles: Vec<_> = (0..count)
        .map(|index| {
            let f = Arc::clone(&f);
            let barrier = Arc::clone(&barrier);
            thread::Builder::new()
                .name(format!("parallel-{index}"))
                .spawn(move || {
                    let _check = ContextCheck::new();
                    barrier.wait();
                    f(index)
                })
                .expect("spawn parallel test thread")
        })
        .collect();

    handles
        .into_iter()
        .map(|handle| match handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        })
        .collect()
}
