//! Host seams — the non-deterministic primitives the runtime provides
//!
//! The oracle never calls a model directly. It builds a proposal thunk
//! around [`Generator::exec_prompt`] and hands it to a [`Reconciler`],
//! which may run the thunk on several independent validators and agree on
//! one output under a natural-language equivalence criterion. Only the
//! reconciled value reaches the normalizer and the ledger.
//!
//! Errors returned by either seam are transaction-fatal.

use crate::Result;

/// Non-deterministic text generation (a language-model call)
pub trait Generator {
    /// Run `prompt` and return the raw model text
    fn exec_prompt(&self, prompt: &str) -> Result<String>;
}

impl<F> Generator for F
where
    F: Fn(&str) -> Result<String>,
{
    fn exec_prompt(&self, prompt: &str) -> Result<String> {
        self(prompt)
    }
}

/// Comparative equivalence principle
pub trait Reconciler {
    /// Execute `propose` as the host's consensus requires and return the one
    /// output all validators accept as equivalent under `criterion`.
    ///
    /// `propose` has no side effects besides the model call and may be
    /// invoked any number of times.
    fn reconcile(&self, propose: &dyn Fn() -> Result<String>, criterion: &str) -> Result<String>;
}

impl<T: Reconciler + ?Sized> Reconciler for &T {
    fn reconcile(&self, propose: &dyn Fn() -> Result<String>, criterion: &str) -> Result<String> {
        (**self).reconcile(propose, criterion)
    }
}

/// Runs the proposal exactly once and accepts its output.
///
/// For single-node hosts and local tooling, where there is nothing to
/// reconcile against.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleExecution;

impl Reconciler for SingleExecution {
    fn reconcile(&self, propose: &dyn Fn() -> Result<String>, _criterion: &str) -> Result<String> {
        propose()
    }
}
