//! Lifecycle resolution and invocation for behavior specifications.
//!
//! A specification is a type that sits at the bottom of a chain of context
//! levels. Each level may declare an `Establish`, `Because`, and `Destroy`
//! hook; invoking a lifecycle kind calls the hooks of every level, most
//! general context first, and joins whatever asynchronous work they start.
//!
//! # Modules
//!
//! - [`context`] - Context levels, the root marker, and hook declaration
//! - [`chain`] - Walking a context chain into ordered method chains
//! - [`registry`] - Per-type cache of resolved chains
//! - [`invoke`] - Calling a chain and joining its completion
//!
//! # Example
//!
//! ```ignore
//! struct WhenPaying {
//! 	ledger: Ledger,
//! }
//!
//! impl Context<WhenPaying> for WhenPaying {
//! 	type Parent = WithAccount;
//!
//! 	fn declare(hooks: &mut LevelHooks<WhenPaying>) {
//! 		hooks.because(|spec| Ok(HookAction::future(spec.ledger.pay(10))));
//! 	}
//! }
//!
//! let spec = WhenPaying::new();
//! mspec_lifecycle::establish(&spec)?.await?;
//! mspec_lifecycle::because(&spec)?.await?;
//! mspec_lifecycle::destroy(&spec)?.await?;
//! ```

pub mod chain;
pub mod context;
pub mod error;
pub mod hook;
pub mod invoke;
mod kind;
pub mod options;
pub mod registry;

pub use chain::{ChainHook, LifecycleChains, MAX_CONTEXT_DEPTH, MethodChain, resolve_chain};
pub use context::{Context, LevelHooks, Root, Specification};
pub use error::{HookFailure, LifecycleError, ResolveError};
pub use hook::{HookAction, HookFuture, HookHandler, HookResult};
pub use invoke::{Completion, Invoker};
pub use kind::LifecycleKind;
pub use options::{FailureMode, InvokerOptions};
pub use registry::{CHAINS, ChainRegistry};

/// Runs `unit`'s `Establish` chain against the process-wide registry.
pub fn establish<U: Specification>(unit: &U) -> Result<Completion<'_>, ResolveError> {
	Invoker::global().establish(unit)
}

/// Runs `unit`'s `Because` chain against the process-wide registry.
pub fn because<U: Specification>(unit: &U) -> Result<Completion<'_>, ResolveError> {
	Invoker::global().because(unit)
}

/// Runs `unit`'s `Destroy` chain against the process-wide registry.
pub fn destroy<U: Specification>(unit: &U) -> Result<Completion<'_>, ResolveError> {
	Invoker::global().destroy(unit)
}
