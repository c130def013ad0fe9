//! Hook handler types: HookAction, HookFuture, HookHandler.

use std::future::Future;
use std::pin::Pin;

/// A pinned, boxed hook future borrowing the unit for `'a`.
pub type HookFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send + 'a>>;

/// What a hook returns when called: either finished, or still running.
pub enum HookAction<'a> {
	/// The hook completed synchronously.
	Done,
	/// The hook started asynchronous work that must be awaited.
	Async(HookFuture<'a>),
}

impl<'a> HookAction<'a> {
	pub fn done() -> Self {
		HookAction::Done
	}

	/// Wraps a future as asynchronous hook work.
	pub fn future<F>(fut: F) -> Self
	where
		F: Future<Output = anyhow::Result<()>> + Send + 'a,
	{
		HookAction::Async(Box::pin(fut))
	}

	pub fn is_async(&self) -> bool {
		matches!(self, HookAction::Async(_))
	}
}

impl From<()> for HookAction<'_> {
	fn from(_: ()) -> Self {
		HookAction::Done
	}
}

impl std::fmt::Debug for HookAction<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			HookAction::Done => f.write_str("Done"),
			HookAction::Async(_) => f.write_str("Async(..)"),
		}
	}
}

/// Result of calling a hook. `Err` is a synchronous failure.
pub type HookResult<'a> = anyhow::Result<HookAction<'a>>;

/// A lifecycle hook declared by one context level.
pub type HookHandler<U> = for<'a> fn(&'a U) -> HookResult<'a>;
