//! Invoker configuration.

use serde::{Deserialize, Serialize};

/// How a chain's completion reacts to hook failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
	/// Drive every started hook to completion, then report all failures.
	#[default]
	DrainAll,
	/// Resolve with the first failure as soon as it is observed, dropping
	/// hooks that are still pending.
	FirstFailure,
}

/// Options for an [`Invoker`](crate::Invoker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct InvokerOptions {
	pub failure_mode: FailureMode,
	/// Stop invoking the rest of a chain once a hook fails synchronously.
	pub stop_on_sync_failure: bool,
}

impl Default for InvokerOptions {
	fn default() -> Self {
		Self {
			failure_mode: FailureMode::default(),
			stop_on_sync_failure: true,
		}
	}
}

impl InvokerOptions {
	pub fn failure_mode(mut self, mode: FailureMode) -> Self {
		self.failure_mode = mode;
		self
	}

	pub fn stop_on_sync_failure(mut self, stop: bool) -> Self {
		self.stop_on_sync_failure = stop;
		self
	}
}
