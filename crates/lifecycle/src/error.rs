//! Error types for chain resolution and hook invocation.

use thiserror::Error;

use crate::kind::LifecycleKind;

/// A specification's context chain could not be resolved.
///
/// Returned synchronously by the registry and the invoker entry points.
/// Never cached; the next lookup resolves again.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
	/// A level declared the same lifecycle kind more than once.
	#[error("context `{level}` declares more than one {kind} hook")]
	DuplicateHook {
		/// The offending level.
		level: &'static str,
		/// The kind declared twice.
		kind: LifecycleKind,
	},
	/// The walk came back to a level it already scanned.
	#[error("context chain of `{spec}` revisits `{level}` before reaching the root")]
	Cycle {
		/// The specification being resolved.
		spec: &'static str,
		/// The level seen twice.
		level: &'static str,
	},
	/// The chain did not reach the root within the depth limit.
	#[error("context chain of `{spec}` exceeds {limit} levels")]
	TooDeep { spec: &'static str, limit: usize },
}

/// One hook that failed, synchronously or asynchronously.
#[derive(Error, Debug)]
#[error("{kind} hook of `{level}` failed")]
pub struct HookFailure {
	pub kind: LifecycleKind,
	/// Level that declared the hook.
	pub level: &'static str,
	#[source]
	pub error: anyhow::Error,
}

/// Failure of a lifecycle chain.
#[derive(Error, Debug)]
pub enum LifecycleError {
	#[error(transparent)]
	Resolve(#[from] ResolveError),
	/// At least one hook in the chain failed.
	///
	/// `first` is the first failure observed; `others` holds every later one.
	#[error("{kind} of `{spec}` failed ({} hook failure(s))", 1 + .others.len())]
	Hook {
		spec: &'static str,
		kind: LifecycleKind,
		#[source]
		first: HookFailure,
		others: Vec<HookFailure>,
		/// Started hooks dropped unfinished under [`FailureMode::FirstFailure`].
		///
		/// [`FailureMode::FirstFailure`]: crate::options::FailureMode::FirstFailure
		abandoned: usize,
	},
}

impl LifecycleError {
	/// Iterates every hook failure, first observed first.
	pub fn failures(&self) -> impl Iterator<Item = &HookFailure> {
		let (first, others) = match self {
			LifecycleError::Resolve(_) => (None, &[][..]),
			LifecycleError::Hook { first, others, .. } => (Some(first), others.as_slice()),
		};
		first.into_iter().chain(others)
	}

	/// The first hook failure, if any.
	pub fn first_failure(&self) -> Option<&HookFailure> {
		self.failures().next()
	}

	/// Number of started hooks that were dropped before they finished.
	pub fn abandoned(&self) -> usize {
		match self {
			LifecycleError::Resolve(_) => 0,
			LifecycleError::Hook { abandoned, .. } => *abandoned,
		}
	}
}
