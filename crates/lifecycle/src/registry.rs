//! Process-wide cache of resolved method chains.
//!
//! Entries are keyed by the concrete specification's [`TypeId`] and live for
//! the rest of the process. Readers load an immutable snapshot; writers
//! publish a new snapshot with compare-and-swap, and a writer that loses the
//! race adopts the entry that won. A chain is only ever visible fully built.

use std::any::{Any, TypeId, type_name};
use std::sync::{Arc, LazyLock};

use arc_swap::ArcSwap;
use rustc_hash::FxHashMap as HashMap;
use tracing::trace;

use crate::chain::LifecycleChains;
use crate::context::Specification;
use crate::error::ResolveError;

type ErasedChains = Arc<dyn Any + Send + Sync>;

/// The registry used by [`Invoker::global`](crate::Invoker::global) and the
/// crate-level entry points.
pub static CHAINS: LazyLock<ChainRegistry> = LazyLock::new(ChainRegistry::new);

/// Cache of resolved chains, one entry per specification type.
pub struct ChainRegistry {
	snap: ArcSwap<HashMap<TypeId, ErasedChains>>,
}

impl Default for ChainRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ChainRegistry {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChainRegistry").field("len", &self.len()).finish()
	}
}

impl ChainRegistry {
	pub fn new() -> Self {
		Self {
			snap: ArcSwap::from_pointee(HashMap::default()),
		}
	}

	/// Returns the chains of `U`, resolving them on first use.
	///
	/// Resolution errors are returned as-is and leave the registry untouched.
	pub fn chains<U: Specification>(&self) -> Result<Arc<LifecycleChains<U>>, ResolveError> {
		let key = TypeId::of::<U>();
		if let Some(hit) = self.snap.load().get(&key).and_then(downcast::<U>) {
			return Ok(hit);
		}

		let resolved = Arc::new(LifecycleChains::<U>::resolve()?);

		loop {
			let cur = self.snap.load_full();
			if let Some(existing) = cur.get(&key).and_then(downcast::<U>) {
				trace!(spec = type_name::<U>(), "lifecycle.registry.adopt");
				return Ok(existing);
			}

			let mut next = (*cur).clone();
			next.insert(key, resolved.clone());

			let prev = self.snap.compare_and_swap(&cur, Arc::new(next));
			if Arc::ptr_eq(&prev, &cur) {
				trace!(spec = type_name::<U>(), entries = self.len(), "lifecycle.registry.insert");
				return Ok(resolved);
			}
		}
	}

	/// Returns `true` once `U` has been resolved into this registry.
	pub fn contains<U: Specification>(&self) -> bool {
		self.snap.load().contains_key(&TypeId::of::<U>())
	}

	pub fn len(&self) -> usize {
		self.snap.load().len()
	}

	pub fn is_empty(&self) -> bool {
		self.snap.load().is_empty()
	}
}

fn downcast<U: Specification>(entry: &ErasedChains) -> Option<Arc<LifecycleChains<U>>> {
	entry.clone().downcast::<LifecycleChains<U>>().ok()
}
