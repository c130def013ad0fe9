//! Method chain resolution.
//!
//! Walks a specification's context chain from the concrete type up to
//! [`Root`](crate::Root), collecting the hooks each level declares directly.
//! Hooks found higher up the chain are placed earlier, so every chain runs
//! root-most ancestor first.

use std::any::type_name;

use rustc_hash::FxHashSet;
use strum::IntoEnumIterator;
use tracing::{debug, trace};

use crate::context::{Level, LevelHooks, Specification};
use crate::error::ResolveError;
use crate::hook::{HookHandler, HookResult};
use crate::kind::LifecycleKind;

/// Maximum number of levels walked before giving up on a chain.
pub const MAX_CONTEXT_DEPTH: usize = 64;

/// One hook in a chain, tagged with the level that declared it.
pub struct ChainHook<U> {
	level: &'static str,
	handler: HookHandler<U>,
}

impl<U> Clone for ChainHook<U> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<U> Copy for ChainHook<U> {}

impl<U> std::fmt::Debug for ChainHook<U> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ChainHook").field("level", &self.level).finish()
	}
}

impl<U> ChainHook<U> {
	pub fn level(&self) -> &'static str {
		self.level
	}

	/// Calls the hook against `unit`.
	#[inline]
	pub fn call<'a>(&self, unit: &'a U) -> HookResult<'a> {
		(self.handler)(unit)
	}
}

/// Ordered hooks of one lifecycle kind, root-most ancestor first.
pub struct MethodChain<U> {
	kind: LifecycleKind,
	hooks: Vec<ChainHook<U>>,
}

impl<U> std::fmt::Debug for MethodChain<U> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("MethodChain").field("kind", &self.kind).field("levels", &self.levels()).finish()
	}
}

impl<U> Clone for MethodChain<U> {
	fn clone(&self) -> Self {
		Self {
			kind: self.kind,
			hooks: self.hooks.clone(),
		}
	}
}

impl<U> MethodChain<U> {
	fn new(kind: LifecycleKind) -> Self {
		Self { kind, hooks: Vec::new() }
	}

	pub fn kind(&self) -> LifecycleKind {
		self.kind
	}

	pub fn len(&self) -> usize {
		self.hooks.len()
	}

	pub fn is_empty(&self) -> bool {
		self.hooks.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, ChainHook<U>> {
		self.hooks.iter()
	}

	/// Names of the declaring levels, in invocation order.
	pub fn levels(&self) -> Vec<&'static str> {
		self.hooks.iter().map(ChainHook::level).collect()
	}
}

impl<'c, U> IntoIterator for &'c MethodChain<U> {
	type Item = &'c ChainHook<U>;
	type IntoIter = std::slice::Iter<'c, ChainHook<U>>;

	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

/// The three method chains of one specification type.
pub struct LifecycleChains<U> {
	establish: MethodChain<U>,
	because: MethodChain<U>,
	destroy: MethodChain<U>,
}

impl<U> std::fmt::Debug for LifecycleChains<U> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("LifecycleChains")
			.field("establish", &self.establish)
			.field("because", &self.because)
			.field("destroy", &self.destroy)
			.finish()
	}
}

impl<U: Specification> LifecycleChains<U> {
	/// Walks `U`'s context chain once and builds all three chains.
	pub fn resolve() -> Result<Self, ResolveError> {
		let spec = type_name::<U>();
		let mut chains = Self {
			establish: MethodChain::new(LifecycleKind::Establish),
			because: MethodChain::new(LifecycleKind::Because),
			destroy: MethodChain::new(LifecycleKind::Destroy),
		};
		let mut seen = FxHashSet::default();
		let mut current = Level::of::<U>();

		while !current.is_root() {
			if !seen.insert(current.id) {
				return Err(ResolveError::Cycle { spec, level: current.name });
			}
			if seen.len() > MAX_CONTEXT_DEPTH {
				return Err(ResolveError::TooDeep { spec, limit: MAX_CONTEXT_DEPTH });
			}

			let mut hooks = LevelHooks::new(current.name);
			(current.declare)(&mut hooks);
			let slots = hooks.finish()?;

			for kind in LifecycleKind::iter() {
				if let Some(handler) = slots[kind.index()] {
					chains.get_mut(kind).hooks.push(ChainHook { level: current.name, handler });
				}
			}
			trace!(
				spec,
				context = current.name,
				establish = slots[0].is_some(),
				because = slots[1].is_some(),
				destroy = slots[2].is_some(),
				"lifecycle.resolve.level"
			);

			current = (current.parent)();
		}

		// Collected concrete-first; invocation order is root-most first.
		for kind in LifecycleKind::iter() {
			chains.get_mut(kind).hooks.reverse();
		}

		debug!(
			spec,
			levels = seen.len(),
			establish = chains.establish.len(),
			because = chains.because.len(),
			destroy = chains.destroy.len(),
			"lifecycle.resolve"
		);
		Ok(chains)
	}
}

impl<U> LifecycleChains<U> {
	pub fn get(&self, kind: LifecycleKind) -> &MethodChain<U> {
		match kind {
			LifecycleKind::Establish => &self.establish,
			LifecycleKind::Because => &self.because,
			LifecycleKind::Destroy => &self.destroy,
		}
	}

	fn get_mut(&mut self, kind: LifecycleKind) -> &mut MethodChain<U> {
		match kind {
			LifecycleKind::Establish => &mut self.establish,
			LifecycleKind::Because => &mut self.because,
			LifecycleKind::Destroy => &mut self.destroy,
		}
	}

	fn into_chain(self, kind: LifecycleKind) -> MethodChain<U> {
		match kind {
			LifecycleKind::Establish => self.establish,
			LifecycleKind::Because => self.because,
			LifecycleKind::Destroy => self.destroy,
		}
	}
}

/// Resolves the chain of one lifecycle kind for `U`, bypassing the cache.
pub fn resolve_chain<U: Specification>(kind: LifecycleKind) -> Result<MethodChain<U>, ResolveError> {
	LifecycleChains::<U>::resolve().map(|chains| chains.into_chain(kind))
}

#[cfg(test)]
mod tests {
	use std::any::type_name;
	use std::marker::PhantomData;

	use super::*;
	use crate::context::{Context, Root};
	use crate::hook::HookAction;

	fn noop<U>(_: &U) -> HookResult<'_> {
		Ok(HookAction::done())
	}

	struct Grandparent;
	struct Parent;
	struct Child;

	impl Context<Child> for Grandparent {
		type Parent = Root;

		fn declare(hooks: &mut LevelHooks<Child>) {
			hooks.establish(noop).destroy(noop);
		}
	}

	impl Context<Child> for Parent {
		type Parent = Grandparent;

		fn declare(hooks: &mut LevelHooks<Child>) {
			hooks.establish(noop).because(noop);
		}
	}

	impl Context<Child> for Child {
		type Parent = Parent;

		fn declare(hooks: &mut LevelHooks<Child>) {
			hooks.establish(noop);
		}
	}

	struct Bare;

	impl Context<Bare> for Bare {
		type Parent = Root;
	}

	#[test]
	fn chain_without_declarations_is_empty() {
		for kind in LifecycleKind::iter() {
			let chain = resolve_chain::<Bare>(kind).unwrap();
			assert!(chain.is_empty());
			assert_eq!(chain.kind(), kind);
		}
	}

	#[test]
	fn three_level_chain_is_root_most_first() {
		let chain = resolve_chain::<Child>(LifecycleKind::Establish).unwrap();
		assert_eq!(chain.len(), 3);
		assert_eq!(chain.levels(), [type_name::<Grandparent>(), type_name::<Parent>(), type_name::<Child>()]);
	}

	#[test]
	fn levels_only_contribute_their_own_declarations() {
		let chains = LifecycleChains::<Child>::resolve().unwrap();
		assert_eq!(chains.get(LifecycleKind::Because).levels(), [type_name::<Parent>()]);
		assert_eq!(chains.get(LifecycleKind::Destroy).levels(), [type_name::<Grandparent>()]);
	}

	#[test]
	fn root_resolves_to_empty_chains() {
		let chains = LifecycleChains::<Root>::resolve().unwrap();
		for kind in LifecycleKind::iter() {
			assert!(chains.get(kind).is_empty());
		}
	}

	struct Ping;
	struct Pong;

	impl Context<Ping> for Pong {
		type Parent = Ping;
	}

	impl Context<Ping> for Ping {
		type Parent = Pong;
	}

	#[test]
	fn cyclic_chain_is_rejected() {
		let err = LifecycleChains::<Ping>::resolve().unwrap_err();
		assert_eq!(
			err,
			ResolveError::Cycle {
				spec: type_name::<Ping>(),
				level: type_name::<Ping>(),
			}
		);
	}

	struct Twice;

	impl Context<Twice> for Twice {
		type Parent = Root;

		fn declare(hooks: &mut LevelHooks<Twice>) {
			hooks.destroy(noop).destroy(noop);
		}
	}

	#[test]
	fn duplicate_declaration_fails_resolution() {
		let err = resolve_chain::<Twice>(LifecycleKind::Establish).unwrap_err();
		assert_eq!(
			err,
			ResolveError::DuplicateHook {
				level: type_name::<Twice>(),
				kind: LifecycleKind::Destroy,
			}
		);
	}

	/// Hookless level stacked on top of `T`.
	struct Up<T>(PhantomData<fn() -> T>);

	impl<U, T: Context<U>> Context<U> for Up<T> {
		type Parent = T;
	}

	type X2<T> = Up<Up<T>>;
	type X4<T> = X2<X2<T>>;
	type X8<T> = X4<X4<T>>;
	type X16<T> = X8<X8<T>>;
	type X32<T> = X16<X16<T>>;
	type X64<T> = X32<X32<T>>;

	/// 63 ancestors below the root, 64 levels counting itself.
	struct AtLimit;

	impl Context<AtLimit> for AtLimit {
		type Parent = X32<X16<X8<X4<X2<Up<Root>>>>>>;

		fn declare(hooks: &mut LevelHooks<AtLimit>) {
			hooks.establish(noop);
		}
	}

	/// 65 levels counting itself.
	struct PastLimit;

	impl Context<PastLimit> for PastLimit {
		type Parent = X64<Root>;
	}

	#[test]
	fn chain_at_depth_limit_resolves() {
		let chain = resolve_chain::<AtLimit>(LifecycleKind::Establish).unwrap();
		assert_eq!(chain.levels(), [type_name::<AtLimit>()]);
	}

	#[test]
	fn chain_past_depth_limit_is_rejected() {
		let expected = ResolveError::TooDeep {
			spec: type_name::<PastLimit>(),
			limit: MAX_CONTEXT_DEPTH,
		};
		assert_eq!(LifecycleChains::<PastLimit>::resolve().unwrap_err(), expected);

		let registry = crate::registry::ChainRegistry::new();
		assert_eq!(registry.chains::<PastLimit>().unwrap_err(), expected);
		assert!(!registry.contains::<PastLimit>());
		assert!(registry.is_empty());
	}
}
