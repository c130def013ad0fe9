//! Context levels and the ancestor chain of a specification.
//!
//! A specification type is the most-derived level of its own chain. Each
//! level names its parent through [`Context::Parent`], and the chain ends at
//! [`Root`], which is never scanned for hooks. Base contexts are usually
//! generic over the unit type so several specifications can share them:
//!
//! ```ignore
//! struct WithDatabase;
//!
//! impl<U: HasDatabase> Context<U> for WithDatabase {
//! 	type Parent = Root;
//!
//! 	fn declare(hooks: &mut LevelHooks<U>) {
//! 		hooks.establish(|spec| {
//! 			spec.database().connect()?;
//! 			Ok(HookAction::done())
//! 		});
//! 	}
//! }
//! ```

use std::any::{TypeId, type_name};

use crate::error::ResolveError;
use crate::hook::HookHandler;
use crate::kind::LifecycleKind;

/// One level of a specification's context chain.
pub trait Context<U>: 'static {
	/// The next, more general level. [`Root`] ends the chain.
	type Parent: Context<U>;

	/// Declares the hooks defined directly on this level.
	///
	/// Called once per concrete specification type; the result is cached.
	fn declare(_hooks: &mut LevelHooks<U>) {}
}

/// Root marker at which chain walking stops.
#[derive(Debug, Clone, Copy, Default)]
pub struct Root;

impl<U> Context<U> for Root {
	type Parent = Root;
}

/// A concrete unit whose lifecycle can be driven.
///
/// Implemented for every type that is its own most-derived context level.
pub trait Specification: Context<Self> + Send + Sync + Sized + 'static {}

impl<T> Specification for T where T: Context<T> + Send + Sync + 'static {}

/// Hooks declared directly on one level.
pub struct LevelHooks<U> {
	level: &'static str,
	slots: [Option<HookHandler<U>>; LifecycleKind::COUNT],
	duplicate: Option<LifecycleKind>,
}

impl<U> LevelHooks<U> {
	pub(crate) fn new(level: &'static str) -> Self {
		Self {
			level,
			slots: [None; LifecycleKind::COUNT],
			duplicate: None,
		}
	}

	/// Name of the level being declared.
	pub fn level(&self) -> &'static str {
		self.level
	}

	pub fn establish(&mut self, handler: HookHandler<U>) -> &mut Self {
		self.set(LifecycleKind::Establish, handler)
	}

	pub fn because(&mut self, handler: HookHandler<U>) -> &mut Self {
		self.set(LifecycleKind::Because, handler)
	}

	pub fn destroy(&mut self, handler: HookHandler<U>) -> &mut Self {
		self.set(LifecycleKind::Destroy, handler)
	}

	/// Declares the hook for `kind`.
	///
	/// A level holds at most one hook per kind; a second declaration is
	/// reported when the level is resolved.
	pub fn set(&mut self, kind: LifecycleKind, handler: HookHandler<U>) -> &mut Self {
		let slot = &mut self.slots[kind.index()];
		if slot.is_some() && self.duplicate.is_none() {
			self.duplicate = Some(kind);
		}
		*slot = Some(handler);
		self
	}

	pub(crate) fn finish(self) -> Result<[Option<HookHandler<U>>; LifecycleKind::COUNT], ResolveError> {
		match self.duplicate {
			Some(kind) => Err(ResolveError::DuplicateHook { level: self.level, kind }),
			None => Ok(self.slots),
		}
	}
}

/// Type-erased handle on one context level, used to walk the chain.
pub(crate) struct Level<U> {
	pub(crate) id: TypeId,
	pub(crate) name: &'static str,
	pub(crate) declare: fn(&mut LevelHooks<U>),
	pub(crate) parent: fn() -> Level<U>,
}

impl<U: 'static> Level<U> {
	pub(crate) fn of<C: Context<U>>() -> Self {
		Self {
			id: TypeId::of::<C>(),
			name: type_name::<C>(),
			declare: <C as Context<U>>::declare,
			parent: Self::of::<<C as Context<U>>::Parent>,
		}
	}

	pub(crate) fn is_root(&self) -> bool {
		self.id == TypeId::of::<Root>()
	}
}
