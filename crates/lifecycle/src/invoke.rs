//! Lifecycle invocation: call every hook of a chain, then join.
//!
//! Hooks are called in chain order without awaiting any of them in between,
//! so asynchronous setup declared at different levels may overlap. The
//! returned [`Completion`] drives every pending hook future concurrently and
//! resolves once all of them have finished.
//!
//! # Concurrency Model
//!
//! Nothing is spawned. A [`Completion`] is a plain future polled by whatever
//! executor the harness runs; pending hooks are first polled in chain order
//! on its first poll, before any failure can cut the join short. Dropping a
//! completion drops its pending hooks.

use std::any::type_name;
use std::future::Future;
use std::pin::Pin;
use std::task::{self, Poll};

use futures::FutureExt;
use futures::future::FusedFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use tracing::trace;

use crate::context::Specification;
use crate::error::{HookFailure, LifecycleError, ResolveError};
use crate::hook::{HookAction, HookFuture};
use crate::kind::LifecycleKind;
use crate::options::{FailureMode, InvokerOptions};
use crate::registry::{CHAINS, ChainRegistry};

type Pending<'a> = Pin<Box<dyn Future<Output = (&'static str, anyhow::Result<()>)> + Send + 'a>>;

/// Invokes lifecycle chains resolved through a [`ChainRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct Invoker<'r> {
	registry: &'r ChainRegistry,
	options: InvokerOptions,
}

impl Invoker<'static> {
	/// Invoker over the process-wide registry with default options.
	pub fn global() -> Self {
		Self::with_options(InvokerOptions::default())
	}

	/// Invoker over the process-wide registry.
	pub fn with_options(options: InvokerOptions) -> Self {
		Self::new(&CHAINS, options)
	}
}

impl<'r> Invoker<'r> {
	pub fn new(registry: &'r ChainRegistry, options: InvokerOptions) -> Self {
		Self { registry, options }
	}

	pub fn options(&self) -> &InvokerOptions {
		&self.options
	}

	pub fn registry(&self) -> &'r ChainRegistry {
		self.registry
	}

	/// Calls every `kind` hook of `unit`'s chain, root-most first.
	///
	/// Synchronous hook bodies have run by the time this returns. Asynchronous
	/// hooks are joined by the returned [`Completion`]. A chain that cannot be
	/// resolved is reported here, before anything is invoked.
	pub fn invoke<'a, U: Specification>(&self, kind: LifecycleKind, unit: &'a U) -> Result<Completion<'a>, ResolveError> {
		let chains = self.registry.chains::<U>()?;
		let chain = chains.get(kind);
		let mut completion = Completion::new(type_name::<U>(), kind, self.options.failure_mode);

		trace!(spec = completion.spec, kind = kind.as_str(), hooks = chain.len(), "lifecycle.invoke");

		for hook in chain {
			match hook.call(unit) {
				Ok(HookAction::Done) => {
					trace!(spec = completion.spec, context = hook.level(), "lifecycle.hook.done");
				}
				Ok(HookAction::Async(fut)) => {
					trace!(spec = completion.spec, context = hook.level(), "lifecycle.hook.started");
					completion.push(hook.level(), fut);
				}
				Err(error) => {
					completion.fail(hook.level(), error);
					if self.options.stop_on_sync_failure {
						break;
					}
				}
			}
		}

		Ok(completion)
	}

	pub fn establish<'a, U: Specification>(&self, unit: &'a U) -> Result<Completion<'a>, ResolveError> {
		self.invoke(LifecycleKind::Establish, unit)
	}

	pub fn because<'a, U: Specification>(&self, unit: &'a U) -> Result<Completion<'a>, ResolveError> {
		self.invoke(LifecycleKind::Because, unit)
	}

	pub fn destroy<'a, U: Specification>(&self, unit: &'a U) -> Result<Completion<'a>, ResolveError> {
		self.invoke(LifecycleKind::Destroy, unit)
	}
}

/// Joined completion of one chain invocation.
///
/// Resolves to `Ok(())` once every hook has finished, or to
/// [`LifecycleError::Hook`] when any hook failed. With no asynchronous hooks
/// it is ready on first poll.
///
/// The first poll starts every queued hook future in chain order before any
/// result is inspected, so [`FailureMode::FirstFailure`] never skips a hook
/// that was invoked. Polling again after the completion resolved panics; see
/// [`FusedFuture::is_terminated`].
#[must_use = "asynchronous hooks only run while the completion is awaited"]
pub struct Completion<'a> {
	spec: &'static str,
	kind: LifecycleKind,
	mode: FailureMode,
	/// Hook futures not yet polled, in chain order.
	queued: Vec<(&'static str, HookFuture<'a>)>,
	pending: FuturesUnordered<Pending<'a>>,
	failures: Vec<HookFailure>,
	terminated: bool,
}

impl<'a> Completion<'a> {
	fn new(spec: &'static str, kind: LifecycleKind, mode: FailureMode) -> Self {
		Self {
			spec,
			kind,
			mode,
			queued: Vec::new(),
			pending: FuturesUnordered::new(),
			failures: Vec::new(),
			terminated: false,
		}
	}

	fn push(&mut self, level: &'static str, fut: HookFuture<'a>) {
		self.queued.push((level, fut));
	}

	fn fail(&mut self, level: &'static str, error: anyhow::Error) {
		self.failures.push(HookFailure { kind: self.kind, level, error });
	}

	/// Polls every queued hook once, in chain order.
	fn start(&mut self, cx: &mut task::Context<'_>) {
		for (level, mut fut) in std::mem::take(&mut self.queued) {
			match fut.as_mut().poll(cx) {
				Poll::Ready(Ok(())) => {
					trace!(spec = self.spec, context = level, "lifecycle.hook.finished");
				}
				Poll::Ready(Err(error)) => self.fail(level, error),
				Poll::Pending => self.pending.push(Box::pin(fut.map(move |res| (level, res)))),
			}
		}
	}

	fn finish(&mut self, abandoned: usize) -> Result<(), LifecycleError> {
		self.terminated = true;
		trace!(
			spec = self.spec,
			kind = self.kind.as_str(),
			failures = self.failures.len(),
			abandoned,
			"lifecycle.complete"
		);
		let mut failures = std::mem::take(&mut self.failures).into_iter();
		match failures.next() {
			None => Ok(()),
			Some(first) => Err(LifecycleError::Hook {
				spec: self.spec,
				kind: self.kind,
				first,
				others: failures.collect(),
				abandoned,
			}),
		}
	}

	pub fn spec(&self) -> &'static str {
		self.spec
	}

	pub fn kind(&self) -> LifecycleKind {
		self.kind
	}

	/// Number of asynchronous hooks not yet finished.
	pub fn pending(&self) -> usize {
		self.queued.len() + self.pending.len()
	}

	/// Returns `true` if a hook has already failed.
	pub fn has_failed(&self) -> bool {
		!self.failures.is_empty()
	}
}

impl Future for Completion<'_> {
	type Output = Result<(), LifecycleError>;

	fn poll(self: Pin<&mut Self>, cx: &mut task::Context<'_>) -> Poll<Self::Output> {
		let this = self.get_mut();
		assert!(!this.terminated, "`Completion` polled after completion");
		if !this.queued.is_empty() {
			this.start(cx);
		}
		loop {
			if this.mode == FailureMode::FirstFailure && this.has_failed() {
				let abandoned = std::mem::take(&mut this.pending).len();
				return Poll::Ready(this.finish(abandoned));
			}
			match this.pending.poll_next_unpin(cx) {
				Poll::Ready(Some((level, Ok(())))) => {
					trace!(spec = this.spec, context = level, pending = this.pending.len(), "lifecycle.hook.finished");
				}
				Poll::Ready(Some((level, Err(error)))) => this.fail(level, error),
				Poll::Ready(None) => return Poll::Ready(this.finish(0)),
				Poll::Pending => return Poll::Pending,
			}
		}
	}
}

impl FusedFuture for Completion<'_> {
	fn is_terminated(&self) -> bool {
		self.terminated
	}
}

impl std::fmt::Debug for Completion<'_> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Completion")
			.field("spec", &self.spec)
			.field("kind", &self.kind)
			.field("pending", &self.pending())
			.field("failures", &self.failures.len())
			.finish()
	}
}
