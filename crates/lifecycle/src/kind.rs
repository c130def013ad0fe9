use strum::{Display, EnumIter, IntoStaticStr};

/// The three lifecycle phases a specification goes through.
///
/// Variants are declared in the order a harness drives them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, IntoStaticStr)]
pub enum LifecycleKind {
	/// Setup of the context the behavior is observed in.
	Establish,
	/// The action under test.
	Because,
	/// Teardown.
	Destroy,
}

impl LifecycleKind {
	/// Number of lifecycle kinds.
	pub const COUNT: usize = 3;

	/// Dense index used for per-kind slot arrays.
	#[inline]
	pub const fn index(self) -> usize {
		match self {
			Self::Establish => 0,
			Self::Because => 1,
			Self::Destroy => 2,
		}
	}

	pub fn as_str(self) -> &'static str {
		self.into()
	}
}
