use core::fmt::{self, Display, Formatter};

/// Lifecycle of one cached component.
///
/// Transitions go `Uninitialized → Constructing → Ready → Destroyed`,
/// with `Constructing → Uninitialized` when construction fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LifecycleState {
    #[default]
    Uninitialized = 0,
    Constructing = 1,
    Ready = 2,
    Destroyed = 3,
}

impl LifecycleState {
    #[inline]
    #[must_use]
    pub(crate) const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Uninitialized,
            1 => Self::Constructing,
            2 => Self::Ready,
            _ => Self::Destroyed,
        }
    }

    #[inline]
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Constructing => "CONSTRUCTING",
            Self::Ready => "READY",
            Self::Destroyed => "DESTROYED",
        }
    }
}

impl Display for LifecycleState {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
