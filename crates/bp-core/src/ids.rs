use core::fmt;
use core::num::NonZeroU8;

/// Compact identifier for a reactor stage in the treatment train.
///
/// - stored 1-based so that `R1` is the first stage, as operators name them
/// - `NonZero` enables `Option<ReactorId>` to stay one byte
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ReactorId(NonZeroU8);

impl ReactorId {
    /// Create an id from a 0-based stage index by storing index+1.
    ///
    /// Returns `None` for indices that do not fit (255 and above).
    pub fn from_index(index: usize) -> Option<Self> {
        let stored = u8::try_from(index).ok()?.checked_add(1)?;
        NonZeroU8::new(stored).map(Self)
    }

    /// Recover the 0-based index.
    pub fn index(self) -> usize {
        usize::from(self.0.get() - 1)
    }

    /// 1-based stage number.
    pub fn stage(self) -> u8 {
        self.0.get()
    }
}

impl fmt::Debug for ReactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ReactorId(R{})", self.stage())
    }
}

impl fmt::Display for ReactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.stage())
    }
}
