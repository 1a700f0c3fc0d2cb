use std::fmt;

/// Priority handed to the first watcher of a pool.
pub const PRIORITY_BASE: u32 = 1;

/// Ordinal identifying one watcher inside a pool.
///
/// Assigned once by the filter factory and never changed afterwards. The
/// value doubles as the partition bucket (via [`WatcherPriority::index`]) and
/// as the suffix of the processed-file destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WatcherPriority(u32);

impl WatcherPriority {
    /// Returns `None` for values below [`PRIORITY_BASE`].
    pub const fn new(value: u32) -> Option<Self> {
        if value < PRIORITY_BASE {
            None
        } else {
            Some(Self(value))
        }
    }

    /// Priority of the watcher at `index` (zero based) within its pool.
    pub fn from_index(index: usize) -> Self {
        let offset = u32::try_from(index).unwrap_or(u32::MAX - PRIORITY_BASE);
        Self(PRIORITY_BASE.saturating_add(offset))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Zero based position of this watcher in its pool.
    pub const fn index(self) -> usize {
        (self.0 - PRIORITY_BASE) as usize
    }
}

impl fmt::Display for WatcherPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
