use crate::pool::DEFAULT_POOL_SIZE;

/// Configuration for [`crate::AdapterHelper`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HelperOptions {
    /// How many recycled ops the internal pool keeps for reuse.
    pub pool_size: usize,
    /// Drops recycled ops instead of pooling them.
    ///
    /// Useful for hosts that keep clones of dispatched ops around and want allocation counts
    /// that do not depend on pool state.
    pub disable_recycler: bool,
    /// Merges a newly recorded op into the last pending one when both describe one contiguous
    /// mutation of the same kind.
    pub coalesce: bool,
}

impl HelperOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    pub fn with_disable_recycler(mut self, disable_recycler: bool) -> Self {
        self.disable_recycler = disable_recycler;
        self
    }

    pub fn with_coalesce(mut self, coalesce: bool) -> Self {
        self.coalesce = coalesce;
        self
    }
}

impl Default for HelperOptions {
    fn default() -> Self {
        Self {
            pool_size: DEFAULT_POOL_SIZE,
            disable_recycler: false,
            coalesce: true,
        }
    }
}
