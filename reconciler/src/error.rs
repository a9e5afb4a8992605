use thiserror::Error;

/// A caller contract violation reported when an op is recorded.
///
/// These are never produced for well-formed input. Silently accepting them would leave the
/// pending queue out of sync with the data source it describes.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum UpdateError {
    #[error("negative position {position}")]
    NegativePosition { position: isize },

    #[error("negative item count {item_count}")]
    NegativeCount { item_count: isize },

    #[error("range of {item_count} items starting at {position_start} overflows usize")]
    RangeOverflow {
        position_start: usize,
        item_count: usize,
    },

    #[error("moving {item_count} items at once is not supported, moves relocate a single item")]
    UnsupportedMoveCount { item_count: usize },
}
