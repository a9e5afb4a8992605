use alloc::vec::Vec;

/// An item currently bound to an on-screen slot.
///
/// Positions are signed: an item removed by a postponed op is parked at `start - 1`, which is
/// `-1` when the removal starts at the top of the list.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundItem<K, P = ()> {
    key: K,
    position: isize,
    old_position: Option<isize>,
    pre_layout_position: Option<isize>,
    removed: bool,
    updated: bool,
    full_update: bool,
    payloads: Vec<P>,
}

impl<K, P> BoundItem<K, P> {
    pub fn new(key: K, position: usize) -> Self {
        Self {
            key,
            position: position as isize,
            old_position: None,
            pre_layout_position: None,
            removed: false,
            updated: false,
            full_update: false,
            payloads: Vec::new(),
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    /// Position in the adapter with every dispatched op applied.
    pub fn position(&self) -> isize {
        self.position
    }

    /// Position at bind time, set on the first offset since the last layout.
    pub fn old_position(&self) -> Option<isize> {
        self.old_position
    }

    /// Position to use while laying out the pre-layout pass.
    pub fn layout_position(&self) -> isize {
        self.pre_layout_position.unwrap_or(self.position)
    }

    pub fn is_removed(&self) -> bool {
        self.removed
    }

    pub fn is_updated(&self) -> bool {
        self.updated
    }

    /// Whether an update without payload was recorded, which invalidates all payloads.
    pub fn is_full_update(&self) -> bool {
        self.full_update
    }

    /// Payloads of partial updates, in dispatch order. Empty after a full update.
    pub fn payloads(&self) -> &[P] {
        if self.full_update { &[] } else { self.payloads.as_slice() }
    }

    pub fn offset_position(&mut self, offset: isize, apply_to_pre_layout: bool) {
        if self.old_position.is_none() {
            self.old_position = Some(self.position);
        }
        if self.pre_layout_position.is_none() {
            self.pre_layout_position = Some(self.position);
        }
        if apply_to_pre_layout {
            if let Some(pre) = &mut self.pre_layout_position {
                *pre += offset;
            }
        }
        self.position += offset;
    }

    fn flag_removed_and_offset(&mut self, new_position: isize, offset: isize, apply_to_pre_layout: bool) {
        self.removed = true;
        self.offset_position(offset, apply_to_pre_layout);
        self.position = new_position;
    }

    fn mark_updated(&mut self, payload: Option<&P>)
    where
        P: Clone,
    {
        self.updated = true;
        match payload {
            Some(payload) if !self.full_update => self.payloads.push(payload.clone()),
            Some(_) => {}
            None => {
                self.full_update = true;
                self.payloads.clear();
            }
        }
    }

    /// Forgets the offsets and update flags accumulated during the last layout.
    pub fn clear_old_position(&mut self) {
        self.old_position = None;
        self.pre_layout_position = None;
        self.updated = false;
        self.full_update = false;
        self.payloads.clear();
    }
}

/// The set of bound items of a host, kept in bind order.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BoundItems<K, P = ()> {
    items: Vec<BoundItem<K, P>>,
}

impl<K, P> Default for BoundItems<K, P> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<K, P> BoundItems<K, P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, position: usize, key: K) {
        self.items.push(BoundItem::new(key, position));
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoundItem<K, P>> + '_ {
        self.items.iter()
    }

    /// The live item bound at `position`, if any.
    pub fn find(&self, position: usize) -> Option<&BoundItem<K, P>> {
        self.items
            .iter()
            .find(|item| !item.removed && item.position == position as isize)
    }

    pub fn offset_for_add(&mut self, position_start: usize, item_count: usize) {
        let start = position_start as isize;
        for item in &mut self.items {
            if item.position >= start {
                item.offset_position(item_count as isize, false);
            }
        }
    }

    /// Items past the range move up, items inside it are flagged removed and parked just
    /// before `position_start`.
    pub fn offset_for_remove(
        &mut self,
        position_start: usize,
        item_count: usize,
        apply_to_pre_layout: bool,
    ) {
        let start = position_start as isize;
        let count = item_count as isize;
        for item in &mut self.items {
            if item.position >= start + count {
                item.offset_position(-count, apply_to_pre_layout);
            } else if item.position >= start {
                item.flag_removed_and_offset(start - 1, -count, apply_to_pre_layout);
            }
        }
    }

    pub fn offset_for_move(&mut self, from: usize, to: usize) {
        let (from, to) = (from as isize, to as isize);
        let (start, end, in_between_offset) = if from < to {
            (from, to, -1)
        } else {
            (to, from, 1)
        };
        for item in &mut self.items {
            if item.position < start || item.position > end {
                continue;
            }
            if item.position == from {
                item.offset_position(to - from, false);
            } else {
                item.offset_position(in_between_offset, false);
            }
        }
    }

    pub fn mark_updated(&mut self, position_start: usize, item_count: usize, payload: Option<&P>)
    where
        P: Clone,
    {
        let start = position_start as isize;
        let end = start + item_count as isize;
        for item in &mut self.items {
            if item.position >= start && item.position < end {
                item.mark_updated(payload);
            }
        }
    }

    pub fn clear_old_positions(&mut self) {
        for item in &mut self.items {
            item.clear_old_position();
        }
    }

    /// Layout positions of every bound item, removed ones included, in bind order.
    pub fn layout_positions(&self) -> Vec<isize> {
        self.items.iter().map(BoundItem::layout_position).collect()
    }
}
