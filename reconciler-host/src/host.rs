use alloc::vec::Vec;

use reconciler::{UpdateCallback, UpdateOp};

use crate::BoundItems;

/// An [`UpdateCallback`] over [`BoundItems`] that records both dispatch passes.
///
/// A first-pass op must be dispatched before bound items are offset for it, so it can never
/// cover the layout position of a bound item. Ops that do are kept in [`Self::conflicts`].
#[derive(Clone, Debug)]
pub struct RecordingHost<K, P = ()> {
    bound: BoundItems<K, P>,
    first_pass: Vec<UpdateOp<P>>,
    second_pass: Vec<UpdateOp<P>>,
    conflicts: Vec<UpdateOp<P>>,
    processed: usize,
}

impl<K, P> Default for RecordingHost<K, P> {
    fn default() -> Self {
        Self::new(BoundItems::new())
    }
}

impl<K, P> RecordingHost<K, P> {
    pub fn new(bound: BoundItems<K, P>) -> Self {
        Self {
            bound,
            first_pass: Vec::new(),
            second_pass: Vec::new(),
            conflicts: Vec::new(),
            processed: 0,
        }
    }

    pub fn bound(&self) -> &BoundItems<K, P> {
        &self.bound
    }

    pub fn bound_mut(&mut self) -> &mut BoundItems<K, P> {
        &mut self.bound
    }

    pub fn first_pass(&self) -> &[UpdateOp<P>] {
        &self.first_pass
    }

    pub fn second_pass(&self) -> &[UpdateOp<P>] {
        &self.second_pass
    }

    pub fn conflicts(&self) -> &[UpdateOp<P>] {
        &self.conflicts
    }

    /// Number of ops reported through [`UpdateCallback::on_item_processed`].
    pub fn processed(&self) -> usize {
        self.processed
    }

    /// Clears the dispatch logs, keeping the bound items.
    pub fn clear_log(&mut self) {
        self.first_pass.clear();
        self.second_pass.clear();
        self.conflicts.clear();
        self.processed = 0;
    }
}

impl<K, P: Clone> UpdateCallback<P> for RecordingHost<K, P> {
    type Bound = crate::BoundItem<K, P>;

    fn find_bound(&self, position: usize) -> Option<&Self::Bound> {
        self.bound.find(position)
    }

    fn offset_positions_for_add(&mut self, position_start: usize, item_count: usize) {
        self.bound.offset_for_add(position_start, item_count);
    }

    fn offset_positions_for_removing_invisible(&mut self, position_start: usize, item_count: usize) {
        self.bound.offset_for_remove(position_start, item_count, true);
    }

    fn offset_positions_for_removing_laid_out_or_new(
        &mut self,
        position_start: usize,
        item_count: usize,
    ) {
        self.bound.offset_for_remove(position_start, item_count, false);
    }

    fn offset_positions_for_move(&mut self, from: usize, to: usize) {
        self.bound.offset_for_move(from, to);
    }

    fn mark_updated(&mut self, position_start: usize, item_count: usize, payload: Option<&P>) {
        self.bound.mark_updated(position_start, item_count, payload);
    }

    fn on_dispatch_first_pass(&mut self, op: &UpdateOp<P>) {
        let start = op.position_start as isize;
        let end = op.end() as isize;
        let touches_bound = self.bound.iter().any(|item| {
            let layout = item.layout_position();
            layout >= start && layout < end
        });
        if touches_bound {
            hwarn!(%op, "first pass op covers a bound item");
            self.conflicts.push(op.clone());
        }
        self.first_pass.push(op.clone());
    }

    fn on_dispatch_second_pass(&mut self, op: &UpdateOp<P>) {
        self.second_pass.push(op.clone());
    }

    fn on_item_processed(&mut self) {
        self.processed += 1;
    }
}
