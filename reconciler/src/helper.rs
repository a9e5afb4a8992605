use alloc::vec::Vec;
use core::mem;

use crate::reorder::reorder_ops;
use crate::{HelperOptions, OpFactory, OpPool, UpdateCmd, UpdateError, UpdateOp, UpdateTypes};

/// The host side of the reconciliation: the items currently bound to on-screen slots, and the
/// sinks for the two dispatch passes.
///
/// Positions passed to the `offset_*`/`mark_updated` hooks are in the host's bound-item
/// coordinates, i.e. with every op dispatched so far already applied.
pub trait UpdateCallback<P> {
    /// The host's handle for a bound item.
    type Bound;

    /// Returns the item bound at `position`, ignoring items already flagged as removed.
    fn find_bound(&self, position: usize) -> Option<&Self::Bound>;

    fn offset_positions_for_add(&mut self, position_start: usize, item_count: usize);

    /// Items in the range were never laid out: the removal applies to the pre-layout state too.
    fn offset_positions_for_removing_invisible(&mut self, position_start: usize, item_count: usize);

    /// Items in the range are laid out or new: the pre-layout state keeps them.
    fn offset_positions_for_removing_laid_out_or_new(
        &mut self,
        position_start: usize,
        item_count: usize,
    );

    fn offset_positions_for_move(&mut self, from: usize, to: usize);

    fn mark_updated(&mut self, position_start: usize, item_count: usize, payload: Option<&P>);

    /// Receives ops that must be reflected in the pre-layout pass.
    ///
    /// Called before any bound item is offset for `op`.
    fn on_dispatch_first_pass(&mut self, op: &UpdateOp<P>);

    /// Receives ops deferred to the post-layout pass.
    fn on_dispatch_second_pass(&mut self, op: &UpdateOp<P>);

    /// Called after each pending op has been processed.
    fn on_item_processed(&mut self) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PositionKind {
    /// No bound item and not re-findable in pre-layout: dispatched in the first pass.
    Invisible,
    /// Bound, or created by a postponed op: deferred to the second pass.
    NewOrLaidOut,
}

/// Records adapter mutations and turns them into a pre-layout and a post-layout dispatch.
///
/// Typical cycle:
/// 1. The data source reports changes via `on_item_range_*` (or [`Self::add_update_op`]).
/// 2. Before the pre-layout pass, [`Self::pre_process`] dispatches everything that does not
///    touch a bound item and postpones the rest.
/// 3. During pre-layout, [`Self::find_position_offset`] maps pre-layout positions to their final
///    positions.
/// 4. [`Self::consume_postponed_updates`] dispatches the deferred ops.
///
/// Hosts without bound items to keep stable can call [`Self::consume_updates_in_one_pass`]
/// instead of steps 2-4.
#[derive(Clone, Debug)]
pub struct AdapterHelper<C, P = ()> {
    pending: Vec<UpdateOp<P>>,
    postponed: Vec<UpdateOp<P>>,
    pool: OpPool<P>,
    callback: C,
    options: HelperOptions,
    existing_update_types: UpdateTypes,
}

impl<C, P> AdapterHelper<C, P> {
    pub fn new(callback: C) -> Self {
        Self::with_options(callback, HelperOptions::default())
    }

    pub fn with_options(callback: C, options: HelperOptions) -> Self {
        rdebug!(
            pool_size = options.pool_size,
            disable_recycler = options.disable_recycler,
            coalesce = options.coalesce,
            "AdapterHelper::new"
        );
        let pool = if options.disable_recycler {
            OpPool::disabled()
        } else {
            OpPool::new(options.pool_size)
        };
        Self {
            pending: Vec::new(),
            postponed: Vec::new(),
            pool,
            callback,
            options,
            existing_update_types: UpdateTypes::empty(),
        }
    }

    pub fn options(&self) -> &HelperOptions {
        &self.options
    }

    pub fn callback(&self) -> &C {
        &self.callback
    }

    pub fn callback_mut(&mut self) -> &mut C {
        &mut self.callback
    }

    pub fn into_callback(self) -> C {
        self.callback
    }

    /// Ops recorded since the last [`Self::pre_process`], in causal order.
    pub fn pending_updates(&self) -> &[UpdateOp<P>] {
        &self.pending
    }

    /// Ops deferred to the second pass by the last [`Self::pre_process`].
    pub fn postponed_updates(&self) -> &[UpdateOp<P>] {
        &self.postponed
    }

    pub fn has_pending_updates(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Whether any op of one of `types` was recorded since the last full dispatch.
    pub fn has_any_update_types(&self, types: UpdateTypes) -> bool {
        self.existing_update_types.intersects(types)
    }

    /// Whether either pass still has work outstanding.
    pub fn has_updates(&self) -> bool {
        !self.pending.is_empty() || !self.postponed.is_empty()
    }

    /// Drops every pending and postponed op without dispatching them.
    pub fn reset(&mut self) {
        rdebug!(
            pending = self.pending.len(),
            postponed = self.postponed.len(),
            "AdapterHelper::reset"
        );
        recycle_all(&mut self.pool, &mut self.pending);
        recycle_all(&mut self.pool, &mut self.postponed);
        self.existing_update_types = UpdateTypes::empty();
    }

    /// Maps a pre-layout position to its position once every postponed op is applied.
    ///
    /// Returns `None` if the item is removed by a postponed op.
    pub fn find_position_offset(&self, position: usize) -> Option<usize> {
        self.find_position_offset_from(position, 0)
    }

    /// Like [`Self::find_position_offset`], but only considers postponed ops starting at index
    /// `first_postponed`.
    pub fn find_position_offset_from(&self, position: usize, first_postponed: usize) -> Option<usize> {
        let ops = self.postponed.get(first_postponed..).unwrap_or_default();
        offset_position_through(ops, position)
    }

    /// Maps a position from before the pending ops to the current adapter position.
    ///
    /// Returns `None` if the item is removed by a pending op.
    pub fn apply_pending_updates_to_position(&self, position: usize) -> Option<usize> {
        offset_position_through(&self.pending, position)
    }
}

impl<C, P> AdapterHelper<C, P>
where
    C: UpdateCallback<P>,
    P: Clone + PartialEq,
{
    /// Records `op` at the end of the pending queue.
    ///
    /// Returns `Ok(true)` if the op was queued as a new entry and `Ok(false)` if it was a
    /// no-op (zero count, move onto itself) or merged into the previous entry.
    pub fn add_update_op(&mut self, op: UpdateOp<P>) -> Result<bool, UpdateError> {
        if op.is_move() {
            if op.position_start == op.item_count {
                rtrace!(%op, "dropping move onto itself");
                self.pool.recycle_update_op(op);
                return Ok(false);
            }
        } else {
            if op.item_count == 0 {
                rtrace!(%op, "dropping empty op");
                self.pool.recycle_update_op(op);
                return Ok(false);
            }
            if op.position_start.checked_add(op.item_count).is_none() {
                rwarn!(%op, "rejecting op with overflowing range");
                return Err(UpdateError::RangeOverflow {
                    position_start: op.position_start,
                    item_count: op.item_count,
                });
            }
        }

        self.existing_update_types |= op.cmd.types();
        if self.options.coalesce && self.merge_into_last(&op) {
            rtrace!(%op, "merged into last pending op");
            self.pool.recycle_update_op(op);
            return Ok(false);
        }
        rtrace!(%op, pending = self.pending.len() + 1, "queued");
        self.pending.push(op);
        Ok(true)
    }

    /// Records every op of `ops` in order. Stops at the first rejected op.
    pub fn add_update_ops(
        &mut self,
        ops: impl IntoIterator<Item = UpdateOp<P>>,
    ) -> Result<(), UpdateError> {
        for op in ops {
            self.add_update_op(op)?;
        }
        Ok(())
    }

    /// Records an op given in signed coordinates, as used by hosts that model "no position" as
    /// a negative index.
    ///
    /// A zero count is dropped like in [`Self::add_update_op`]; negative counts or positions are
    /// rejected. For moves, `item_count` is the target position.
    pub fn add_signed_update_op(
        &mut self,
        cmd: UpdateCmd,
        position_start: isize,
        item_count: isize,
        payload: Option<P>,
    ) -> Result<bool, UpdateError> {
        let start = usize::try_from(position_start).map_err(|_| UpdateError::NegativePosition {
            position: position_start,
        })?;
        let count = if cmd == UpdateCmd::Move {
            usize::try_from(item_count).map_err(|_| UpdateError::NegativePosition {
                position: item_count,
            })?
        } else {
            usize::try_from(item_count)
                .map_err(|_| UpdateError::NegativeCount { item_count })?
        };
        let op = self.pool.obtain_update_op(cmd, start, count, payload);
        self.add_update_op(op)
    }

    /// Records a range insertion. Returns `Ok(true)` if an update pass needs to be scheduled.
    pub fn on_item_range_inserted(
        &mut self,
        position_start: usize,
        item_count: usize,
    ) -> Result<bool, UpdateError> {
        let op = self
            .pool
            .obtain_update_op(UpdateCmd::Add, position_start, item_count, None);
        self.record_from_observer(op)
    }

    /// Records a range removal. Returns `Ok(true)` if an update pass needs to be scheduled.
    pub fn on_item_range_removed(
        &mut self,
        position_start: usize,
        item_count: usize,
    ) -> Result<bool, UpdateError> {
        let op = self
            .pool
            .obtain_update_op(UpdateCmd::Remove, position_start, item_count, None);
        self.record_from_observer(op)
    }

    /// Records a range change. Returns `Ok(true)` if an update pass needs to be scheduled.
    pub fn on_item_range_changed(
        &mut self,
        position_start: usize,
        item_count: usize,
        payload: Option<P>,
    ) -> Result<bool, UpdateError> {
        let op = self
            .pool
            .obtain_update_op(UpdateCmd::Update, position_start, item_count, payload);
        self.record_from_observer(op)
    }

    /// Records a move. Only single-item moves are supported.
    ///
    /// Returns `Ok(true)` if an update pass needs to be scheduled.
    pub fn on_item_range_moved(
        &mut self,
        from: usize,
        to: usize,
        item_count: usize,
    ) -> Result<bool, UpdateError> {
        if from == to {
            return Ok(false);
        }
        if item_count != 1 {
            rwarn!(from, to, item_count, "rejecting multi-item move");
            return Err(UpdateError::UnsupportedMoveCount { item_count });
        }
        let op = self.pool.obtain_update_op(UpdateCmd::Move, from, to, None);
        self.record_from_observer(op)
    }

    fn record_from_observer(&mut self, op: UpdateOp<P>) -> Result<bool, UpdateError> {
        let queued = self.add_update_op(op)?;
        Ok(queued && self.pending.len() == 1)
    }

    /// Merges `op` into the last pending op if both describe one contiguous mutation.
    ///
    /// Adds only merge when appending to the end of the inserted block and updates only when
    /// the ranges touch without overlapping, so the merged op touches the same items in the
    /// same order as the pair did.
    fn merge_into_last(&mut self, op: &UpdateOp<P>) -> bool {
        let Some(last) = self.pending.last_mut() else {
            return false;
        };
        if last.cmd != op.cmd {
            return false;
        }
        let Some(merged_count) = last.item_count.checked_add(op.item_count) else {
            return false;
        };
        match op.cmd {
            UpdateCmd::Remove => {
                if op.position_start <= last.position_start && last.position_start <= op.end() {
                    last.position_start = op.position_start;
                    last.item_count = merged_count;
                    return true;
                }
            }
            UpdateCmd::Add => {
                if op.position_start == last.end() {
                    last.item_count = merged_count;
                    return true;
                }
            }
            UpdateCmd::Update => {
                if last.payload != op.payload {
                    return false;
                }
                if op.position_start == last.end() {
                    last.item_count = merged_count;
                    return true;
                }
                if op.end() == last.position_start {
                    last.position_start = op.position_start;
                    last.item_count = merged_count;
                    return true;
                }
            }
            UpdateCmd::Move => {}
        }
        false
    }

    /// Runs the first pass over the pending ops.
    ///
    /// The pending queue is reordered so that moves come last, then every op is either
    /// dispatched through [`UpdateCallback::on_dispatch_first_pass`] right away or postponed to
    /// [`Self::consume_postponed_updates`]. The pending queue is empty afterwards.
    pub fn pre_process(&mut self) {
        rdebug!(pending = self.pending.len(), "AdapterHelper::pre_process");
        reorder_ops(&mut self.pending, &mut self.pool);

        let mut pending = mem::take(&mut self.pending);
        for op in pending.drain(..) {
            match op.cmd {
                UpdateCmd::Add => self.apply_add(op),
                UpdateCmd::Remove => self.apply_remove(op),
                UpdateCmd::Update => self.apply_update(op),
                UpdateCmd::Move => self.apply_move(op),
            }
            self.callback.on_item_processed();
        }
        // Keep the allocation around for the next cycle.
        self.pending = pending;
        rdebug!(postponed = self.postponed.len(), "pre_process done");
    }

    /// Runs the second pass: dispatches every postponed op in order.
    pub fn consume_postponed_updates(&mut self) {
        rdebug!(
            postponed = self.postponed.len(),
            "AdapterHelper::consume_postponed_updates"
        );
        for op in &self.postponed {
            self.callback.on_dispatch_second_pass(op);
        }
        recycle_all(&mut self.pool, &mut self.postponed);
        self.existing_update_types = UpdateTypes::empty();
    }

    /// Dispatches every pending op once, in recorded order, skipping the two-pass split.
    ///
    /// Leftover postponed ops from an unmatched [`Self::pre_process`] are consumed first.
    pub fn consume_updates_in_one_pass(&mut self) {
        self.consume_postponed_updates();
        rdebug!(
            pending = self.pending.len(),
            "AdapterHelper::consume_updates_in_one_pass"
        );
        for op in &self.pending {
            self.callback.on_dispatch_second_pass(op);
            match op.cmd {
                UpdateCmd::Add => self
                    .callback
                    .offset_positions_for_add(op.position_start, op.item_count),
                UpdateCmd::Remove => self
                    .callback
                    .offset_positions_for_removing_invisible(op.position_start, op.item_count),
                UpdateCmd::Update => self.callback.mark_updated(
                    op.position_start,
                    op.item_count,
                    op.payload.as_ref(),
                ),
                UpdateCmd::Move => self
                    .callback
                    .offset_positions_for_move(op.position_start, op.item_count),
            }
            self.callback.on_item_processed();
        }
        recycle_all(&mut self.pool, &mut self.pending);
        self.existing_update_types = UpdateTypes::empty();
    }

    fn apply_add(&mut self, op: UpdateOp<P>) {
        self.postpone_and_update_bound(op);
    }

    fn apply_move(&mut self, op: UpdateOp<P>) {
        // After reordering, the moved item is known to still exist: moves of removed items
        // were turned into removes.
        self.postpone_and_update_bound(op);
    }

    fn position_kind(&self, position: usize) -> PositionKind {
        if self.callback.find_bound(position).is_some() || self.can_find_in_pre_layout(position) {
            PositionKind::NewOrLaidOut
        } else {
            PositionKind::Invisible
        }
    }

    fn apply_remove(&mut self, op: UpdateOp<P>) {
        let tmp_start = op.position_start;
        let mut tmp_count = 0;
        let mut tmp_end = op.end();
        let mut kind = None;
        let mut position = op.position_start;
        while position < tmp_end {
            let next_kind = self.position_kind(position);
            let kind_changed = kind.is_some_and(|prev| prev != next_kind);
            if kind_changed {
                // Flush the run so far. Either way those items are gone from the positions
                // below, so the scan continues at `tmp_start`.
                let run = self
                    .pool
                    .obtain_update_op(UpdateCmd::Remove, tmp_start, tmp_count, None);
                match next_kind {
                    PositionKind::NewOrLaidOut => self.dispatch_and_update_bound(run),
                    PositionKind::Invisible => self.postpone_and_update_bound(run),
                }
                position -= tmp_count;
                tmp_end -= tmp_count;
                tmp_count = 1;
            } else {
                tmp_count += 1;
            }
            kind = Some(next_kind);
            position += 1;
        }

        let op = if tmp_count != op.item_count {
            self.pool.recycle_update_op(op);
            self.pool
                .obtain_update_op(UpdateCmd::Remove, tmp_start, tmp_count, None)
        } else {
            op
        };
        match kind {
            Some(PositionKind::Invisible) => self.dispatch_and_update_bound(op),
            _ => self.postpone_and_update_bound(op),
        }
    }

    fn apply_update(&mut self, mut op: UpdateOp<P>) {
        let mut tmp_start = op.position_start;
        let mut tmp_count = 0;
        let mut kind = None;
        for position in op.position_start..op.end() {
            let next_kind = self.position_kind(position);
            if kind.is_some_and(|prev| prev != next_kind) {
                let run = self.pool.obtain_update_op(
                    UpdateCmd::Update,
                    tmp_start,
                    tmp_count,
                    op.payload.clone(),
                );
                match next_kind {
                    PositionKind::NewOrLaidOut => self.dispatch_and_update_bound(run),
                    PositionKind::Invisible => self.postpone_and_update_bound(run),
                }
                tmp_count = 0;
                tmp_start = position;
            }
            kind = Some(next_kind);
            tmp_count += 1;
        }

        if tmp_count != op.item_count {
            let payload = op.payload.take();
            self.pool.recycle_update_op(op);
            op = self
                .pool
                .obtain_update_op(UpdateCmd::Update, tmp_start, tmp_count, payload);
        }
        match kind {
            Some(PositionKind::Invisible) => self.dispatch_and_update_bound(op),
            _ => self.postpone_and_update_bound(op),
        }
    }

    /// Dispatches a remove or update in the first pass.
    ///
    /// `op` is expressed against the list with every postponed op applied. Each of its
    /// positions is mapped back through the postponed ops (which are adjusted to now come after
    /// `op`), and the op is re-split wherever the mapped positions stop being contiguous.
    fn dispatch_and_update_bound(&mut self, mut op: UpdateOp<P>) {
        let step = match op.cmd {
            UpdateCmd::Update => 1,
            UpdateCmd::Remove => 0,
            UpdateCmd::Add | UpdateCmd::Move => {
                unreachable!("adds and moves are never dispatched in the first pass: {op}")
            }
        };
        rtrace!(%op, postponed = self.postponed.len(), "dispatch first pass");

        let mut tmp_start = self.update_position_with_postponed(op.position_start, op.cmd);
        let mut tmp_count = 1;
        let mut offset_for_partial = op.position_start;
        for p in 1..op.item_count {
            let pos = op.position_start + step * p;
            let updated = self.update_position_with_postponed(pos, op.cmd);
            let continuous = match op.cmd {
                UpdateCmd::Update => updated == tmp_start + tmp_count,
                _ => updated == tmp_start,
            };
            if continuous {
                tmp_count += 1;
            } else {
                let partial =
                    self.pool
                        .obtain_update_op(op.cmd, tmp_start, tmp_count, op.payload.clone());
                rtrace!(%partial, "dispatching separately");
                self.dispatch_first_pass_and_update_bound(&partial, offset_for_partial);
                self.pool.recycle_update_op(partial);
                if op.cmd == UpdateCmd::Update {
                    offset_for_partial += tmp_count;
                }
                tmp_start = updated;
                tmp_count = 1;
            }
        }

        let cmd = op.cmd;
        let payload = op.payload.take();
        self.pool.recycle_update_op(op);
        let last = self
            .pool
            .obtain_update_op(cmd, tmp_start, tmp_count, payload);
        self.dispatch_first_pass_and_update_bound(&last, offset_for_partial);
        self.pool.recycle_update_op(last);
    }

    fn dispatch_first_pass_and_update_bound(&mut self, op: &UpdateOp<P>, offset_start: usize) {
        self.callback.on_dispatch_first_pass(op);
        match op.cmd {
            UpdateCmd::Remove => self
                .callback
                .offset_positions_for_removing_invisible(offset_start, op.item_count),
            UpdateCmd::Update => {
                self.callback
                    .mark_updated(offset_start, op.item_count, op.payload.as_ref())
            }
            UpdateCmd::Add | UpdateCmd::Move => {
                unreachable!("only removes and updates are dispatched in the first pass: {op}")
            }
        }
    }

    /// Moves an op of kind `cmd` at `pos` in front of every postponed op.
    ///
    /// Returns `pos` with the postponed ops reverted, and shifts the postponed ops so that they
    /// stay valid once the op at `pos` is applied before them. Postponed ops that become no-ops
    /// are recycled.
    fn update_position_with_postponed(&mut self, pos: usize, cmd: UpdateCmd) -> usize {
        let delta: isize = match cmd {
            UpdateCmd::Add => 1,
            UpdateCmd::Remove => -1,
            UpdateCmd::Update | UpdateCmd::Move => 0,
        };
        let mut pos = pos as isize;
        for postponed in self.postponed.iter_mut().rev() {
            let from = postponed.position_start as isize;
            let count = postponed.item_count as isize;
            if postponed.is_move() {
                let to = count;
                let (start, end) = if from < to { (from, to) } else { (to, from) };
                if pos >= start && pos <= end {
                    if start == from {
                        shift(&mut postponed.item_count, delta);
                        // The op moved left, move it right to revert.
                        pos += 1;
                    } else {
                        shift(&mut postponed.position_start, delta);
                        // The op moved right, move it left to revert.
                        pos -= 1;
                    }
                } else if pos < from {
                    shift(&mut postponed.position_start, delta);
                    shift(&mut postponed.item_count, delta);
                }
            } else if from <= pos {
                match postponed.cmd {
                    UpdateCmd::Add => pos -= count,
                    UpdateCmd::Remove => pos += count,
                    UpdateCmd::Update | UpdateCmd::Move => {}
                }
            } else {
                shift(&mut postponed.position_start, delta);
            }
        }

        let mut i = self.postponed.len();
        while i > 0 {
            i -= 1;
            let op = &self.postponed[i];
            let is_noop = if op.is_move() {
                op.position_start == op.item_count
            } else {
                op.item_count == 0
            };
            if is_noop {
                let op = self.postponed.remove(i);
                self.pool.recycle_update_op(op);
            }
        }

        debug_assert!(pos >= 0, "reverted position went negative ({pos})");
        pos.max(0) as usize
    }

    /// Whether `position` holds an item that a postponed add or move puts there.
    fn can_find_in_pre_layout(&self, position: usize) -> bool {
        for (i, op) in self.postponed.iter().enumerate() {
            match op.cmd {
                UpdateCmd::Move => {
                    if self.find_position_offset_from(op.item_count, i + 1) == Some(position) {
                        return true;
                    }
                }
                UpdateCmd::Add => {
                    for pos in op.position_start..op.end() {
                        if self.find_position_offset_from(pos, i + 1) == Some(position) {
                            return true;
                        }
                    }
                }
                UpdateCmd::Remove | UpdateCmd::Update => {}
            }
        }
        false
    }

    fn postpone_and_update_bound(&mut self, op: UpdateOp<P>) {
        rtrace!(%op, "postponing");
        match op.cmd {
            UpdateCmd::Add => self
                .callback
                .offset_positions_for_add(op.position_start, op.item_count),
            UpdateCmd::Move => self
                .callback
                .offset_positions_for_move(op.position_start, op.item_count),
            UpdateCmd::Remove => self
                .callback
                .offset_positions_for_removing_laid_out_or_new(op.position_start, op.item_count),
            UpdateCmd::Update => {
                self.callback
                    .mark_updated(op.position_start, op.item_count, op.payload.as_ref())
            }
        }
        self.postponed.push(op);
    }
}

/// Walks `position` forward through `ops`. `None` means the item was removed on the way.
fn offset_position_through<P>(ops: &[UpdateOp<P>], mut position: usize) -> Option<usize> {
    for op in ops {
        match op.cmd {
            UpdateCmd::Move => {
                if op.position_start == position {
                    position = op.item_count;
                } else {
                    // Like a remove at `from` followed by an add at `to`.
                    if op.position_start < position {
                        position -= 1;
                    }
                    if op.item_count <= position {
                        position += 1;
                    }
                }
            }
            UpdateCmd::Remove if op.position_start <= position => {
                if position < op.end() {
                    return None;
                }
                position -= op.item_count;
            }
            UpdateCmd::Add if op.position_start <= position => {
                position += op.item_count;
            }
            _ => {}
        }
    }
    Some(position)
}

fn shift(value: &mut usize, delta: isize) {
    match value.checked_add_signed(delta) {
        Some(next) => *value = next,
        None => {
            rwarn!(value = *value, delta, "postponed op index underflow");
            debug_assert!(false, "postponed op index underflow ({value} {delta:+})");
        }
    }
}

fn recycle_all<P>(pool: &mut OpPool<P>, ops: &mut Vec<UpdateOp<P>>) {
    for op in ops.drain(..) {
        pool.recycle_update_op(op);
    }
}
