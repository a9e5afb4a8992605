use alloc::vec::Vec;

use crate::{UpdateCmd, UpdateOp};

/// Default number of recycled ops kept around by an [`OpPool`].
pub const DEFAULT_POOL_SIZE: usize = 30;

/// Source and sink for the ops created and discarded while splitting or merging.
///
/// `recycle_update_op` takes the op by value: once recycled, the caller has no handle left to
/// read it through.
pub trait OpFactory<P> {
    fn obtain_update_op(
        &mut self,
        cmd: UpdateCmd,
        position_start: usize,
        item_count: usize,
        payload: Option<P>,
    ) -> UpdateOp<P>;

    fn recycle_update_op(&mut self, op: UpdateOp<P>);
}

/// A bounded free list of [`UpdateOp`]s.
#[derive(Clone, Debug)]
pub struct OpPool<P> {
    free: Vec<UpdateOp<P>>,
    capacity: usize,
    enabled: bool,
}

impl<P> OpPool<P> {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::new(),
            capacity,
            enabled: true,
        }
    }

    /// A pool that never retains recycled ops.
    pub fn disabled() -> Self {
        Self {
            free: Vec::new(),
            capacity: 0,
            enabled: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Number of ops currently available for reuse.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl<P> Default for OpPool<P> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl<P> OpFactory<P> for OpPool<P> {
    fn obtain_update_op(
        &mut self,
        cmd: UpdateCmd,
        position_start: usize,
        item_count: usize,
        payload: Option<P>,
    ) -> UpdateOp<P> {
        match self.free.pop() {
            Some(mut op) => {
                op.cmd = cmd;
                op.position_start = position_start;
                op.item_count = item_count;
                op.payload = payload;
                op
            }
            None => UpdateOp::new(cmd, position_start, item_count, payload),
        }
    }

    fn recycle_update_op(&mut self, mut op: UpdateOp<P>) {
        if !self.enabled || self.free.len() >= self.capacity {
            return;
        }
        op.payload = None;
        self.free.push(op);
    }
}
