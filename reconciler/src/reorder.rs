//! Pushes every move behind every non-move op without changing the net effect of the list.
//!
//! Moves break the continuity of index ranges, which makes them awkward to reason about
//! during the pre-layout pass. Once all moves trail the queue, the remove/add/update prefix can
//! be dispatched range by range and the moves replayed last.
//!
//! Each swap looks at one `(move, x)` pair and rewrites it into an equivalent sequence where
//! `x` (possibly split into several ops) comes first:
//!
//! 1. The move's insertion at `to` is reverted on `x`'s indices.
//! 2. The move's removal at `from` is reverted on `x`'s indices.
//! 3. The move is renumbered against the list after `x` has been applied.
use alloc::vec::Vec;

use crate::{OpFactory, UpdateCmd, UpdateOp};

/// Reorders `ops` in place so that no move precedes a non-move.
///
/// Ops created by splits are obtained from `factory`, ops that become redundant are handed
/// back to it.
pub fn reorder_ops<P, F>(ops: &mut Vec<UpdateOp<P>>, factory: &mut F)
where
    P: Clone,
    F: OpFactory<P>,
{
    while let Some(bad_move) = last_move_out_of_order(ops) {
        swap_move_op(ops, bad_move, factory);
    }
    debug_assert!(
        all_moves_at_the_end(ops),
        "reorder_ops left a move in front of a non-move op"
    );
}

/// Whether every move in `ops` comes after every non-move.
pub fn all_moves_at_the_end<P>(ops: &[UpdateOp<P>]) -> bool {
    last_move_out_of_order(ops).is_none()
}

fn last_move_out_of_order<P>(ops: &[UpdateOp<P>]) -> Option<usize> {
    let mut found_non_move = false;
    for (i, op) in ops.iter().enumerate().rev() {
        if op.is_move() {
            if found_non_move {
                return Some(i);
            }
        } else {
            found_non_move = true;
        }
    }
    None
}

fn swap_move_op<P, F>(ops: &mut Vec<UpdateOp<P>>, move_pos: usize, factory: &mut F)
where
    P: Clone,
    F: OpFactory<P>,
{
    match ops[move_pos + 1].cmd {
        UpdateCmd::Remove => swap_move_remove(ops, move_pos, factory),
        UpdateCmd::Add => swap_move_add(ops, move_pos),
        UpdateCmd::Update => swap_move_update(ops, move_pos, factory),
        UpdateCmd::Move => unreachable!("the op after the last out-of-order move is never a move"),
    }
}

fn take_pair<P>(ops: &mut Vec<UpdateOp<P>>, pos: usize) -> (UpdateOp<P>, UpdateOp<P>) {
    let second = ops.remove(pos + 1);
    let first = ops.remove(pos);
    (first, second)
}

fn put_back<P>(ops: &mut Vec<UpdateOp<P>>, pos: usize, replacement: Vec<UpdateOp<P>>) {
    for (offset, op) in replacement.into_iter().enumerate() {
        ops.insert(pos + offset, op);
    }
}

/// Swaps the move at `move_pos` with the remove right after it.
///
/// The result replaces the pair at `move_pos` and is one of:
/// - `[rm(from,1), rm']` when the moved item itself is removed,
/// - `[rm']` when the remove undoes the move,
/// - `[rm_extra?, rm', mv'?]` otherwise, where the remove is split around `from` if it
///   straddles it and the move is dropped once it degenerates to `from == to`.
///
/// # Panics
/// Panics if `ops[move_pos]` is not a move or `ops[move_pos + 1]` is not a remove.
pub fn swap_move_remove<P, F>(ops: &mut Vec<UpdateOp<P>>, move_pos: usize, factory: &mut F)
where
    F: OpFactory<P>,
{
    assert!(
        ops[move_pos].is_move() && ops[move_pos + 1].cmd == UpdateCmd::Remove,
        "swap_move_remove expects a move followed by a remove"
    );
    let (move_op, remove_op) = take_pair(ops, move_pos);
    rtrace!(%move_op, %remove_op, "swap_move_remove");
    let replacement = move_then_remove(move_op, remove_op, factory);
    put_back(ops, move_pos, replacement);
}

fn move_then_remove<P, F>(
    mut move_op: UpdateOp<P>,
    mut remove_op: UpdateOp<P>,
    factory: &mut F,
) -> Vec<UpdateOp<P>>
where
    F: OpFactory<P>,
{
    let move_is_backwards = move_op.position_start >= move_op.item_count;
    let reverted_move = if move_is_backwards {
        remove_op.position_start == move_op.item_count + 1
            && remove_op.item_count == move_op.position_start - move_op.item_count
    } else {
        remove_op.position_start == move_op.position_start
            && remove_op.item_count == move_op.item_count - move_op.position_start
    };

    // Revert the insertion at `to`.
    if move_op.item_count < remove_op.position_start {
        remove_op.position_start -= 1;
    } else if move_op.item_count < remove_op.end() {
        // The moved item is removed: it can simply be removed from where it came from.
        remove_op.item_count -= 1;
        move_op.cmd = UpdateCmd::Remove;
        move_op.item_count = 1;
        let mut out = Vec::with_capacity(2);
        out.push(move_op);
        if remove_op.item_count == 0 {
            factory.recycle_update_op(remove_op);
        } else {
            out.push(remove_op);
        }
        return out;
    }

    // Revert the removal at `from`.
    let mut extra_rm = None;
    if move_op.position_start <= remove_op.position_start {
        remove_op.position_start += 1;
    } else if move_op.position_start < remove_op.end() {
        let remaining = remove_op.end() - move_op.position_start;
        extra_rm = Some(factory.obtain_update_op(
            UpdateCmd::Remove,
            move_op.position_start + 1,
            remaining,
            None,
        ));
        remove_op.item_count = move_op.position_start - remove_op.position_start;
    }

    if reverted_move {
        debug_assert!(extra_rm.is_none(), "a reverted move never splits the remove");
        factory.recycle_update_op(move_op);
        if let Some(extra) = extra_rm {
            factory.recycle_update_op(extra);
        }
        let mut out = Vec::with_capacity(1);
        out.push(remove_op);
        return out;
    }

    // Renumber the move against the list with the removes applied.
    if move_is_backwards {
        if let Some(extra) = &extra_rm {
            if move_op.position_start > extra.position_start {
                move_op.position_start -= extra.item_count;
            }
            if move_op.item_count > extra.position_start {
                move_op.item_count -= extra.item_count;
            }
        }
        if move_op.position_start > remove_op.position_start {
            move_op.position_start -= remove_op.item_count;
        }
        if move_op.item_count > remove_op.position_start {
            move_op.item_count -= remove_op.item_count;
        }
    } else {
        if let Some(extra) = &extra_rm {
            if move_op.position_start >= extra.position_start {
                move_op.position_start -= extra.item_count;
            }
            if move_op.item_count >= extra.position_start {
                move_op.item_count -= extra.item_count;
            }
        }
        if move_op.position_start >= remove_op.position_start {
            move_op.position_start -= remove_op.item_count;
        }
        if move_op.item_count >= remove_op.position_start {
            move_op.item_count -= remove_op.item_count;
        }
    }

    let mut out = Vec::with_capacity(3);
    if let Some(extra) = extra_rm {
        out.push(extra);
    }
    out.push(remove_op);
    if move_op.position_start != move_op.item_count {
        out.push(move_op);
    } else {
        factory.recycle_update_op(move_op);
    }
    out
}

/// Swaps the move at `move_pos` with the add right after it. Never splits anything.
///
/// # Panics
/// Panics if `ops[move_pos]` is not a move or `ops[move_pos + 1]` is not an add.
pub fn swap_move_add<P>(ops: &mut [UpdateOp<P>], move_pos: usize) {
    assert!(
        ops[move_pos].is_move() && ops[move_pos + 1].cmd == UpdateCmd::Add,
        "swap_move_add expects a move followed by an add"
    );
    let (head, tail) = ops.split_at_mut(move_pos + 1);
    let move_op = &mut head[move_pos];
    let add_op = &mut tail[0];
    rtrace!(%move_op, %add_op, "swap_move_add");

    let add_start = add_op.position_start;
    let mut new_add_start = add_start;
    // Revert the insertion at `to`, then the removal at `from`.
    if move_op.item_count < add_start {
        new_add_start -= 1;
    }
    if move_op.position_start < add_start {
        new_add_start += 1;
    }
    if add_start <= move_op.position_start {
        move_op.position_start += add_op.item_count;
    }
    if add_start <= move_op.item_count {
        move_op.item_count += add_op.item_count;
    }
    add_op.position_start = new_add_start;
    ops.swap(move_pos, move_pos + 1);
}

/// Swaps the move at `move_pos` with the update right after it.
///
/// The update is split into up to three ranges: the moved item (re-targeted at `from`), the
/// part after `from`, and the rest. Empty leftovers are recycled. The payload is cloned into
/// every piece.
///
/// # Panics
/// Panics if `ops[move_pos]` is not a move or `ops[move_pos + 1]` is not an update.
pub fn swap_move_update<P, F>(ops: &mut Vec<UpdateOp<P>>, move_pos: usize, factory: &mut F)
where
    P: Clone,
    F: OpFactory<P>,
{
    assert!(
        ops[move_pos].is_move() && ops[move_pos + 1].cmd == UpdateCmd::Update,
        "swap_move_update expects a move followed by an update"
    );
    let (move_op, update_op) = take_pair(ops, move_pos);
    rtrace!(%move_op, %update_op, "swap_move_update");
    let replacement = move_then_update(move_op, update_op, factory);
    put_back(ops, move_pos, replacement);
}

fn move_then_update<P, F>(
    move_op: UpdateOp<P>,
    mut update_op: UpdateOp<P>,
    factory: &mut F,
) -> Vec<UpdateOp<P>>
where
    P: Clone,
    F: OpFactory<P>,
{
    let mut moved_item_update = None;
    let mut after_from_update = None;

    // Revert the insertion at `to`.
    if move_op.item_count < update_op.position_start {
        update_op.position_start -= 1;
    } else if move_op.item_count < update_op.end() {
        update_op.item_count -= 1;
        moved_item_update = Some(factory.obtain_update_op(
            UpdateCmd::Update,
            move_op.position_start,
            1,
            update_op.payload.clone(),
        ));
    }

    // Revert the removal at `from`.
    if move_op.position_start <= update_op.position_start {
        update_op.position_start += 1;
    } else if move_op.position_start < update_op.end() {
        let remaining = update_op.end() - move_op.position_start;
        after_from_update = Some(factory.obtain_update_op(
            UpdateCmd::Update,
            move_op.position_start + 1,
            remaining,
            update_op.payload.clone(),
        ));
        update_op.item_count -= remaining;
    }

    let mut out = Vec::with_capacity(4);
    if let Some(op) = after_from_update {
        out.push(op);
    }
    if let Some(op) = moved_item_update {
        out.push(op);
    }
    if update_op.item_count > 0 {
        out.push(update_op);
    } else {
        factory.recycle_update_op(update_op);
    }
    out.push(move_op);
    out
}
