// Example: record a batch of changes and dispatch it in two passes.
use reconciler::{AdapterHelper, UpdateCallback, UpdateOp};

/// A host with a window of bound positions that just prints what it is told.
struct PrintingHost {
    bound: Vec<usize>,
}

impl UpdateCallback<()> for PrintingHost {
    type Bound = usize;

    fn find_bound(&self, position: usize) -> Option<&usize> {
        self.bound.iter().find(|&&p| p == position)
    }

    fn offset_positions_for_add(&mut self, position_start: usize, item_count: usize) {
        for p in &mut self.bound {
            if *p >= position_start {
                *p += item_count;
            }
        }
    }

    fn offset_positions_for_removing_invisible(&mut self, position_start: usize, item_count: usize) {
        self.offset_positions_for_removing_laid_out_or_new(position_start, item_count);
    }

    fn offset_positions_for_removing_laid_out_or_new(
        &mut self,
        position_start: usize,
        item_count: usize,
    ) {
        let end = position_start + item_count;
        self.bound.retain(|&p| p < position_start || p >= end);
        for p in &mut self.bound {
            if *p >= end {
                *p -= item_count;
            }
        }
    }

    fn offset_positions_for_move(&mut self, from: usize, to: usize) {
        for p in &mut self.bound {
            if *p == from {
                *p = to;
            } else if from < to && *p > from && *p <= to {
                *p -= 1;
            } else if to < from && *p >= to && *p < from {
                *p += 1;
            }
        }
    }

    fn mark_updated(&mut self, _position_start: usize, _item_count: usize, _payload: Option<&()>) {}

    fn on_dispatch_first_pass(&mut self, op: &UpdateOp) {
        println!("first pass:  {op}");
    }

    fn on_dispatch_second_pass(&mut self, op: &UpdateOp) {
        println!("second pass: {op}");
    }
}

fn main() -> Result<(), reconciler::UpdateError> {
    // 50 items, 25..35 on screen.
    let host = PrintingHost {
        bound: (25..35).collect(),
    };
    let mut helper = AdapterHelper::new(host);

    let schedule = helper.on_item_range_removed(24, 5)?;
    println!("schedule update pass: {schedule}");
    helper.on_item_range_inserted(40, 2)?;
    helper.on_item_range_moved(45, 0, 1)?;
    println!("pending: {:?}", helper.pending_updates());

    helper.pre_process();
    println!("postponed: {:?}", helper.postponed_updates());
    for position in 22..31 {
        println!(
            "pre-layout {position} -> {:?}",
            helper.find_position_offset(position)
        );
    }

    helper.consume_postponed_updates();
    println!("bound after update: {:?}", helper.callback().bound);
    Ok(())
}
