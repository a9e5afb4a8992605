// Example: moves are pushed behind every other op without changing the result.
use reconciler::{OpPool, UpdateOp, reorder};

fn main() {
    let ops: Vec<UpdateOp> = vec![
        UpdateOp::moved(10, 15),
        UpdateOp::remove(2, 3),
        UpdateOp::moved(1, 6),
        UpdateOp::update(0, 4, None),
        UpdateOp::add(3, 2),
    ];
    let mut reordered = ops.clone();
    let mut pool = OpPool::default();
    reorder::reorder_ops(&mut reordered, &mut pool);

    println!("before: {ops:?}");
    println!("after:  {reordered:?}");
    println!(
        "moves last: {}",
        reorder::all_moves_at_the_end(&reordered)
    );

    // Both sequences produce the same list.
    let apply = |ops: &[UpdateOp]| {
        let mut items: Vec<String> = (0..20).map(|i| i.to_string()).collect();
        let mut next = 0;
        for op in ops {
            op.apply_to(
                &mut items,
                || {
                    next += 1;
                    format!("new{next}")
                },
                |item, _| item.push('*'),
            );
        }
        items
    };
    println!("same result: {}", apply(&ops) == apply(&reordered));
}
