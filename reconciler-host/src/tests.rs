use crate::*;

use alloc::vec::Vec;
use proptest::prelude::*;
use reconciler::{AdapterHelper, HelperOptions, UpdateCmd, UpdateOp};

struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_u64(&mut self) -> u64 {
        // Deterministic, dependency-free PRNG for tests. Low bits are weak, keep the high ones.
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 16
    }

    fn gen_range_usize(&mut self, start: usize, end_exclusive: usize) -> usize {
        debug_assert!(start < end_exclusive);
        let span = (end_exclusive - start) as u64;
        start + (self.next_u64() % span) as usize
    }

    fn gen_bool(&mut self) -> bool {
        (self.next_u64() & 1) == 1
    }
}

fn counts(first_pass: usize, second_pass: usize) -> DispatchCounts {
    DispatchCounts {
        first_pass,
        second_pass,
    }
}

fn window(start: usize, count: usize) -> BoundItems<u64> {
    let mut bound = BoundItems::new();
    for position in start..start + count {
        bound.bind(position, position as u64);
    }
    bound
}

// ── Bound items ─────────────────────────────────────────────────────────

#[test]
fn removed_items_are_parked_before_the_range() {
    let mut bound = window(0, 5);
    bound.offset_for_remove(1, 2, false);

    let positions: Vec<isize> = bound.iter().map(BoundItem::position).collect();
    assert_eq!(positions, alloc::vec![0, 0, 0, 1, 2]);
    let removed: Vec<bool> = bound.iter().map(BoundItem::is_removed).collect();
    assert_eq!(removed, alloc::vec![false, true, true, false, false]);
    // Laid-out removals keep the pre-layout state intact.
    assert_eq!(bound.layout_positions(), alloc::vec![0, 1, 2, 3, 4]);

    assert_eq!(bound.find(0).map(|item| *item.key()), Some(0));
    assert_eq!(bound.find(1).map(|item| *item.key()), Some(3));
    assert!(bound.find(3).is_none());
}

#[test]
fn invisible_removal_shifts_the_pre_layout_state() {
    let mut bound = window(3, 3);
    bound.offset_for_remove(0, 2, true);
    assert_eq!(bound.layout_positions(), alloc::vec![1, 2, 3]);
    let old: Vec<Option<isize>> = bound.iter().map(BoundItem::old_position).collect();
    assert_eq!(old, alloc::vec![Some(3), Some(4), Some(5)]);

    bound.clear_old_positions();
    assert!(bound.iter().all(|item| item.old_position().is_none()));
    assert_eq!(bound.layout_positions(), alloc::vec![1, 2, 3]);
}

#[test]
fn moves_shift_the_items_in_between() {
    let mut bound = window(0, 5);
    bound.offset_for_move(1, 3);
    let positions: Vec<isize> = bound.iter().map(BoundItem::position).collect();
    assert_eq!(positions, alloc::vec![0, 3, 1, 2, 4]);

    bound.offset_for_move(3, 0);
    let positions: Vec<isize> = bound.iter().map(BoundItem::position).collect();
    assert_eq!(positions, alloc::vec![1, 0, 2, 3, 4]);
}

#[test]
fn adds_shift_items_at_or_after_the_start() {
    let mut bound = window(2, 3);
    bound.offset_for_add(3, 4);
    let positions: Vec<isize> = bound.iter().map(BoundItem::position).collect();
    assert_eq!(positions, alloc::vec![2, 7, 8]);
}

#[test]
fn payloads_accumulate_until_a_full_update() {
    let mut bound: BoundItems<u64, &'static str> = BoundItems::new();
    for position in 0..3 {
        bound.bind(position, position as u64);
    }
    bound.mark_updated(0, 2, Some(&"a"));
    bound.mark_updated(1, 1, Some(&"b"));

    let items: Vec<&BoundItem<u64, &str>> = bound.iter().collect();
    assert_eq!(items[0].payloads(), &["a"]);
    assert_eq!(items[1].payloads(), &["a", "b"]);
    assert!(!items[2].is_updated());

    bound.mark_updated(0, 1, None);
    bound.mark_updated(0, 1, Some(&"c"));
    let first = bound.iter().next().unwrap();
    assert!(first.is_updated());
    assert!(first.is_full_update());
    assert!(first.payloads().is_empty());

    bound.clear_old_positions();
    assert!(bound.iter().all(|item| !item.is_updated() && item.payloads().is_empty()));
}

// ── Recording host ──────────────────────────────────────────────────────

#[test]
fn recording_host_maps_pre_layout_positions() {
    let mut helper = AdapterHelper::new(RecordingHost::new(window(25, 10)));
    helper.on_item_range_removed(24, 5).unwrap();
    helper.pre_process();

    assert_eq!(helper.callback().first_pass(), &[UpdateOp::remove(24, 1)]);
    assert!(helper.callback().conflicts().is_empty());
    assert_eq!(helper.callback().processed(), 1);

    let mapped: Vec<Option<usize>> = (23..30)
        .map(|position| helper.find_position_offset(position))
        .collect();
    assert_eq!(
        mapped,
        alloc::vec![Some(23), None, None, None, None, Some(24), Some(25)]
    );

    helper.consume_postponed_updates();
    assert_eq!(helper.callback().second_pass(), &[UpdateOp::remove(24, 4)]);
    let removed = helper
        .callback()
        .bound()
        .iter()
        .filter(|item| item.is_removed())
        .count();
    assert_eq!(removed, 4);
}

#[test]
fn recording_host_collects_update_payloads() {
    let mut bound: BoundItems<u64, u32> = BoundItems::new();
    bound.bind(4, 4);
    let mut helper = AdapterHelper::new(RecordingHost::new(bound));
    helper.on_item_range_changed(3, 3, Some(7)).unwrap();
    helper.pre_process();
    helper.consume_postponed_updates();

    let item = helper.callback().bound().iter().next().unwrap();
    assert_eq!(item.payloads(), &[7]);
    // Only the bound position waits, the invisible neighbours go out in the first pass.
    assert_eq!(
        helper.callback().first_pass(),
        &[UpdateOp::update(3, 1, Some(7)), UpdateOp::update(5, 1, Some(7))]
    );
    assert_eq!(
        helper.callback().second_pass(),
        &[UpdateOp::update(4, 1, Some(7))]
    );
}

#[test]
fn clear_log_keeps_bound_items() {
    let mut helper = AdapterHelper::new(RecordingHost::new(window(0, 2)));
    helper.on_item_range_removed(5, 1).unwrap();
    helper.pre_process();
    helper.callback_mut().clear_log();
    assert!(helper.callback().first_pass().is_empty());
    assert_eq!(helper.callback().processed(), 0);
    assert_eq!(helper.callback().bound().len(), 2);
}

// ── Replay ──────────────────────────────────────────────────────────────

#[test]
fn replay_rejects_ops_that_do_not_fit() {
    let mut list = alloc::vec![0, 1, 2, 3];
    let ops = [UpdateOp::<()>::remove(1, 1), UpdateOp::remove(3, 5)];
    let err = replay_ops(&mut list, &ops, || 9, |_, _| {}).unwrap_err();
    assert_eq!(
        err,
        ScenarioError::OutOfBounds {
            cmd: UpdateCmd::Remove,
            position_start: 3,
            item_count: 5,
            len: 3
        }
    );
    // Ops before the bad one were applied.
    assert_eq!(list, alloc::vec![0, 2, 3]);

    assert!(fits(&UpdateOp::<()>::add(3, 10), 3));
    assert!(!fits(&UpdateOp::<()>::moved(0, 3), 3));
    assert!(!fits(&UpdateOp::<()>::update(usize::MAX, 2, None), 3));
}

// ── Scenarios ───────────────────────────────────────────────────────────

#[test]
fn removing_a_bound_item_waits_for_the_second_pass() {
    let mut scenario = Scenario::new(10, 2, 3);
    scenario.rm(2, 1).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(0, 1)));
}

#[test]
fn removing_an_invisible_item_goes_to_the_first_pass() {
    let mut scenario = Scenario::new(10, 3, 4);
    scenario.rm(2, 1).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(1, 0)));
}

#[test]
fn adds_and_moves_are_second_pass_only() {
    let mut scenario = Scenario::new(10, 0, 5);
    scenario.add(3, 2).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(0, 1)));

    scenario.mv(8, 1).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(0, 1)));
}

#[test]
fn update_straddling_the_window_is_split() {
    let mut scenario = Scenario::new(20, 0, 5);
    scenario.up(3, 5).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(1, 1)));
}

#[test]
fn first_mutation_schedules_an_update_pass() {
    let mut scenario = Scenario::new(10, 0, 3);
    assert_eq!(scenario.add(0, 1), Ok(true));
    assert_eq!(scenario.add(1, 1), Ok(false));
    assert_eq!(scenario.rm(5, 1), Ok(false));
    scenario.layout().unwrap();
    assert_eq!(scenario.rm(5, 1), Ok(true));
}

#[test]
fn out_of_bounds_mutations_leave_the_list_alone() {
    let mut scenario = Scenario::new(10, 0, 3);
    assert_eq!(
        scenario.rm(8, 5),
        Err(ScenarioError::OutOfBounds {
            cmd: UpdateCmd::Remove,
            position_start: 8,
            item_count: 5,
            len: 10
        })
    );
    assert!(scenario.mv(0, 10).is_err());
    assert!(scenario.up(10, 1).is_err());
    assert!(scenario.add(11, 1).is_err());
    assert_eq!(scenario.items().len(), 10);
    assert!(!scenario.helper().has_updates());
}

#[test]
fn mixed_batches_across_several_cycles() {
    let mut scenario = Scenario::new(30, 5, 8);
    scenario.add(0, 3).unwrap();
    scenario.rm(10, 2).unwrap();
    scenario.mv(1, 12).unwrap();
    scenario.layout().unwrap();

    scenario.mv(0, 20).unwrap();
    scenario.up(4, 10).unwrap();
    scenario.rm(6, 1).unwrap();
    scenario.add(6, 4).unwrap();
    scenario.layout().unwrap();

    scenario.rm(0, 6).unwrap();
    scenario.mv(12, 2).unwrap();
    scenario.rm(2, 1).unwrap();
    scenario.layout().unwrap();
    assert!(!scenario.helper().has_updates());
}

#[test]
fn items_added_and_removed_in_one_cycle() {
    let mut scenario = Scenario::new(12, 2, 6);
    scenario.add(4, 3).unwrap();
    scenario.rm(5, 1).unwrap();
    scenario.up(3, 4).unwrap();
    scenario.mv(5, 0).unwrap();
    scenario.rm(0, 2).unwrap();
    scenario.layout().unwrap();
}

#[test]
fn moved_bound_item_is_removed_later_in_the_batch() {
    let mut scenario = Scenario::new(15, 4, 4);
    scenario.mv(5, 12).unwrap();
    scenario.mv(2, 6).unwrap();
    scenario.rm(10, 4).unwrap();
    scenario.up(0, 5).unwrap();
    scenario.layout().unwrap();
}

#[test]
fn empty_window_and_empty_list() {
    let mut scenario = Scenario::new(0, 0, 0);
    scenario.add(0, 5).unwrap();
    scenario.mv(4, 0).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(0, 2)));

    scenario.rm(0, 5).unwrap();
    assert_eq!(scenario.layout(), Ok(counts(1, 0)));
    assert!(scenario.items().is_empty());
}

fn random_step(scenario: &mut Scenario, rng: &mut Lcg) {
    let len = scenario.items().len();
    let result = match rng.gen_range_usize(0, 4) {
        0 if len > 1 => {
            let start = rng.gen_range_usize(0, len - 1);
            let count = rng.gen_range_usize(1, len - start + 1);
            scenario.rm(start, count)
        }
        1 => {
            let start = rng.gen_range_usize(0, len + 1);
            let count = rng.gen_range_usize(0, 50);
            scenario.add(start, count)
        }
        2 if len >= 2 => {
            let from = rng.gen_range_usize(0, len);
            let to = (from + rng.gen_range_usize(1, len)) % len;
            scenario.mv(from, to)
        }
        3 if len > 1 => {
            let start = rng.gen_range_usize(0, len - 1);
            let count = rng.gen_range_usize(1, len - start + 1);
            scenario.up(start, count)
        }
        _ => Ok(false),
    };
    result.unwrap();
}

#[test]
fn random_scenarios_stay_consistent() {
    for seed in 0..400u64 {
        let mut rng = Lcg::new(seed);
        let len = rng.gen_range_usize(10, 110);
        let visible_start = rng.gen_range_usize(0, len - 1);
        let visible_count = rng.gen_range_usize(1, len - visible_start + 1);
        let options = HelperOptions::new()
            .with_coalesce(rng.gen_bool())
            .with_disable_recycler(rng.gen_bool());
        let mut scenario = Scenario::with_options(len, visible_start, visible_count, options);

        for cycle in 0..3 {
            let op_count = rng.gen_range_usize(1, 16);
            for _ in 0..op_count {
                random_step(&mut scenario, &mut rng);
            }
            if let Err(err) = scenario.layout() {
                panic!("seed {seed} cycle {cycle}: {err}");
            }
        }
    }
}

proptest! {
    #[test]
    fn scenario_layout_matches_the_data_source(
        len in 1usize..60,
        visible_start in 0usize..60,
        visible_count in 1usize..20,
        raw in proptest::collection::vec((0u8..4, any::<u16>(), any::<u16>()), 0..24),
    ) {
        let mut scenario = Scenario::new(len, visible_start % len, visible_count);
        for (kind, a, b) in raw {
            let (a, b) = (a as usize, b as usize);
            let len = scenario.items().len();
            let result = match kind {
                0 if len > 0 => {
                    let start = a % len;
                    scenario.rm(start, 1 + b % (len - start).min(8))
                }
                1 => scenario.add(a % (len + 1), b % 6),
                2 if len >= 2 => {
                    let from = a % len;
                    scenario.mv(from, (from + 1 + b % (len - 1)) % len)
                }
                3 if len > 0 => {
                    let start = a % len;
                    scenario.up(start, 1 + b % (len - start))
                }
                _ => Ok(false),
            };
            prop_assert!(result.is_ok());
        }
        let layout = scenario.layout();
        prop_assert!(layout.is_ok(), "{:?}", layout);
    }
}
