use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use reconciler::{AdapterHelper, HelperOptions, UpdateCmd, UpdateOp};

use crate::{BoundItems, RecordingHost, ScenarioError};

/// A uniquely identified list item. `version` counts the updates it went through.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ScenarioItem {
    pub id: u64,
    pub version: u32,
}

/// Number of ops a layout cycle dispatched in each pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DispatchCounts {
    pub first_pass: usize,
    pub second_pass: usize,
}

/// Whether `op` can be applied to a list of `len` items.
pub fn fits<P>(op: &UpdateOp<P>, len: usize) -> bool {
    match op.cmd {
        UpdateCmd::Add => op.position_start <= len,
        UpdateCmd::Remove | UpdateCmd::Update => op
            .position_start
            .checked_add(op.item_count)
            .is_some_and(|end| end <= len),
        UpdateCmd::Move => op.position_start < len && op.item_count < len,
    }
}

/// Applies `ops` to `items` in order. Stops at the first op that does not fit.
pub fn replay_ops<T, P>(
    items: &mut Vec<T>,
    ops: &[UpdateOp<P>],
    mut insert: impl FnMut() -> T,
    mut update: impl FnMut(&mut T, Option<&P>),
) -> Result<(), ScenarioError> {
    for op in ops {
        if !fits(op, items.len()) {
            return Err(ScenarioError::OutOfBounds {
                cmd: op.cmd,
                position_start: op.position_start,
                item_count: op.item_count,
                len: items.len(),
            });
        }
        op.apply_to(items, &mut insert, &mut update);
    }
    Ok(())
}

/// Stands in for an insertion the replay asked for but the data source never made.
const MISSING: ScenarioItem = ScenarioItem {
    id: u64::MAX,
    version: 0,
};

/// A data source, a window of bound items and an [`AdapterHelper`] driven together.
///
/// Mutations are applied to the list right away and reported to the helper. [`Self::layout`]
/// then runs one full reconciliation cycle and checks it against the list:
///
/// 1. every bound item's position maps through the pending ops to its current index,
/// 2. no first-pass op covers a bound item,
/// 3. every pre-layout position maps to the current index of the item it holds,
/// 4. bound items keep contiguous layout positions,
/// 5. replaying both passes over the previous list yields the current list.
///
/// After an error the scenario is left mid-cycle and should be dropped.
#[derive(Clone, Debug)]
pub struct Scenario {
    items: Vec<ScenarioItem>,
    snapshot: Vec<ScenarioItem>,
    added: Vec<ScenarioItem>,
    next_id: u64,
    visible_start: usize,
    visible_count: usize,
    helper: AdapterHelper<RecordingHost<u64>>,
}

impl Scenario {
    pub fn new(item_count: usize, visible_start: usize, visible_count: usize) -> Self {
        Self::with_options(item_count, visible_start, visible_count, HelperOptions::default())
    }

    pub fn with_options(
        item_count: usize,
        visible_start: usize,
        visible_count: usize,
        options: HelperOptions,
    ) -> Self {
        let items: Vec<ScenarioItem> = (0..item_count as u64)
            .map(|id| ScenarioItem { id, version: 0 })
            .collect();
        let mut scenario = Self {
            snapshot: items.clone(),
            items,
            added: Vec::new(),
            next_id: item_count as u64,
            visible_start,
            visible_count,
            helper: AdapterHelper::with_options(RecordingHost::default(), options),
        };
        scenario.bind_window();
        scenario
    }

    pub fn items(&self) -> &[ScenarioItem] {
        &self.items
    }

    pub fn helper(&self) -> &AdapterHelper<RecordingHost<u64>> {
        &self.helper
    }

    pub fn host(&self) -> &RecordingHost<u64> {
        self.helper.callback()
    }

    /// Inserts `item_count` new items. Returns whether an update pass needs to be scheduled.
    pub fn add(&mut self, position_start: usize, item_count: usize) -> Result<bool, ScenarioError> {
        self.check_fits(UpdateOp::add(position_start, item_count))?;
        for offset in 0..item_count {
            let item = ScenarioItem {
                id: self.next_id,
                version: 0,
            };
            self.next_id += 1;
            self.items.insert(position_start + offset, item);
            self.added.push(item);
        }
        Ok(self
            .helper
            .on_item_range_inserted(position_start, item_count)?)
    }

    pub fn rm(&mut self, position_start: usize, item_count: usize) -> Result<bool, ScenarioError> {
        self.check_fits(UpdateOp::remove(position_start, item_count))?;
        self.items
            .drain(position_start..position_start + item_count);
        Ok(self.helper.on_item_range_removed(position_start, item_count)?)
    }

    pub fn mv(&mut self, from: usize, to: usize) -> Result<bool, ScenarioError> {
        self.check_fits(UpdateOp::moved(from, to))?;
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(self.helper.on_item_range_moved(from, to, 1)?)
    }

    pub fn up(&mut self, position_start: usize, item_count: usize) -> Result<bool, ScenarioError> {
        self.check_fits(UpdateOp::update(position_start, item_count, None))?;
        for item in &mut self.items[position_start..position_start + item_count] {
            item.version += 1;
        }
        Ok(self
            .helper
            .on_item_range_changed(position_start, item_count, None)?)
    }

    fn check_fits(&self, op: UpdateOp) -> Result<(), ScenarioError> {
        if fits(&op, self.items.len()) {
            Ok(())
        } else {
            Err(ScenarioError::OutOfBounds {
                cmd: op.cmd,
                position_start: op.position_start,
                item_count: op.item_count,
                len: self.items.len(),
            })
        }
    }

    /// Runs one reconciliation cycle and checks it against the data source.
    pub fn layout(&mut self) -> Result<DispatchCounts, ScenarioError> {
        hdebug!(
            pending = self.helper.pending_updates().len(),
            items = self.items.len(),
            "Scenario::layout"
        );
        let index_of: BTreeMap<u64, usize> = self
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| (item.id, index))
            .collect();

        for bound in self.helper.callback().bound().iter() {
            let expected = index_of.get(bound.key()).copied();
            let actual = usize::try_from(bound.position())
                .ok()
                .and_then(|position| self.helper.apply_pending_updates_to_position(position));
            if actual != expected {
                return Err(ScenarioError::StalePosition {
                    position: bound.position(),
                    expected,
                    actual,
                });
            }
        }

        self.helper.pre_process();
        if let Some(op) = self.host().conflicts().first() {
            return Err(ScenarioError::FirstPassConflict { op: op.clone() });
        }

        let mut added = self.added.iter().copied();
        let mut insert = || added.next().unwrap_or(MISSING);
        let bump = |item: &mut ScenarioItem, _: Option<&()>| item.version += 1;

        let mut list = self.snapshot.clone();
        replay_ops(&mut list, self.host().first_pass(), &mut insert, bump)?;
        for (position, item) in list.iter().enumerate() {
            let expected = index_of.get(&item.id).copied();
            let actual = self.helper.find_position_offset(position);
            if actual != expected {
                return Err(ScenarioError::PreLayoutMismatch {
                    position,
                    expected,
                    actual,
                });
            }
        }

        let layout = self.host().bound().layout_positions();
        if let Some(&first) = layout.first() {
            for (index, &actual) in layout.iter().enumerate() {
                let expected = first + index as isize;
                if actual != expected {
                    return Err(ScenarioError::Discontinuous {
                        index,
                        expected,
                        actual,
                    });
                }
            }
        }

        self.helper.consume_postponed_updates();
        replay_ops(&mut list, self.host().second_pass(), &mut insert, bump)?;
        if let Some(position) = first_difference(&list, &self.items) {
            return Err(ScenarioError::ReplayMismatch { position });
        }

        let counts = DispatchCounts {
            first_pass: self.host().first_pass().len(),
            second_pass: self.host().second_pass().len(),
        };
        hdebug!(
            first_pass = counts.first_pass,
            second_pass = counts.second_pass,
            "Scenario::layout done"
        );
        self.commit();
        Ok(counts)
    }

    fn commit(&mut self) {
        self.snapshot.clone_from(&self.items);
        self.added.clear();
        self.helper.callback_mut().clear_log();
        self.bind_window();
    }

    fn bind_window(&mut self) {
        let end = self
            .visible_start
            .saturating_add(self.visible_count)
            .min(self.items.len());
        let bound: &mut BoundItems<u64> = self.helper.callback_mut().bound_mut();
        bound.clear();
        for position in self.visible_start..end {
            bound.bind(position, self.items[position].id);
        }
    }
}

fn first_difference<T: PartialEq>(a: &[T], b: &[T]) -> Option<usize> {
    a.iter()
        .zip(b)
        .position(|(x, y)| x != y)
        .or_else(|| (a.len() != b.len()).then(|| a.len().min(b.len())))
}
