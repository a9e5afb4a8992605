use alloc::vec::Vec;
use core::fmt;

bitflags::bitflags! {
    /// A set of [`UpdateCmd`] kinds, used to ask whether any op of a kind is outstanding.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UpdateTypes: u8 {
        const ADD = 1;
        const REMOVE = 1 << 1;
        const UPDATE = 1 << 2;
        const MOVE = 1 << 3;
    }
}

/// The kind of a list mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateCmd {
    Add,
    Remove,
    Update,
    Move,
}

impl UpdateCmd {
    pub(crate) fn types(self) -> UpdateTypes {
        match self {
            Self::Add => UpdateTypes::ADD,
            Self::Remove => UpdateTypes::REMOVE,
            Self::Update => UpdateTypes::UPDATE,
            Self::Move => UpdateTypes::MOVE,
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "rm",
            Self::Update => "up",
            Self::Move => "mv",
        }
    }
}

/// A single position-based mutation of an adapter's item list.
///
/// For [`UpdateCmd::Move`], `position_start` is the index the item is moved *from* and
/// `item_count` is the index it is moved *to*. Moves always relocate exactly one item.
///
/// `payload` is only meaningful for [`UpdateCmd::Update`]. It is carried through every split
/// and merge untouched and handed back to the host in dispatch callbacks.
#[derive(Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateOp<P = ()> {
    pub cmd: UpdateCmd,
    pub position_start: usize,
    pub item_count: usize,
    pub payload: Option<P>,
}

impl<P> UpdateOp<P> {
    pub fn new(cmd: UpdateCmd, position_start: usize, item_count: usize, payload: Option<P>) -> Self {
        Self {
            cmd,
            position_start,
            item_count,
            payload,
        }
    }

    pub fn add(position_start: usize, item_count: usize) -> Self {
        Self::new(UpdateCmd::Add, position_start, item_count, None)
    }

    pub fn remove(position_start: usize, item_count: usize) -> Self {
        Self::new(UpdateCmd::Remove, position_start, item_count, None)
    }

    pub fn update(position_start: usize, item_count: usize, payload: Option<P>) -> Self {
        Self::new(UpdateCmd::Update, position_start, item_count, payload)
    }

    pub fn moved(from: usize, to: usize) -> Self {
        Self::new(UpdateCmd::Move, from, to, None)
    }

    pub fn is_move(&self) -> bool {
        self.cmd == UpdateCmd::Move
    }

    /// Exclusive end of the affected range. Not meaningful for moves.
    pub fn end(&self) -> usize {
        self.position_start + self.item_count
    }

    /// Applies this op to a concrete item list.
    ///
    /// `insert` produces the items for an [`UpdateCmd::Add`] in insertion order, `update` is
    /// called once per item touched by an [`UpdateCmd::Update`].
    ///
    /// # Panics
    /// Panics if the op does not fit `items` (e.g. removing past the end).
    pub fn apply_to<T>(
        &self,
        items: &mut Vec<T>,
        mut insert: impl FnMut() -> T,
        mut update: impl FnMut(&mut T, Option<&P>),
    ) {
        match self.cmd {
            UpdateCmd::Add => {
                for i in 0..self.item_count {
                    items.insert(self.position_start + i, insert());
                }
            }
            UpdateCmd::Remove => {
                items.drain(self.position_start..self.end());
            }
            UpdateCmd::Update => {
                for item in &mut items[self.position_start..self.end()] {
                    update(item, self.payload.as_ref());
                }
            }
            UpdateCmd::Move => {
                let item = items.remove(self.position_start);
                items.insert(self.item_count, item);
            }
        }
    }
}

impl<P: fmt::Debug> fmt::Debug for UpdateOp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{})",
            self.cmd.short_name(),
            self.position_start,
            self.item_count
        )?;
        if let Some(payload) = &self.payload {
            write!(f, "[{payload:?}]")?;
        }
        Ok(())
    }
}

impl<P> fmt::Display for UpdateOp<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({},{})",
            self.cmd.short_name(),
            self.position_start,
            self.item_count
        )
    }
}
