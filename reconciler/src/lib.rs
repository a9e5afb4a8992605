//! A headless adapter update reconciliation engine.
//!
//! For host-side bookkeeping of bound items and consistency checks, see the `reconciler-host`
//! crate.
//!
//! A list-backed data source reports position-based mutations (insert, remove, move, range
//! change). This crate turns that stream into something a layout pass can consume:
//!
//! - adjacent mutations of the same kind are coalesced,
//! - moves are pushed behind every other op (see [`reorder`]),
//! - ops are split into a pre-layout pass and a post-layout pass, so items that are currently
//!   bound stay in place while the pre-layout is computed,
//! - positions can be mapped between the pre-layout and post-layout snapshots.
//!
//! It is UI-agnostic. A host is expected to provide, through [`UpdateCallback`]:
//! - which positions currently have a bound item
//! - how to shift bound item positions when an op is applied
//! - sinks for the two dispatch passes
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod error;
mod helper;
mod op;
mod options;
mod pool;
pub mod reorder;


pub use error::UpdateError;
pub use helper::{AdapterHelper, UpdateCallback};
pub use op::{UpdateCmd, UpdateOp, UpdateTypes};
pub use options::HelperOptions;
pub use pool::{DEFAULT_POOL_SIZE, OpFactory, OpPool};
pub use reorder::reorder_ops;
