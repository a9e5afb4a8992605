//! Reference host utilities for the `reconciler` crate.
//!
//! `reconciler` only talks to its host through [`reconciler::UpdateCallback`]. This crate
//! provides a framework-neutral implementation of that seam, plus a harness that drives it
//! against a real list:
//!
//! - [`BoundItems`]: bookkeeping for items bound to on-screen slots (positions, pre-layout
//!   positions, removed/updated flags, change payloads)
//! - [`RecordingHost`]: an `UpdateCallback` over `BoundItems` that records both dispatch passes
//! - [`Scenario`]: a data source plus a bound window, checked after every layout cycle
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod bound;
mod error;
mod host;
mod scenario;

#[cfg(test)]
mod tests;

pub use bound::{BoundItem, BoundItems};
pub use error::ScenarioError;
pub use host::RecordingHost;
pub use scenario::{DispatchCounts, Scenario, ScenarioItem, fits, replay_ops};
