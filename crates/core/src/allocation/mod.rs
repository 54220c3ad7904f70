//! Money allocation primitives.
//!
//! - Outstanding and settled checks for a single document
//! - The oldest-first waterfall that spreads one amount over open items
//! - `PaidState`, the recompute formula shared by every balance writer

pub mod balance;
pub mod waterfall;

#[cfg(test)]
mod waterfall_props;

pub use balance::{PaidState, is_settled, outstanding};
pub use waterfall::{Allocation, OpenItem, WaterfallResult, apply_waterfall, sort_oldest_first};
