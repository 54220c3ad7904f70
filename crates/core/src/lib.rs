//! Core business logic for Quarry.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and calculations live here.
//!
//! # Modules
//!
//! - `allocation` - Paid/outstanding arithmetic and the oldest-first waterfall
//! - `payment` - Payment types, validation, custody policy, unapplied credit
//! - `invoice` - Receipt grouping rules and invoice totals
//! - `settlement` - Customer/supplier netting and merge guards

pub mod allocation;
pub mod invoice;
pub mod payment;
pub mod settlement;
