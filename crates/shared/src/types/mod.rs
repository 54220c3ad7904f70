//! Common types used across the application.

pub mod id;
pub mod money;
pub mod pagination;

pub use id::*;
pub use money::{
    EPSILON, MAX_MONEY, MAX_QUANTITY, fits_money_column, is_positive_money, round_money,
};
pub use pagination::{PageMeta, PageRequest, PageResponse};
