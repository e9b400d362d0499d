//! Entity type definitions
//!
//! - [`Item`] - a blend, unique by brand and blend name
//! - [`Tin`] - a tracked container of an item

pub mod item;
pub mod tin;

pub use item::{BlendType, Item};
pub use tin::{synced_quantity, Tin, TinConversion, TinUnit};
