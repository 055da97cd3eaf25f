//! Core logic for Sana.
//!
//! This crate has ZERO web or database dependencies. Storage and outbound
//! services are reached through traits implemented elsewhere.
//!
//! # Modules
//!
//! - `currency` - Rate cache, provider, conversion service and refresh loop
//! - `recalculation` - Re-deriving base-currency amounts after a base change
//! - `analytics` - Balances, category summaries, calendar rollups, time windows
//! - `advice` - Prompt construction and the text-completion boundary
//! - `category` - Default categories and name validation

pub mod advice;
pub mod analytics;
pub mod category;
pub mod currency;
pub mod recalculation;
