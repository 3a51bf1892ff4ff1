//! Core domain types and logic.

pub mod align;
pub mod bar;
pub mod cleaner;
pub mod config;
pub mod config_validation;
pub mod cross_asset;
pub mod error;
pub mod features;
pub mod indicator;
pub mod pipeline;
pub mod schema;
pub mod session;
pub mod split;
pub mod stats;
pub mod table;
pub mod targets;
pub mod universe;
