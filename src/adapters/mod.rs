//! Concrete adapter implementations for ports.

pub mod csv_bar_source;
pub mod csv_stats_writer;
pub mod file_config_adapter;
pub mod ipc_split_sink;
