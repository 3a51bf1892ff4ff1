//! Port traits: the seams between the pipeline and its collaborators.

pub mod bar_source;
pub mod config_port;
pub mod split_sink;
