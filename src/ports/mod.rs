//! Port traits: the seams between the simulation core and its
//! collaborators (historical store, decision source, config, reports).

pub mod config_port;
pub mod decision_port;
pub mod report_port;
pub mod store_port;
