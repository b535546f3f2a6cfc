pub mod bar;
pub mod batch;
pub mod config_validation;
pub mod driver;
pub mod error;
pub mod evaluator;
pub mod exit_rules;
pub mod ledger;
pub mod position;
pub mod strategy;
pub mod time_machine;
