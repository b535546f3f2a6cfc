pub mod csv_report_adapter;
pub mod csv_store_adapter;
pub mod file_config_adapter;
pub mod flow_signal_adapter;
pub mod memory_store_adapter;
