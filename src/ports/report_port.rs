//! Result reporting port: persists a finished simulation's trade log,
//! mark series, and evaluation for audit.

use crate::domain::driver::SimulationResult;
use crate::domain::error::LookbackError;

pub trait ReportPort {
    fn write_result(&self, result: &SimulationResult) -> Result<(), LookbackError>;
}
