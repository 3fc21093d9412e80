use msp_solver::driver::DriverError;
use msp_solver::instance::InstanceError;
use msp_solver::model::ModelError;
use msp_solver::report::ValidationError;
use thiserror::Error;

pub(crate) type MspResult<T> = Result<T, MspError>;

#[derive(Error, Debug)]
pub(crate) enum MspError {
    #[error("The instance is invalid, more details: {0}")]
    InvalidInstance(#[from] InstanceError),
    #[error("The model could not be built, more details: {0}")]
    Model(#[from] ModelError),
    #[error("The search could not be started, more details: {0}")]
    Driver(#[from] DriverError),
    #[error("The solution does not satisfy the instance, more details: {0}")]
    InvalidSolution(#[from] ValidationError),
    #[error("The calendar encoding has no objective; use `--mode satisfy`.")]
    CalendarOptimisation,
}
