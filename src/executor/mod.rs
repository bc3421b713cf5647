mod models;
#[cfg(feature = "cli")]
mod printer;
mod request;
mod runner;

pub use models::{ExecutionError, ExecutionResult, ExecutionSuccess, ResponseData};
#[cfg(feature = "cli")]
pub use printer::{print_execution_result, render_data};
pub use request::{prepare_request, PreparedBody, PreparedRequest};
pub use runner::{execute, MAX_REDIRECTS, REQUEST_TIMEOUT};
