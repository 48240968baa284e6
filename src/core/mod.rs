pub mod error;
pub mod pipeline;
pub mod types;

pub use error::{AppError, DefaultErrorReporter, ErrorReporter};
pub use pipeline::{
    parse, parse_str, Config, DecodeError, Job, Parameter, Workflow, WorkflowJob, Workflows,
};
pub use types::*;
