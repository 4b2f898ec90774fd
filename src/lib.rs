pub mod builder;
pub mod config;
pub mod errors;
pub mod job;
pub mod odisf;
pub mod params;
pub mod resolver;
pub mod traits;

pub mod mocks;

pub use builder::apply_configuration;
pub use config::{ArgName, ArgValue, RawArguments};
pub use errors::{Domain, InputRole, JobFailure, JobStep, OdisfError, Result};
pub use job::{run_command, run_job, write_labels, CommandOutcome, Job, JobReport, JobState};
pub use odisf::{Odisf, OdisfEngine};
pub use params::{OdisfConfig, SamplingStrategy};
pub use resolver::{check_output_path, resolve_inputs, LabelDepth, ResolvedInputs};
pub use traits::*;
