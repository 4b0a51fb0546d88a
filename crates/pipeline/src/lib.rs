//! Encoder process orchestration.
//!
//! - [`launcher`] spawns the external encoder and turns its stdout, stderr
//!   and exit status into one ordered event stream per job.
//! - [`orchestrator`] owns the per-job tasks: it classifies stdout chunks,
//!   writes status changes to the registry and emits them on the
//!   dispatcher.

pub mod launcher;
pub mod orchestrator;

pub use launcher::{EncoderLauncher, JobHandle, LaunchError, ProcessEvent, ProcessLauncher};
pub use orchestrator::{Orchestrator, OrchestratorConfig};
