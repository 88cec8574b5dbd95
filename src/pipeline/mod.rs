//! Dubbing pipeline orchestration.
//!
//! Six stages run strictly in order per job: Acquire → Separate →
//! Transcribe → Translate → Synthesize → Mix. The orchestrator is the
//! only writer of job state and the single place where stage failures
//! turn into a failed job.

pub mod orchestrator;

pub use orchestrator::{Collaborators, Orchestrator};
