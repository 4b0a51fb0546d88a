//! Domain logic for the encodrop job orchestrator.
//!
//! Everything in this crate is free of process and network I/O except the
//! [`ffmpeg`] preflight probe, so the pipeline and API crates can share the
//! job model, progress protocol and registry.

pub mod encoder;
pub mod error;
pub mod ffmpeg;
pub mod job;
pub mod job_events;
pub mod naming;
pub mod progress;
pub mod registry;
pub mod token;
pub mod types;
