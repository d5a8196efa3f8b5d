//! Validate resource requests, render batch scripts and hand them to the scheduler

/// Partitions and their resource ceilings
pub mod partition;

/// Wall time / partition / account checks shared by every job of one invocation
pub mod resource;

/// Per-file CPU and memory directives, checked against the partition
pub mod job_request;

/// Render batch script templates and write them next to the input
pub mod job;

/// Confirmation and sbatch
pub mod submit;
