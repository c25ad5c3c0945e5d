//! Knot detection over predicted structures.
//!
//! - [`window`]: plans overlapping residue windows for long sequences
//! - [`quality`]: reduces pLDDT values to a reliability score
//! - [`fragment`]: drives a single fragment from sequence to verdict
//! - [`artifacts`]: persists predicted structures
//! - [`pipeline`]: chooses direct or windowed mode and aggregates a report

pub mod artifacts;
pub mod fragment;
pub mod pipeline;
pub mod quality;
pub mod window;
