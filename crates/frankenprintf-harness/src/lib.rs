//! Conformance testing harness for frankenprintf.
//!
//! This crate provides:
//! - Fixtures: JSON printf cases with expected glibc output
//! - Verification: run fixtures through the engine under each rounding mode
//! - Structured logging: one JSONL record per verified case
//! - Report generation: markdown + JSON conformance reports

#![forbid(unsafe_code)]

pub mod diff;
pub mod error;
pub mod execute;
pub mod fixtures;
pub mod report;
pub mod runner;
pub mod structured_log;
pub mod verify;

pub use error::HarnessError;
pub use fixtures::{FixtureCase, FixtureSet};
pub use report::ConformanceReport;
pub use runner::TestRunner;
pub use verify::{Mismatch, VerificationResult, VerificationSummary};
