//! Test execution engine.

use std::time::Instant;

use frankenprintf_core::RoundingMode;

use crate::error::HarnessError;
use crate::execute::{execute_fixture_case, parse_mode};
use crate::fixtures::{FixtureCase, FixtureSet};
use crate::structured_log::{CASE_EVENT, LogEmitter, LogEntry, LogLevel, Outcome, StreamKind};
use crate::verify::{Observed, VerificationResult};

/// Canonical fixture name of a rounding mode.
#[must_use]
pub fn mode_name(mode: RoundingMode) -> &'static str {
    match mode {
        RoundingMode::NearestEven => "nearest",
        RoundingMode::Upward => "upward",
        RoundingMode::Downward => "downward",
        RoundingMode::TowardZero => "towardzero",
    }
}

/// Every rounding mode, in report order.
pub const ALL_MODES: [RoundingMode; 4] = [
    RoundingMode::NearestEven,
    RoundingMode::Upward,
    RoundingMode::Downward,
    RoundingMode::TowardZero,
];

/// Runs a fixture set under one rounding mode and collects verification results.
pub struct TestRunner {
    /// Name of the test campaign.
    pub campaign: String,
    /// Rounding mode the engine runs in.
    pub mode: RoundingMode,
}

impl TestRunner {
    #[must_use]
    pub fn new(campaign: impl Into<String>, mode: RoundingMode) -> Self {
        Self {
            campaign: campaign.into(),
            mode,
        }
    }

    /// Runner for a mode given by name (`nearest`, `upward`, ...).
    pub fn for_mode_name(campaign: impl Into<String>, mode: &str) -> Result<Self, HarnessError> {
        Ok(Self::new(campaign, parse_mode(mode)?))
    }

    /// Run all matching fixtures in a set and return results.
    pub fn run(&self, fixture_set: &FixtureSet) -> Vec<VerificationResult> {
        self.run_logged(fixture_set, None)
    }

    /// Like [`TestRunner::run`], emitting one `printf.case` record per case.
    pub fn run_logged(
        &self,
        fixture_set: &FixtureSet,
        mut log: Option<&mut LogEmitter>,
    ) -> Vec<VerificationResult> {
        fixture_set
            .cases
            .iter()
            .filter(|case| mode_matches(self.mode, &case.mode))
            .map(|case| {
                let started = Instant::now();
                let result = self.verify_case(&fixture_set.family, case);
                let latency_ns = u64::try_from(started.elapsed().as_nanos()).unwrap_or(u64::MAX);
                if let Some(log) = log.as_deref_mut() {
                    // Logging failures never change the verdict.
                    let _ = log.emit_entry(case_entry(&result, latency_ns));
                }
                result
            })
            .collect()
    }

    fn verify_case(&self, family: &str, case: &FixtureCase) -> VerificationResult {
        let mode = mode_name(self.mode);
        let (actual, actual_errno) = match execute_fixture_case(case, self.mode) {
            Ok(run) => (run.output, run.errno),
            Err(err) => (format!("unsupported:{err}"), -1),
        };
        let seen = Observed {
            expected: &case.expected_output,
            actual: &actual,
            expected_errno: case.expected_errno,
            actual_errno,
        };
        let mismatch = seen.mismatch();
        let diff = seen.explain();
        let case_name = if case.mode.eq_ignore_ascii_case("all") {
            format!("{} [{mode}]", case.name)
        } else {
            case.name.clone()
        };
        VerificationResult {
            family: family.to_string(),
            symbol: case.function.clone(),
            mode: mode.to_string(),
            case_name,
            spec_section: case.spec_section.clone(),
            passed: mismatch.is_none(),
            mismatch,
            expected: case.expected_output.clone(),
            actual,
            expected_errno: case.expected_errno,
            actual_errno,
            diff,
        }
    }
}

fn mode_matches(active: RoundingMode, case_mode: &str) -> bool {
    case_mode.eq_ignore_ascii_case("all") || RoundingMode::from_str_loose(case_mode) == Some(active)
}

fn case_entry(result: &VerificationResult, latency_ns: u64) -> LogEntry {
    let (level, outcome) = if result.passed {
        (LogLevel::Info, Outcome::Pass)
    } else if result.actual.starts_with("unsupported:") {
        (LogLevel::Error, Outcome::Error)
    } else {
        (LogLevel::Warn, Outcome::Fail)
    };
    let mut entry = LogEntry::new("", level, CASE_EVENT)
        .with_stream(StreamKind::Conformance)
        .with_mode(result.mode.clone())
        .with_api(result.family.clone(), result.symbol.clone())
        .with_case(result.case_name.clone())
        .with_outcome(outcome)
        .with_errno(result.actual_errno)
        .with_latency_ns(latency_ns);
    if !result.passed {
        entry = entry.with_details(serde_json::json!({
            "expected": result.expected,
            "actual": result.actual,
            "expected_errno": result.expected_errno,
        }));
    }
    entry
}

/// Run every set under every mode.
#[must_use]
pub fn run_all_modes(
    campaign: &str,
    sets: &[FixtureSet],
    mut log: Option<&mut LogEmitter>,
) -> Vec<VerificationResult> {
    let mut results = Vec::new();
    for mode in ALL_MODES {
        let runner = TestRunner::new(campaign, mode);
        for set in sets {
            results.extend(runner.run_logged(set, log.as_deref_mut()));
        }
    }
    results
}
