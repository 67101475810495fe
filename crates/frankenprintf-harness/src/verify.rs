//! Comparing what a printf call produced with what the fixture expects.
//!
//! A case is checked on two axes: the rendered text and the errno left
//! behind. Either one differing fails the case.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::diff;

/// Which part of a printf call disagreed with the fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mismatch {
    Output,
    Errno,
    Both,
}

impl Mismatch {
    /// Classify a finished call; `None` when text and errno both match.
    #[must_use]
    pub fn classify(output_matches: bool, errno_matches: bool) -> Option<Self> {
        match (output_matches, errno_matches) {
            (true, true) => None,
            (false, true) => Some(Self::Output),
            (true, false) => Some(Self::Errno),
            (false, false) => Some(Self::Both),
        }
    }

    #[must_use]
    pub fn output_differs(self) -> bool {
        matches!(self, Self::Output | Self::Both)
    }

    #[must_use]
    pub fn errno_differs(self) -> bool {
        matches!(self, Self::Errno | Self::Both)
    }
}

/// Outcome of one fixture case under one rounding mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Fixture family (e.g. `printf/float`).
    pub family: String,
    /// printf-family function exercised.
    pub symbol: String,
    pub mode: String,
    pub case_name: String,
    /// C/POSIX section reference.
    pub spec_section: String,
    pub passed: bool,
    #[serde(default)]
    pub mismatch: Option<Mismatch>,
    pub expected: String,
    /// Text the engine rendered, or `unsupported:<reason>`.
    pub actual: String,
    pub expected_errno: i32,
    pub actual_errno: i32,
    /// Human-readable explanation of a failure.
    pub diff: Option<String>,
}

/// What a fixture expects from a call, and what the call did.
#[derive(Debug, Clone, Copy)]
pub struct Observed<'a> {
    pub expected: &'a str,
    pub actual: &'a str,
    pub expected_errno: i32,
    pub actual_errno: i32,
}

impl Observed<'_> {
    #[must_use]
    pub fn mismatch(&self) -> Option<Mismatch> {
        Mismatch::classify(
            self.expected == self.actual,
            self.expected_errno == self.actual_errno,
        )
    }

    /// Line diff of the text and/or an errno line, depending on what
    /// differed.
    #[must_use]
    pub fn explain(&self) -> Option<String> {
        let mismatch = self.mismatch()?;
        let mut out = String::new();
        if mismatch.output_differs() {
            out.push_str(&diff::render_diff(self.expected, self.actual));
        }
        if mismatch.errno_differs() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!(
                "errno mismatch: expected={}, actual={}",
                self.expected_errno, self.actual_errno
            ));
        }
        Some(out)
    }
}

/// Pass/fail tallies for one fixture family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyTally {
    pub passed: usize,
    pub failed: usize,
}

/// Totals over a verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    /// Failures whose rendered text differed.
    #[serde(default)]
    pub output_mismatches: usize,
    /// Failures whose errno differed.
    #[serde(default)]
    pub errno_mismatches: usize,
    pub results: Vec<VerificationResult>,
}

impl VerificationSummary {
    #[must_use]
    pub fn from_results(results: Vec<VerificationResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let mismatches = || results.iter().filter_map(|r| r.mismatch);
        let output_mismatches = mismatches().filter(|m| m.output_differs()).count();
        let errno_mismatches = mismatches().filter(|m| m.errno_differs()).count();
        Self {
            total,
            passed,
            failed: total - passed,
            output_mismatches,
            errno_mismatches,
            results,
        }
    }

    #[must_use]
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &VerificationResult> {
        self.results.iter().filter(|r| !r.passed)
    }

    /// Tallies keyed by fixture family, in name order.
    #[must_use]
    pub fn by_family(&self) -> BTreeMap<&str, FamilyTally> {
        let mut out: BTreeMap<&str, FamilyTally> = BTreeMap::new();
        for r in &self.results {
            let tally = out.entry(r.family.as_str()).or_default();
            if r.passed {
                tally.passed += 1;
            } else {
                tally.failed += 1;
            }
        }
        out
    }

    /// One-line summary for the terminal.
    #[must_use]
    pub fn headline(&self) -> String {
        format!(
            "Verification complete: total={}, passed={}, failed={} (output={}, errno={})",
            self.total, self.passed, self.failed, self.output_mismatches, self.errno_mismatches
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed<'a>(expected: &'a str, actual: &'a str, errno: (i32, i32)) -> Observed<'a> {
        Observed {
            expected,
            actual,
            expected_errno: errno.0,
            actual_errno: errno.1,
        }
    }

    fn result(family: &str, seen: Observed<'_>) -> VerificationResult {
        let mismatch = seen.mismatch();
        VerificationResult {
            family: family.to_string(),
            symbol: String::from("snprintf"),
            mode: String::from("nearest"),
            case_name: format!("{}->{}", seen.expected, seen.actual),
            spec_section: String::from("C23 7.23.6.1"),
            passed: mismatch.is_none(),
            mismatch,
            expected: seen.expected.to_string(),
            actual: seen.actual.to_string(),
            expected_errno: seen.expected_errno,
            actual_errno: seen.actual_errno,
            diff: seen.explain(),
        }
    }

    #[test]
    fn errno_alone_can_fail_a_case() {
        let seen = observed("", "", (75, 0));
        assert_eq!(seen.mismatch(), Some(Mismatch::Errno));
        assert_eq!(
            seen.explain().as_deref(),
            Some("errno mismatch: expected=75, actual=0")
        );
    }

    #[test]
    fn both_axes_are_explained() {
        let seen = observed("1.5", "1.4", (0, 12));
        assert_eq!(seen.mismatch(), Some(Mismatch::Both));
        let text = seen.explain().unwrap();
        assert!(text.contains("+\"1.4\""), "{text}");
        assert!(text.ends_with("errno mismatch: expected=0, actual=12"), "{text}");
        assert_eq!(observed("x", "x", (0, 0)).explain(), None);
    }

    #[test]
    fn summary_splits_failures_by_axis_and_family() {
        let summary = VerificationSummary::from_results(vec![
            result("printf/float", observed("1.5", "1.5", (0, 0))),
            result("printf/float", observed("1.5", "1.4", (0, 0))),
            result("printf/errors", observed("", "", (75, 0))),
            result("printf/errors", observed("a", "b", (22, 0))),
        ]);
        assert_eq!((summary.passed, summary.failed), (1, 3));
        assert_eq!((summary.output_mismatches, summary.errno_mismatches), (2, 2));
        let families = summary.by_family();
        assert_eq!(families["printf/float"], FamilyTally { passed: 1, failed: 1 });
        assert_eq!(families["printf/errors"], FamilyTally { passed: 0, failed: 2 });
        assert_eq!(
            summary.headline(),
            "Verification complete: total=4, passed=1, failed=3 (output=2, errno=2)"
        );
    }
}
