//! Report generation for conformance results.

use serde::{Deserialize, Serialize};

use crate::fixtures::FixtureDigest;
use crate::verify::VerificationSummary;

/// A conformance report over one verification run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConformanceReport {
    /// Report title.
    pub title: String,
    /// Rounding modes exercised.
    pub mode: String,
    /// Timestamp (UTC).
    pub timestamp: String,
    /// Fixture files the run was driven by.
    #[serde(default)]
    pub fixtures: Vec<FixtureDigest>,
    /// Verification summary.
    pub summary: VerificationSummary,
}

impl ConformanceReport {
    /// Render the report as markdown.
    #[must_use]
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("# {}\n\n", self.title));
        out.push_str(&format!("- Mode: {}\n", self.mode));
        out.push_str(&format!("- Timestamp: {}\n", self.timestamp));
        out.push_str(&format!("- Total: {}\n", self.summary.total));
        out.push_str(&format!("- Passed: {}\n", self.summary.passed));
        out.push_str(&format!(
            "- Failed: {} (output: {}, errno: {})\n\n",
            self.summary.failed, self.summary.output_mismatches, self.summary.errno_mismatches
        ));

        out.push_str("| Family | Passed | Failed |\n|--------|--------|--------|\n");
        for (family, tally) in self.summary.by_family() {
            out.push_str(&format!("| {family} | {} | {} |\n", tally.passed, tally.failed));
        }
        out.push('\n');

        if !self.fixtures.is_empty() {
            out.push_str("| Fixture | SHA-256 |\n|---------|---------|\n");
            for f in &self.fixtures {
                out.push_str(&format!("| {} | `{}` |\n", f.file, f.sha256));
            }
            out.push('\n');
        }

        out.push_str("| Case | Function | Mode | Spec | Status |\n");
        out.push_str("|------|----------|------|------|--------|\n");
        for r in &self.summary.results {
            let status = if r.passed { "PASS" } else { "FAIL" };
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                r.case_name, r.symbol, r.mode, r.spec_section, status
            ));
        }

        let failures: Vec<_> = self.summary.failures().collect();
        if !failures.is_empty() {
            out.push_str("\n## Failures\n");
            for r in failures {
                out.push_str(&format!("\n### {} [{}]\n\n```\n", r.case_name, r.mode));
                out.push_str(r.diff.as_deref().unwrap_or("(no diff)"));
                out.push_str("\n```\n");
            }
        }
        out
    }

    /// Render the report as JSON.
    #[must_use]
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|e| format!("{{\"error\": \"{e}\"}}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verify::{Mismatch, VerificationResult};

    fn result(name: &str, passed: bool) -> VerificationResult {
        VerificationResult {
            family: String::from("printf/integer"),
            symbol: String::from("asprintf"),
            mode: String::from("nearest"),
            case_name: name.to_string(),
            spec_section: String::from("C23 7.23.6.1"),
            passed,
            mismatch: (!passed).then_some(Mismatch::Output),
            expected: String::from("1"),
            actual: String::from(if passed { "1" } else { "2" }),
            expected_errno: 0,
            actual_errno: 0,
            diff: (!passed).then(|| String::from("-\"1\"\n+\"2\"")),
        }
    }

    #[test]
    fn markdown_lists_cases_and_failures() {
        let report = ConformanceReport {
            title: String::from("frankenprintf Conformance Report"),
            mode: String::from("nearest"),
            timestamp: String::from("2026-10-01T00:00:00Z"),
            fixtures: vec![FixtureDigest {
                file: String::from("integer.v1.json"),
                sha256: String::from("00ff"),
            }],
            summary: VerificationSummary::from_results(vec![result("ok", true), result("bad", false)]),
        };
        let md = report.to_markdown();
        assert!(md.contains("- Passed: 1"));
        assert!(md.contains("- Failed: 1 (output: 1, errno: 0)"));
        assert!(md.contains("| printf/integer | 1 | 1 |"));
        assert!(md.contains("| integer.v1.json | `00ff` |"));
        assert!(md.contains("| bad | asprintf | nearest | C23 7.23.6.1 | FAIL |"));
        assert!(md.contains("### bad [nearest]"));
        let json: serde_json::Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["summary"]["failed"], 1);
    }
}
