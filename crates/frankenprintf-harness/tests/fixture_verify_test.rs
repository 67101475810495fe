use std::path::PathBuf;

use frankenprintf_harness::FixtureSet;
use frankenprintf_harness::execute::SUPPORTED_FUNCTIONS;
use frankenprintf_harness::fixtures::digest_dir;
use frankenprintf_harness::runner::run_all_modes;
use frankenprintf_harness::structured_log::{CASE_EVENT, LogEmitter, validate_log_file};
use frankenprintf_harness::verify::VerificationSummary;
use frankenprintf_harness::ConformanceReport;

fn workspace_root() -> PathBuf {
    let manifest = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest.parent().unwrap().parent().unwrap().to_path_buf()
}

fn fixture_dir() -> PathBuf {
    workspace_root().join("tests/fixtures/printf")
}

#[test]
fn every_fixture_case_passes_in_every_mode() {
    let sets = FixtureSet::load_dir(&fixture_dir()).expect("fixtures load");
    assert!(sets.len() >= 4, "expected the printf fixture families");

    let summary = VerificationSummary::from_results(run_all_modes("test", &sets, None));
    let failures: Vec<String> = summary
        .failures()
        .map(|r| {
            format!(
                "{} ({}): {}",
                r.case_name,
                r.symbol,
                r.diff.as_deref().unwrap_or("")
            )
        })
        .collect();
    assert!(failures.is_empty(), "failures:\n{}", failures.join("\n"));
    assert!(summary.total > 40);
}

#[test]
fn fixtures_only_use_supported_functions_and_modes() {
    for set in FixtureSet::load_dir(&fixture_dir()).unwrap() {
        for case in &set.cases {
            assert!(
                SUPPORTED_FUNCTIONS.contains(&case.function.as_str()),
                "{}: {}",
                case.name,
                case.function
            );
            assert!(
                ["all", "nearest", "upward", "downward", "towardzero"].contains(&case.mode.as_str()),
                "{}: {}",
                case.name,
                case.mode
            );
        }
    }
}

#[test]
fn verification_log_is_schema_valid() {
    let sets = FixtureSet::load_dir(&fixture_dir()).unwrap();
    let path = std::env::temp_dir().join(format!(
        "frankenprintf-verify-{}.log.jsonl",
        std::process::id()
    ));
    let mut emitter = LogEmitter::to_file(&path, "test", "run-1").unwrap();
    let results = run_all_modes("test", &sets, Some(&mut emitter));
    emitter.flush().unwrap();
    drop(emitter);

    let (lines, errors) = validate_log_file(&path).unwrap();
    let content = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(errors.is_empty(), "{:?}", errors.iter().map(ToString::to_string).collect::<Vec<_>>());
    assert_eq!(lines, results.len());
    assert!(content.lines().all(|line| line.contains(CASE_EVENT)));
}

#[test]
fn report_renders_for_real_run() {
    let sets = FixtureSet::load_dir(&fixture_dir()).unwrap();
    let summary = VerificationSummary::from_results(run_all_modes("test", &sets, None));
    let report = ConformanceReport {
        title: String::from("frankenprintf Conformance Report"),
        mode: String::from("all"),
        timestamp: String::from("2026-10-01T00:00:00Z"),
        fixtures: digest_dir(&fixture_dir()).unwrap(),
        summary,
    };
    let md = report.to_markdown();
    assert!(md.starts_with("# frankenprintf Conformance Report"));
    assert!(md.contains("zero_precision_zero_value [nearest]"));
    assert!(md.contains("| integer.v1.json | `"));
    assert!(!md.contains("## Failures"));
}
