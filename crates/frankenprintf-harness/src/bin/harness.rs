//! CLI entrypoint for the frankenprintf conformance harness.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use frankenprintf_harness::execute::{SUPPORTED_FUNCTIONS, execute_fixture_case, parse_mode};
use frankenprintf_harness::fixtures::{
    ArgValue, FixtureCase, FixtureSet, PrintfInputs, digest_dir,
};
use frankenprintf_harness::runner::{TestRunner, mode_name, run_all_modes};
use frankenprintf_harness::structured_log::{LogEmitter, LogLevel, now_utc, validate_log_file};
use frankenprintf_harness::verify::VerificationSummary;
use frankenprintf_harness::{ConformanceReport, HarnessError};

/// Conformance tooling for frankenprintf.
#[derive(Debug, Parser)]
#[command(name = "frankenprintf-harness")]
#[command(about = "Conformance testing harness for frankenprintf")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Verify the engine against fixture files.
    Verify {
        /// Directory containing fixture JSON files.
        #[arg(long, default_value = "tests/fixtures/printf")]
        fixture: PathBuf,
        /// Rounding mode to run (`nearest`, `upward`, `downward`, `towardzero`, `all`).
        #[arg(long, default_value = "all")]
        mode: String,
        /// Output report path (markdown).
        #[arg(long)]
        report: Option<PathBuf>,
        /// Output report path (JSON).
        #[arg(long)]
        json: Option<PathBuf>,
        /// Structured JSONL log output path.
        #[arg(long)]
        log: Option<PathBuf>,
        /// Optional fixed timestamp string for deterministic report generation.
        #[arg(long)]
        timestamp: Option<String>,
    },
    /// Render one format and print the normalized output.
    Render {
        /// printf format string.
        format: String,
        /// Arguments as `kind:value` (`int:-5`, `uint:7`, `double:1.5`,
        /// `float:0.1`, `ldouble:2.5`, `char:x`, `wchar:é`, `str:abc`,
        /// `wide:abc`, `utf8:abc`, `utf16:abc`, `ptr:4096`, `count`).
        args: Vec<String>,
        /// printf-family function to drive.
        #[arg(long, default_value = "asprintf")]
        function: String,
        /// Buffer size for bounded functions.
        #[arg(long)]
        size: Option<usize>,
        /// Rounding mode.
        #[arg(long, default_value = "nearest")]
        mode: String,
        /// Enable `%n`.
        #[arg(long)]
        allow_count: bool,
    },
    /// Validate a structured JSONL log file.
    ValidateLog {
        /// Log path.
        #[arg(long)]
        log: PathBuf,
    },
}

fn parse_arg(raw: &str) -> Result<ArgValue, String> {
    if raw == "count" {
        return Ok(ArgValue::Count);
    }
    let (kind, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("argument '{raw}' is not kind:value"))?;
    let bad = |e: &dyn std::fmt::Display| format!("argument '{raw}': {e}");
    Ok(match kind {
        "int" => ArgValue::Int(value.parse().map_err(|e| bad(&e))?),
        "uint" => ArgValue::Uint(value.parse().map_err(|e| bad(&e))?),
        "double" => ArgValue::Double(value.parse().map_err(|e| bad(&e))?),
        "float" => ArgValue::Float(value.parse().map_err(|e| bad(&e))?),
        "ldouble" => ArgValue::LongDouble(value.parse().map_err(|e| bad(&e))?),
        "char" => match value.as_bytes() {
            [b] => ArgValue::Char(*b),
            _ => return Err(bad(&"char takes one byte")),
        },
        "wchar" => ArgValue::WideChar(value.parse().map_err(|e| bad(&e))?),
        "str" => ArgValue::Str(value.to_string()),
        "wide" => ArgValue::Wide(value.to_string()),
        "utf8" => ArgValue::Utf8(value.to_string()),
        "utf16" => ArgValue::Utf16(value.to_string()),
        "ptr" => ArgValue::Pointer(value.parse().map_err(|e| bad(&e))?),
        other => return Err(format!("unknown argument kind '{other}'")),
    })
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Verify {
            fixture,
            mode,
            report,
            json,
            log,
            timestamp,
        } => {
            eprintln!("Verifying against fixtures in {}", fixture.display());
            let fixture_sets = FixtureSet::load_dir(&fixture)?;
            let digests = digest_dir(&fixture)?;
            let run_id = format!("run-{}", std::process::id());
            let mut emitter = match &log {
                Some(path) => Some(LogEmitter::to_file(path, "verify", &run_id)?),
                None => None,
            };
            if let Some(emitter) = emitter.as_mut() {
                emitter.emit(LogLevel::Info, "verify.start")?;
            }

            let mut results = if mode.eq_ignore_ascii_case("all") {
                run_all_modes("fixture-verify", &fixture_sets, emitter.as_mut())
            } else {
                let runner = TestRunner::for_mode_name("fixture-verify", &mode)?;
                let mut results = Vec::new();
                for set in &fixture_sets {
                    results.extend(runner.run_logged(set, emitter.as_mut()));
                }
                results
            };

            // Stable ordering for reproducible reports.
            results.sort_by(|a, b| {
                a.family
                    .cmp(&b.family)
                    .then_with(|| a.symbol.cmp(&b.symbol))
                    .then_with(|| a.mode.cmp(&b.mode))
                    .then_with(|| a.case_name.cmp(&b.case_name))
            });

            let summary = VerificationSummary::from_results(results);
            if let Some(emitter) = emitter.as_mut() {
                emitter.emit(LogLevel::Info, "verify.end")?;
                emitter.flush()?;
            }
            eprintln!("{}", summary.headline());
            for failure in summary.failures() {
                eprintln!("FAIL {} ({})", failure.case_name, failure.symbol);
                if let Some(diff) = &failure.diff {
                    eprintln!("{diff}");
                }
            }

            let all_passed = summary.all_passed();
            let report_doc = ConformanceReport {
                title: String::from("frankenprintf Conformance Report"),
                mode,
                timestamp: timestamp.unwrap_or_else(now_utc),
                fixtures: digests,
                summary,
            };
            if let Some(path) = report {
                std::fs::write(&path, report_doc.to_markdown())?;
                eprintln!("Report written to {}", path.display());
            }
            if let Some(path) = json {
                std::fs::write(&path, report_doc.to_json())?;
                eprintln!("JSON report written to {}", path.display());
            }
            Ok(if all_passed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Render {
            format,
            args,
            function,
            size,
            mode,
            allow_count,
        } => {
            if !SUPPORTED_FUNCTIONS.contains(&function.as_str()) {
                return Err(HarnessError::UnknownFunction(function).into());
            }
            let mode = parse_mode(&mode)?;
            let args = args
                .iter()
                .map(|raw| parse_arg(raw))
                .collect::<Result<Vec<_>, _>>()?;
            let inputs = PrintfInputs {
                format,
                args,
                size,
                allow_count,
                ..PrintfInputs::default()
            };
            let case = FixtureCase {
                name: String::from("cli"),
                function,
                spec_section: String::new(),
                inputs: serde_json::to_value(&inputs)?,
                expected_output: String::new(),
                expected_errno: 0,
                mode: mode_name(mode).to_string(),
            };
            let run = execute_fixture_case(&case, mode)?;
            println!("{}", run.output);
            Ok(if run.errno == 0 {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::ValidateLog { log } => {
            let (lines, errors) = validate_log_file(&log)?;
            for error in &errors {
                eprintln!("{error}");
            }
            eprintln!("{lines} lines, {} errors", errors.len());
            Ok(if errors.is_empty() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_arguments_parse_into_fixture_values() {
        assert_eq!(parse_arg("int:-5"), Ok(ArgValue::Int(-5)));
        assert_eq!(parse_arg("char:x"), Ok(ArgValue::Char(b'x')));
        assert_eq!(parse_arg("wchar:é"), Ok(ArgValue::WideChar('é')));
        assert_eq!(parse_arg("count"), Ok(ArgValue::Count));
        assert!(parse_arg("int:abc").is_err());
        assert!(parse_arg("blob:1").is_err());
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
