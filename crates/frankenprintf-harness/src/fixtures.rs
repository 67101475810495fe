//! Fixture loading and management.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::HarnessError;

/// A single fixture test case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureCase {
    /// Case identifier.
    pub name: String,
    /// printf-family function being tested (`asprintf`, `snprintf`, ...).
    pub function: String,
    /// C/POSIX section reference.
    pub spec_section: String,
    /// Call inputs; see [`PrintfInputs`].
    pub inputs: serde_json::Value,
    /// Expected normalized output, or `error:<ERRNO>`.
    pub expected_output: String,
    /// Expected errno after the call (0 on success).
    pub expected_errno: i32,
    /// Rounding mode the case applies to (`nearest`, `upward`, `downward`,
    /// `towardzero`) or `all`.
    pub mode: String,
}

/// A collection of fixture cases for a function family.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSet {
    /// Schema version.
    pub version: String,
    /// Function family name.
    pub family: String,
    /// UTC timestamp of capture.
    pub captured_at: String,
    /// Individual test cases.
    pub cases: Vec<FixtureCase>,
}

impl FixtureSet {
    /// Load fixture set from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Serialize fixture set to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Load fixture set from a file path.
    pub fn from_file(path: &Path) -> Result<Self, HarnessError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|source| HarnessError::Fixture {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load every `*.json` set in `dir`, sorted by file name.
    pub fn load_dir(dir: &Path) -> Result<Vec<Self>, HarnessError> {
        fixture_paths(dir)?
            .iter()
            .map(|path| Self::from_file(path))
            .collect()
    }
}

/// Content hash of one fixture file, recorded in reports so a result can be
/// tied to the exact fixture bytes it was produced from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureDigest {
    /// File name within the fixture directory.
    pub file: String,
    /// Lowercase hex SHA-256 of the file contents.
    pub sha256: String,
}

/// SHA-256 of every `*.json` file in `dir`, in the order [`FixtureSet::load_dir`]
/// reads them.
pub fn digest_dir(dir: &Path) -> Result<Vec<FixtureDigest>, HarnessError> {
    fixture_paths(dir)?
        .iter()
        .map(|path| {
            let data = std::fs::read(path)?;
            let file = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Ok(FixtureDigest {
                file,
                sha256: sha256_hex(&data),
            })
        })
        .collect()
}

fn fixture_paths(dir: &Path) -> Result<Vec<PathBuf>, HarnessError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();
    if paths.is_empty() {
        return Err(HarnessError::NoFixtures(dir.to_path_buf()));
    }
    Ok(paths)
}

fn sha256_hex(data: &[u8]) -> String {
    use sha2::Digest as _;
    use std::fmt::Write as _;
    let digest = sha2::Sha256::digest(data);
    let mut out = String::with_capacity(digest.len() * 2);
    for b in digest {
        let _ = write!(out, "{b:02x}");
    }
    out
}

/// One argument as written in a fixture: `{"int": -5}`, `{"str": "abc"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgValue {
    Int(i64),
    Uint(u64),
    Double(f64),
    /// IEEE binary64 bit pattern, for infinities and NaNs.
    DoubleBits(u64),
    Float(f32),
    LongDouble(f64),
    Char(u8),
    WideChar(char),
    Str(String),
    Bytes(Vec<u8>),
    Wide(String),
    Utf8(String),
    Utf16(String),
    Pointer(u64),
    /// A `%n` target, initialised to -1.
    Count,
}

/// Numeric locale overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocaleInputs {
    pub decimal_point: String,
    #[serde(default)]
    pub thousands_sep: String,
    #[serde(default)]
    pub grouping: Vec<u8>,
}

/// Typed view of [`FixtureCase::inputs`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PrintfInputs {
    pub format: String,
    #[serde(default)]
    pub args: Vec<ArgValue>,
    /// Buffer size for the bounded functions.
    #[serde(default)]
    pub size: Option<usize>,
    #[serde(default)]
    pub locale: Option<LocaleInputs>,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub allow_count: bool,
    #[serde(default)]
    pub nan_payload: bool,
    #[serde(default)]
    pub length_limit: Option<usize>,
}

impl PrintfInputs {
    pub fn from_case(case: &FixtureCase) -> Result<Self, HarnessError> {
        serde_json::from_value(case.inputs.clone()).map_err(|source| HarnessError::Inputs {
            case: case.name.clone(),
            source,
        })
    }
}
