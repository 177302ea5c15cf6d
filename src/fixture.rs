use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer};
use std::fs;
use std::path::Path;

/// Marker in a case description that silences execution failures.
pub const EXPECTED_TO_FAIL: &str = "Expected to fail";

/// One entry of the fixture array.
#[derive(Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct TestCase {
    /// Label for the executable under test. Informational only.
    #[serde(default, deserialize_with = "null_as_default")]
    pub exec: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub args: Vec<String>,
    /// Fixture-relative file fed to the child's stdin.
    #[serde(default)]
    pub input: Option<String>,
    /// Fixture-relative golden file for the child's stdout.
    #[serde(default)]
    pub output_cmp: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Declared exit code. Not checked.
    #[serde(default)]
    pub return_code: Option<i32>,
}

/// `null` decodes like an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl TestCase {
    pub fn expected_to_fail(&self) -> bool {
        self.description.contains(EXPECTED_TO_FAIL)
    }

    /// Stdin file name; an empty string counts as absent.
    pub fn input_file(&self) -> Option<&str> {
        self.input.as_deref().filter(|name| !name.is_empty())
    }

    /// Golden file name; an empty string counts as absent.
    pub fn output_file(&self) -> Option<&str> {
        self.output_cmp.as_deref().filter(|name| !name.is_empty())
    }

    pub fn args_line(&self) -> String {
        self.args.join(" ")
    }
}

/// Read and decode the fixture array at `dir/file_name`.
///
/// Both an unreadable file and malformed JSON are errors; the caller treats
/// either as fatal.
pub fn load_fixture(dir: &Path, file_name: &str) -> Result<Vec<TestCase>> {
    let path = dir.join(file_name);
    let data = fs::read(&path).with_context(|| format!("Failed to read file {path:?}"))?;
    let cases: Vec<TestCase> = serde_json::from_slice(&data)
        .with_context(|| format!("Failed to parse fixture {path:?}"))?;
    tracing::debug!(cases = cases.len(), "loaded fixture {}", path.display());
    Ok(cases)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const NAME: &str = "bitcoin-util-test.json";

    #[test]
    fn loads_cases_in_order() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(NAME),
            r#"[
  { "exec": "./litecoin-tx", "args": ["-create"], "output_cmp": "blanktxv1.hex",
    "description": "Creates a blank transaction" },
  { "exec": "./litecoin-tx", "args": ["-json", "-"], "input": "tx394b54bb.hex",
    "description": "Parses a transaction from stdin", "return_code": 0 },
  { "exec": "./litecoin-tx", "args": ["-", "delin=31"], "input": "tx394b54bb.hex",
    "return_code": 1, "description": "Expected to fail: out of range" }
]"#,
        )?;

        let cases = load_fixture(dir.path(), NAME)?;
        assert_eq!(cases.len(), 3);
        assert_eq!(cases[0].args, vec!["-create"]);
        assert_eq!(cases[0].output_cmp.as_deref(), Some("blanktxv1.hex"));
        assert!(cases[0].input.is_none());
        assert_eq!(cases[1].input.as_deref(), Some("tx394b54bb.hex"));
        assert_eq!(cases[1].return_code, Some(0));
        assert!(!cases[1].expected_to_fail());
        assert!(cases[2].expected_to_fail());
        assert_eq!(cases[2].args_line(), "- delin=31");
        Ok(())
    }

    #[test]
    fn missing_fields_default() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(NAME),
            r#"[{ "args": ["-create"], "extra": true }, { "input": "", "output_cmp": "" }]"#,
        )?;
        let cases = load_fixture(dir.path(), NAME)?;
        assert_eq!(cases[0].exec, "");
        assert_eq!(cases[0].description, "");
        assert!(cases[0].output_cmp.is_none());
        assert!(cases[1].args.is_empty());
        assert!(cases[1].input_file().is_none());
        assert!(cases[1].output_file().is_none());
        Ok(())
    }

    #[test]
    fn null_fields_decode_as_empty() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(
            dir.path().join(NAME),
            r#"[{ "exec": null, "args": null, "description": null, "input": null,
                  "output_cmp": null, "return_code": null }]"#,
        )?;
        let cases = load_fixture(dir.path(), NAME)?;
        assert_eq!(cases, vec![TestCase::default()]);
        Ok(())
    }

    #[test]
    fn missing_file_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        let err = load_fixture(dir.path(), NAME).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
        Ok(())
    }

    #[test]
    fn malformed_json_is_an_error() -> Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join(NAME), b"[{ \"args\": [\"-create\"] ")?;
        let err = load_fixture(dir.path(), NAME).unwrap_err();
        assert!(err.to_string().contains("Failed to parse fixture"));

        fs::write(dir.path().join(NAME), br#"{ "args": [] }"#)?;
        assert!(load_fixture(dir.path(), NAME).is_err());
        Ok(())
    }
}
