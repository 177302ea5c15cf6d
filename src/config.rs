use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_FIXTURE_NAME: &str = "bitcoin-util-test.json";
pub const DEFAULT_EXE_NAME: &str = "litecoin-tx";

/// How newlines inside `.hex` golden files are treated.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HexNewlines {
    /// Drop `\r` and `\n` from both sides before comparing and writing.
    #[default]
    Strip,
    /// Compare and write the raw bytes untouched.
    Preserve,
}

/// Everything the driver needs for one run.
#[derive(Clone, Debug)]
pub struct RunConfig {
    /// Directory holding the fixture and the files it references.
    pub data_dir: PathBuf,
    pub fixture_name: String,
    pub executable: PathBuf,
    /// `None` waits for each child indefinitely.
    pub timeout: Option<Duration>,
    pub filter: Option<String>,
    pub update_golden: bool,
    pub hex_newlines: HexNewlines,
}

impl RunConfig {
    /// A configuration with the defaults the CLI would apply.
    pub fn new(data_dir: impl Into<PathBuf>, executable: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            fixture_name: DEFAULT_FIXTURE_NAME.to_string(),
            executable: executable.into(),
            timeout: None,
            filter: None,
            update_golden: true,
            hex_newlines: HexNewlines::default(),
        }
    }

    /// Resolve a fixture-relative file name.
    pub fn data_file(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn defaults() {
        let config = RunConfig::new("/data", "/bin/tx");
        assert_eq!(config.fixture_name, DEFAULT_FIXTURE_NAME);
        assert!(config.timeout.is_none());
        assert!(config.update_golden);
        assert_eq!(config.hex_newlines, HexNewlines::Strip);
    }

    #[cfg(unix)]
    #[test]
    fn data_files_resolve_under_data_dir() {
        let config = RunConfig::new("/src/test/data", "/src/litecoin-tx");
        assert_eq!(config.data_file("in1.txt"), Path::new("/src/test/data/in1.txt"));
    }
}
