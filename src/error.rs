use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// A failure confined to a single fixture case.
///
/// These never stop the run: the driver logs them (or swallows them for
/// cases marked "Expected to fail") and moves on to the next case.
#[derive(Error, Debug)]
pub enum CaseError {
    #[error("failed to read input file {path:?}: {source}")]
    ReadInput {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to start {path:?}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("i/o error while running child: {0}")]
    Io(#[from] io::Error),

    #[error("{}", exit_message(.code))]
    ExitStatus { code: Option<i32> },

    #[error("child did not exit within {secs}s and was killed")]
    Timeout { secs: u64 },

    #[error("failed to read expected output {path:?}: {source}")]
    ReadExpected {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write expected output {path:?}: {source}")]
    WriteExpected {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn exit_message(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit status {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_status_messages() {
        assert_eq!(
            CaseError::ExitStatus { code: Some(1) }.to_string(),
            "exit status 1"
        );
        assert_eq!(
            CaseError::ExitStatus { code: None }.to_string(),
            "terminated by signal"
        );
    }

    #[test]
    fn timeout_message_names_limit() {
        let err = CaseError::Timeout { secs: 5 };
        assert!(err.to_string().contains("5s"));
    }
}
