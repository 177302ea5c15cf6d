use std::borrow::Cow;
use std::fs;
use std::io;
use std::path::Path;

use crate::config::HexNewlines;
use crate::error::CaseError;

/// What happened to a golden file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    Updated,
    /// Mismatch found but updating was disabled.
    Stale,
}

fn is_hex_path(path: &Path) -> bool {
    path.to_string_lossy().contains(".hex")
}

/// Apply the `.hex` newline policy to `data`.
pub fn normalize<'a>(path: &Path, data: &'a [u8], policy: HexNewlines) -> Cow<'a, [u8]> {
    if policy == HexNewlines::Strip
        && is_hex_path(path)
        && data.iter().any(|b| *b == b'\n' || *b == b'\r')
    {
        Cow::Owned(
            data.iter()
                .copied()
                .filter(|b| *b != b'\n' && *b != b'\r')
                .collect(),
        )
    } else {
        Cow::Borrowed(data)
    }
}

/// Compare `actual` against the golden file at `path`, rewriting the file
/// when they differ and `update` is set. A missing golden file counts as a
/// mismatch. Only file I/O failures are errors.
pub fn verify_output(
    path: &Path,
    actual: &[u8],
    policy: HexNewlines,
    update: bool,
) -> Result<Verdict, CaseError> {
    let expected = match fs::read(path) {
        Ok(data) => Some(data),
        Err(err) if err.kind() == io::ErrorKind::NotFound => None,
        Err(source) => {
            return Err(CaseError::ReadExpected {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let actual = normalize(path, actual, policy);
    let matches = expected
        .as_deref()
        .is_some_and(|expected| normalize(path, expected, policy) == actual);
    if matches {
        tracing::info!("Input matches expected output");
        return Ok(Verdict::Matched);
    }

    if !update {
        tracing::warn!("Output differs from {}", path.display());
        return Ok(Verdict::Stale);
    }
    tracing::info!("Updating output cmp file");
    fs::write(path, &actual).map_err(|source| CaseError::WriteExpected {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Verdict::Updated)
}
