//! Env-file loading.
//!
//! An env-file holds one `KEY=value` assignment per line. Empty lines and
//! lines starting with `#` are ignored. Values are passed to the container
//! verbatim; no quote stripping or interpolation happens.

use crate::error::{Result, SwarmJobError};
use std::path::Path;
use tracing::warn;

/// Read the assignments from an env-file.
///
/// In strict mode a line without `=` fails the whole file. Otherwise the line
/// is skipped with a warning.
pub fn read_env_file(path: &Path, strict: bool) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path).map_err(|e| SwarmJobError::EnvFile {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    parse_env_lines(path, &content, strict)
}

fn parse_env_lines(path: &Path, content: &str, strict: bool) -> Result<Vec<String>> {
    let mut envs = Vec::new();

    for (idx, raw) in content.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        if !line.contains('=') {
            let reason = format!("no separator found in line {}", idx + 1);
            if strict {
                return Err(SwarmJobError::EnvFile {
                    path: path.to_path_buf(),
                    reason,
                });
            }
            warn!(path = %path.display(), line = idx + 1, "skipping env-file line without '='");
            continue;
        }

        envs.push(line.to_string());
    }

    Ok(envs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn reads_assignments_and_skips_blanks_and_comments() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("app.env");
        std::fs::write(&path, "# database\nDB_HOST=db\n\nDB_PORT=5432\r\nEMPTY=\n").unwrap();

        let envs = read_env_file(&path, true).unwrap();
        assert_eq!(envs, vec!["DB_HOST=db", "DB_PORT=5432", "EMPTY="]);
    }

    #[test]
    fn values_may_contain_separators() {
        let content = "URL=postgres://u:p@h/db?a=b\n";
        let envs = parse_env_lines(Path::new("x.env"), content, true).unwrap();
        assert_eq!(envs, vec!["URL=postgres://u:p@h/db?a=b"]);
    }

    #[test]
    fn strict_mode_rejects_line_without_separator() {
        let err = parse_env_lines(Path::new("bad.env"), "A=1\nJUSTAKEY\n", true).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("bad.env"));
        assert!(msg.contains("line 2"));
    }

    #[test]
    fn lenient_mode_skips_line_without_separator() {
        let envs = parse_env_lines(Path::new("bad.env"), "A=1\nJUSTAKEY\nB=2\n", false).unwrap();
        assert_eq!(envs, vec!["A=1", "B=2"]);
    }

    #[test]
    fn missing_file_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let err = read_env_file(&temp_dir.path().join("nope.env"), true).unwrap_err();
        assert!(matches!(err, SwarmJobError::EnvFile { .. }));
    }
}
