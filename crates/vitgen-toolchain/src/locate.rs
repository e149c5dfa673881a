use std::env;
use std::path::{Path, PathBuf};

use vitgen_core::error::VitgenError;

/// Find `name` in `local_dir` first, then on `PATH`.
pub fn find_executable(name: &str, local_dir: Option<&Path>) -> Result<PathBuf, VitgenError> {
    if let Some(dir) = local_dir {
        let candidate = dir.join(name);
        if is_executable(&candidate) {
            return absolute(candidate);
        }
    }

    if let Some(paths) = env::var_os("PATH") {
        for dir in env::split_paths(&paths) {
            let candidate = dir.join(name);
            if is_executable(&candidate) {
                return absolute(candidate);
            }
        }
    }

    let searched = local_dir
        .map(|d| format!("PATH or {}", d.display()))
        .unwrap_or_else(|| "PATH".to_string());
    Err(VitgenError::external_tool(name, format!("binary not found in {searched}")))
}

fn absolute(path: PathBuf) -> Result<PathBuf, VitgenError> {
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(env::current_dir()?.join(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn local_directory_wins() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("jcli");
        std::fs::write(&bin, "#!/bin/sh\n").unwrap();
        std::fs::set_permissions(&bin, std::fs::Permissions::from_mode(0o755)).unwrap();

        assert_eq!(find_executable("jcli", Some(dir.path())).unwrap(), bin);
    }

    #[test]
    fn missing_binary_is_a_tool_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = find_executable("surely-not-installed-anywhere", Some(dir.path())).unwrap_err();
        assert_eq!(err.category(), vitgen_core::ErrorCategory::ExternalTool);
    }
}
