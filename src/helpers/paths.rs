use std::env;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::utils::constants::{
    CACHE_DIR_NAME, CREDENTIALS_FILE_NAME, ENV_APPLICATION_CREDENTIALS, ENV_CONFIG_DIR,
};

/// Process-wide token cache directory, created on first use.
pub fn token_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(env::temp_dir)
        .join(CACHE_DIR_NAME)
}

/// Location of the canonical credential descriptor file.
///
/// Precedence: explicit override, `GOOGLE_APPLICATION_CREDENTIALS`,
/// `CLOUDSDK_CONFIG`, then the platform config dir under `gcloud/`.
pub fn credentials_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_owned();
    }
    if let Some(path) = env::var_os(ENV_APPLICATION_CREDENTIALS) {
        if !path.is_empty() {
            return PathBuf::from(path);
        }
    }
    let config_dir = match env::var_os(ENV_CONFIG_DIR) {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => dirs::config_dir()
            .unwrap_or_else(env::temp_dir)
            .join("gcloud"),
    };
    // best effort, reading will fail later anyway if this did
    let _ = fs::create_dir_all(&config_dir);
    config_dir.join(CREDENTIALS_FILE_NAME)
}

/// Search `PATH` for an executable whose leading bytes match `preamble`.
///
/// The legacy CLI ships as a `#!/bin/sh` wrapper script, while this broker
/// is an ELF binary; matching the preamble keeps us from delegating to
/// ourselves when both share a name on `PATH`.
pub fn look_path_preamble(file: &str, preamble: &str) -> Option<PathBuf> {
    let path_var = env::var_os("PATH")?;
    for dir in env::split_paths(&path_var) {
        // Unix shell semantics: empty path element means "."
        let dir = if dir.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            dir
        };
        let candidate = dir.join(file);
        if has_preamble(&candidate, preamble) {
            return fs::canonicalize(&candidate).ok().or(Some(candidate));
        }
    }
    None
}

fn has_preamble(path: &Path, preamble: &str) -> bool {
    let Ok(meta) = fs::metadata(path) else {
        return false;
    };
    if !meta.is_file() {
        return false;
    }
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if meta.permissions().mode() & 0o111 == 0 {
            return false;
        }
    }
    let Ok(mut f) = fs::File::open(path) else {
        return false;
    };
    let mut head = vec![0u8; preamble.len()];
    match f.read_exact(&mut head) {
        Ok(()) => head == preamble.as_bytes(),
        Err(_) => false,
    }
}
