//! Delegation to the legacy CLI for everything this broker does not
//! implement itself. The resolved token is shared through the raw
//! bearer-token file, never on the command line.

use std::env;
use std::ffi::OsString;
use std::process::Command;

use anyhow::{anyhow, Context, Result};
use tracing::debug;

use crate::helpers::paths::look_path_preamble;
use crate::resolve::{resolve, ResolveOptions};

pub const FALLBACK_BINARY: &str = "gcloud";
const FALLBACK_PREAMBLE: &str = "#!/bin/sh";

/// Global flags the legacy binary does not understand. Impersonation is
/// already reflected in the shared token; logging flags only configure this
/// process.
const BROKER_FLAGS: [&str; 3] = [
    "--impersonate-service-account",
    "--log-level",
    "--log-format",
];

/// Drop broker-global flags from a forwarded argument list, in both the
/// `--flag=value` and the `--flag value` forms.
pub(crate) fn strip_broker_flags(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    let mut out = Vec::new();
    let mut skip_value = false;
    for arg in args {
        if skip_value {
            skip_value = false;
            continue;
        }
        let matched = {
            let text = arg.to_string_lossy();
            BROKER_FLAGS
                .iter()
                .copied()
                .find(|flag| {
                    text.strip_prefix(flag)
                        .is_some_and(|rest| rest.is_empty() || rest.starts_with('='))
                })
                .map(|flag| text == flag)
        };
        match matched {
            // bare form carries its value in the next argument
            Some(bare) => skip_value = bare,
            None => out.push(arg),
        }
    }
    out
}

/// Run the legacy binary with the original arguments, minus the broker's
/// own global flags. Returns the child's exit code.
pub async fn delegate(share_token: bool, opts: &ResolveOptions) -> Result<i32> {
    let path = look_path_preamble(FALLBACK_BINARY, FALLBACK_PREAMBLE)
        .ok_or_else(|| anyhow!("unable to find {} on PATH", FALLBACK_BINARY))?;

    let mut args = strip_broker_flags(env::args_os().skip(1));

    if share_token {
        let ts = resolve(opts)?;
        // ensure the token file exists and is valid before handing it over
        ts.token().await?;
        let token_file_arg = format!("--access-token-file={}", ts.access_token_path().display());
        args.insert(0, token_file_arg.into());
    }

    debug!("delegating to {}", path.display());
    let status = Command::new(&path)
        .args(&args)
        .status()
        .with_context(|| format!("unable to run {}", path.display()))?;
    Ok(status.code().unwrap_or(1))
}
