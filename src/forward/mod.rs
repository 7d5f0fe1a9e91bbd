//! Command Forwarding
//!
//! Hands the resolved (cached or original) file path to a user-specified
//! external command. The argument template may reference the path with the
//! literal tokens `{0}` or `{1}`; the path is single-quoted and made
//! absolute before substitution. The child's exit code becomes the
//! invocation's exit code.

use std::path::Path;
use std::process::Command;

use tracing::info;

use crate::errors::CacheError;

/// Build the final argument string from a template and the quoted path
///
/// - empty/blank template: the quoted path alone
/// - template containing `{0}` or `{1}`: both tokens replaced by the path
/// - otherwise: the quoted path appended to the template
pub fn build_arguments(template: Option<&str>, quoted_path: &str) -> String {
    match template {
        None => quoted_path.to_string(),
        Some(t) if t.trim().is_empty() => quoted_path.to_string(),
        Some(t) if t.contains("{0}") || t.contains("{1}") => {
            t.replace("{0}", quoted_path).replace("{1}", quoted_path)
        }
        Some(t) => format!("{t} {quoted_path}"),
    }
}

/// Spawn the forwarded command with the resolved file path and wait for it
///
/// Returns the child's exit code. Failure to resolve the absolute path or
/// to start the process is a reported failure, not a crash.
pub fn run(command: &str, template: Option<&str>, file_path: &Path) -> Result<i32, CacheError> {
    let absolute = std::path::absolute(file_path).map_err(|e| CacheError::PathResolution {
        path: file_path.display().to_string(),
        reason: e.to_string(),
    })?;
    let quoted = format!("'{}'", absolute.display());
    let arguments = build_arguments(template, &quoted);

    // The quoting convention presumes a shell, so run through one
    let command_line = format!("{command} {arguments}");
    info!(command = %command_line, "Forwarding to external command");

    let status = Command::new("sh")
        .arg("-c")
        .arg(&command_line)
        .status()
        .map_err(|e| CacheError::ProcessStart {
            command: command.to_string(),
            reason: e.to_string(),
        })?;

    let code = status.code().unwrap_or(-1);
    info!(command = command, exit_code = code, "Forwarded command finished");
    Ok(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_substituted() {
        let args = build_arguments(Some("-i {0} -o {1}.out"), "'/a/b.mp4'");
        assert_eq!(args, "-i '/a/b.mp4' -o '/a/b.mp4'.out");
    }

    #[test]
    fn test_empty_template_yields_bare_quoted_path() {
        assert_eq!(build_arguments(None, "'/a/b.mp4'"), "'/a/b.mp4'");
        assert_eq!(build_arguments(Some("   "), "'/a/b.mp4'"), "'/a/b.mp4'");
    }

    #[test]
    fn test_tokenless_template_appends_path() {
        assert_eq!(build_arguments(Some("-x"), "'/a/b.mp4'"), "-x '/a/b.mp4'");
    }

    #[test]
    fn test_run_propagates_child_exit_code() {
        let code = run("exit 3 #", None, Path::new("/tmp/x")).unwrap();
        assert_eq!(code, 3);

        let code = run("true", None, Path::new("/tmp/x")).unwrap();
        assert_eq!(code, 0);
    }
}
