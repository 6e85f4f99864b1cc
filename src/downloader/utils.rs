// Helper functions for backend implementations

use std::path::{Path, PathBuf};
use std::process::{Command as StdCommand, Stdio};
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::{timeout, Duration};

use super::errors::DownloadError;

/// Run command with timeout (shared utility)
pub async fn run_output_with_timeout(
    program: &str,
    args: Vec<String>,
    timeout_secs: u64,
) -> Result<std::process::Output, DownloadError> {
    let mut child = TokioCommand::new(program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => DownloadError::ToolNotFound(program.to_string()),
            _ => DownloadError::ExecutionError(format!("Failed to start {}: {}", program, e)),
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        DownloadError::ExecutionError(format!("Failed to capture stderr from {}", program))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status_res) => {
            let status = status_res.map_err(|e| {
                DownloadError::ExecutionError(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = stdout_task
                .await
                .map_err(|e| DownloadError::ExecutionError(format!("stdout task failed: {}", e)))??;
            let stderr = stderr_task
                .await
                .map_err(|e| DownloadError::ExecutionError(format!("stderr task failed: {}", e)))??;
            Ok(std::process::Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(DownloadError::ExecutionError(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

/// Turn a finished process into `Ok(output)` or `ProcessFailed`
pub fn check_status(
    program: &str,
    output: std::process::Output,
) -> Result<std::process::Output, DownloadError> {
    if output.status.success() {
        return Ok(output);
    }

    Err(DownloadError::ProcessFailed {
        program: program.to_string(),
        status: output.status.to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}

/// Find a binary in common install paths, falling back to PATH lookup
pub fn find_binary(binary_name: &str) -> String {
    let common_paths = [
        format!("/opt/homebrew/bin/{}", binary_name), // Homebrew on Apple Silicon
        format!("/usr/local/bin/{}", binary_name),    // Homebrew on Intel Mac
        format!("/usr/bin/{}", binary_name),          // System installation
    ];

    for path in common_paths {
        if Path::new(&path).exists() {
            return path;
        }
    }

    if let Ok(output) = StdCommand::new("which").arg(binary_name).output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if !path.is_empty() {
                return path;
            }
        }
    }

    binary_name.to_string()
}

/// Files in `dir` whose name starts with `prefix`, sorted by name
pub fn find_prefixed_files(dir: &Path, prefix: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut found = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if entry.file_name().to_string_lossy().starts_with(prefix) {
            found.push(entry.path());
        }
    }

    found.sort();
    Ok(found)
}

/// Remove leftovers from an earlier run so a scan only sees fresh files.
/// `keep` survives even when its name carries the prefix.
pub fn remove_prefixed_files(dir: &Path, prefix: &str, keep: Option<&Path>) -> std::io::Result<usize> {
    let mut stale = find_prefixed_files(dir, prefix)?;
    if let Some(keep) = keep {
        stale.retain(|p| !same_path(p, keep));
    }
    for path in &stale {
        tracing::debug!(path = %path.display(), "removing stale temporary file");
        std::fs::remove_file(path)?;
    }
    Ok(stale.len())
}

/// Both paths name the same file, or would once created
pub fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Owns an intermediate file and deletes it when dropped.
///
/// `persist` moves the file to its final name and disarms the guard.
#[derive(Debug)]
pub struct TempFile {
    path: PathBuf,
    armed: bool,
}

impl TempFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            armed: true,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn persist(mut self, dest: &Path) -> std::io::Result<()> {
        if same_path(&self.path, dest) {
            self.armed = false;
            return Ok(());
        }
        if std::fs::rename(&self.path, dest).is_err() {
            // rename fails across filesystems
            std::fs::copy(&self.path, dest)?;
        }
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        self.armed = false;
        Ok(())
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        if !self.armed || !self.path.exists() {
            return;
        }
        match std::fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "temporary file removed"),
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "failed to remove temporary file"),
        }
    }
}
