use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, error};

use crate::error::PipeError;

/// Run `binary args...` with `input` on stdin and collect stdout
///
/// Callers supply the full argument list including `pipe:0` / `pipe:1`.
pub async fn pipe(binary: &Path, args: &[String], input: Vec<u8>) -> Result<Vec<u8>, PipeError> {
    if Command::new(binary).arg("-version").output().await.is_err() {
        return Err(PipeError::NotFound);
    }

    let mut child = Command::new(binary)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(PipeError::Spawn)?;

    let missing = |stream: &str| PipeError::Io(std::io::Error::other(format!("ffmpeg {} not captured", stream)));
    let mut stdin = child.stdin.take().ok_or_else(|| missing("stdin"))?;
    let mut stdout = child.stdout.take().ok_or_else(|| missing("stdout"))?;
    let mut stderr = child.stderr.take().ok_or_else(|| missing("stderr"))?;

    debug!(input_bytes = input.len(), "Feeding ffmpeg");

    // stdin is fed from its own task so a full stdout pipe cannot stall it
    let writer = tokio::spawn(async move {
        if let Err(e) = stdin.write_all(&input).await {
            error!(error = %e, "Failed to write to ffmpeg stdin");
        }
    });

    let mut output = Vec::new();
    let mut stderr_output = Vec::new();
    let (stdout_result, stderr_result) =
        tokio::join!(stdout.read_to_end(&mut output), stderr.read_to_end(&mut stderr_output));
    stdout_result?;
    stderr_result?;

    let _ = writer.await;

    let status = child.wait().await?;
    if !status.success() {
        let stderr = String::from_utf8_lossy(&stderr_output).trim().to_string();
        error!(%status, stderr = %stderr, "ffmpeg failed");
        return Err(PipeError::Failed { status, stderr });
    }

    debug!(output_bytes = output.len(), "ffmpeg finished");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary() {
        let result = pipe(Path::new("/nonexistent/ffmpeg-binary"), &[], vec![1, 2, 3]).await;
        assert!(matches!(result, Err(PipeError::NotFound)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdin_reaches_stdout() {
        let input: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let output = pipe(Path::new("cat"), &[], input.clone()).await.unwrap();
        assert_eq!(output, input);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_failure() {
        let result = pipe(Path::new("false"), &[], Vec::new()).await;
        assert!(matches!(result, Err(PipeError::Failed { status, .. }) if !status.success()));
    }
}
