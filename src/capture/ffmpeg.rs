use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, Command};

use super::{CameraSession, CameraTracks};
use crate::config::CameraConfig;
use crate::error::{CaptureError, CaptureResult};

/// How long ffmpeg gets to finalize the container after `q`.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Camera tracks backed by an ffmpeg child that encodes to WebM.
pub struct FfmpegTracks {
    child: Child,
    program: String,
}

/// Open the configured camera and start encoding into a temporary file.
/// Must be called from within the tokio runtime.
pub fn open_camera(config: &CameraConfig) -> CaptureResult<CameraSession<FfmpegTracks>> {
    let output = tempfile::Builder::new()
        .prefix("deepfake-inspector-")
        .suffix(".webm")
        .tempfile()?
        .into_temp_path();

    let child = Command::new(&config.ffmpeg)
        .args(["-hide_banner", "-loglevel", "error", "-nostats"])
        .args(["-f", config.input_format.as_str(), "-i", config.device.as_str()])
        .args(["-an", "-c:v", "libvpx", "-deadline", "realtime", "-b:v", "1M", "-y"])
        .arg(&*output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|source| CaptureError::Spawn {
            program: config.ffmpeg.clone(),
            source,
        })?;

    log::info!(
        "Camera opened: {} -f {} -i {}",
        config.ffmpeg,
        config.input_format,
        config.device
    );

    let tracks = FfmpegTracks {
        child,
        program: config.ffmpeg.clone(),
    };
    Ok(CameraSession::new(tracks, output, config.window_secs))
}

impl CameraTracks for FfmpegTracks {
    async fn stop(&mut self) -> CaptureResult<()> {
        // `q` on stdin makes ffmpeg write the trailer and exit.
        if let Some(mut stdin) = self.child.stdin.take() {
            if let Err(e) = stdin.write_all(b"q").await {
                log::debug!("{} stdin closed early: {e}", self.program);
            }
        }

        match tokio::time::timeout(STOP_GRACE, self.child.wait()).await {
            Ok(Ok(status)) => {
                log::debug!("{} exited with {status}", self.program);
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => {
                log::warn!("{} did not stop within {STOP_GRACE:?}, killing", self.program);
                self.child.kill().await?;
                Ok(())
            }
        }
    }

    async fn exited(&mut self) -> CaptureError {
        let status = match self.child.wait().await {
            Ok(status) => status,
            Err(e) => return CaptureError::Io(e),
        };

        let mut detail = String::new();
        if let Some(mut stderr) = self.child.stderr.take() {
            let _ = stderr.read_to_string(&mut detail).await;
        }
        let detail = detail.trim();

        if detail.is_empty() {
            CaptureError::exited(format!("{} exited ({status})", self.program))
        } else {
            CaptureError::exited(format!("{} exited ({status}): {detail}", self.program))
        }
    }

    fn abort(&mut self) {
        if let Err(e) = self.child.start_kill() {
            log::debug!("{} already gone: {e}", self.program);
        }
    }
}
