//! Camera recording with a fixed countdown window.
//!
//! A [`CameraSession`] owns the camera tracks. They are stopped exactly
//! once: when the countdown expires, when the user stops early, or, if the
//! session is dropped before either (failure, teardown), through `abort`.

mod ffmpeg;

pub use ffmpeg::{open_camera, FfmpegTracks};

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempPath;

use crate::error::{CaptureError, CaptureResult};

/// A live set of camera tracks feeding a recorder.
pub trait CameraTracks: Send {
    /// Stop every track and let the recorder flush its output.
    fn stop(&mut self) -> impl Future<Output = CaptureResult<()>> + Send;

    /// Resolves only if the tracks end on their own before being stopped.
    fn exited(&mut self) -> impl Future<Output = CaptureError> + Send;

    /// Tear down without flushing.
    fn abort(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    TimerExpired,
    Manual,
}

/// A finished recording. The temporary file is deleted when the last
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct RecordedClip {
    file: Arc<TempPath>,
    size: u64,
}

impl RecordedClip {
    pub const FILE_NAME: &'static str = "recorded_video.webm";
    pub const MIME: &'static str = "video/webm";

    fn new(file: TempPath, size: u64) -> Self {
        Self {
            file: Arc::new(file),
            size,
        }
    }

    pub fn path(&self) -> &Path {
        &self.file
    }

    pub fn file_name(&self) -> &str {
        Self::FILE_NAME
    }

    pub fn mime(&self) -> &str {
        Self::MIME
    }

    pub fn size(&self) -> u64 {
        self.size
    }
}

pub struct CameraSession<T: CameraTracks> {
    tracks: Option<T>,
    output: Option<TempPath>,
    window_secs: u32,
}

impl<T: CameraTracks> CameraSession<T> {
    pub fn new(tracks: T, output: TempPath, window_secs: u32) -> Self {
        Self {
            tracks: Some(tracks),
            output: Some(output),
            window_secs: window_secs.max(1),
        }
    }

    /// Record until the window elapses or `stop` fires. `on_tick` gets the
    /// remaining whole seconds, starting with the full window and ending at
    /// zero when the timer expires.
    pub async fn record<F>(
        mut self,
        stop: async_channel::Receiver<()>,
        on_tick: F,
    ) -> CaptureResult<RecordedClip>
    where
        F: Fn(u32),
    {
        let mut remaining = self.window_secs;
        let mut interval = tokio::time::interval(Duration::from_secs(1));
        interval.tick().await;
        on_tick(remaining);

        let reason = {
            let Some(tracks) = self.tracks.as_mut() else {
                return Err(CaptureError::AlreadyStopped);
            };
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        remaining = remaining.saturating_sub(1);
                        on_tick(remaining);
                        if remaining == 0 {
                            break StopReason::TimerExpired;
                        }
                    }
                    _ = stop.recv() => break StopReason::Manual,
                    err = tracks.exited() => return Err(err),
                }
            }
        };

        self.finish(reason).await
    }

    async fn finish(mut self, reason: StopReason) -> CaptureResult<RecordedClip> {
        log::info!("Stopping camera ({reason:?})");
        let mut tracks = self.tracks.take().ok_or(CaptureError::AlreadyStopped)?;
        tracks.stop().await?;

        let output = self.output.take().ok_or(CaptureError::AlreadyStopped)?;
        let size = tokio::fs::metadata(&output).await?.len();
        if size == 0 {
            return Err(CaptureError::EmptyRecording);
        }
        log::info!("Recorded {size} bytes to {}", output.display());
        Ok(RecordedClip::new(output, size))
    }
}

impl<T: CameraTracks> Drop for CameraSession<T> {
    fn drop(&mut self) {
        if let Some(mut tracks) = self.tracks.take() {
            log::debug!("Camera session dropped while live, aborting tracks");
            tracks.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct Counters {
        stops: AtomicUsize,
        aborts: AtomicUsize,
    }

    impl Counters {
        fn releases(&self) -> (usize, usize) {
            (
                self.stops.load(Ordering::SeqCst),
                self.aborts.load(Ordering::SeqCst),
            )
        }
    }

    struct MockTracks {
        counters: Arc<Counters>,
        dies_after: Option<Duration>,
    }

    impl CameraTracks for MockTracks {
        async fn stop(&mut self) -> CaptureResult<()> {
            self.counters.stops.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn exited(&mut self) -> CaptureError {
            match self.dies_after {
                Some(after) => {
                    tokio::time::sleep(after).await;
                    CaptureError::exited("Permission denied")
                }
                None => std::future::pending().await,
            }
        }

        fn abort(&mut self) {
            self.counters.aborts.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn output_with(bytes: &[u8]) -> TempPath {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(bytes).unwrap();
        file.into_temp_path()
    }

    fn session(dies_after: Option<Duration>, bytes: &[u8]) -> (Arc<Counters>, CameraSession<MockTracks>) {
        let counters = Arc::new(Counters::default());
        let tracks = MockTracks {
            counters: counters.clone(),
            dies_after,
        };
        (counters, CameraSession::new(tracks, output_with(bytes), 5))
    }

    #[tokio::test(start_paused = true)]
    async fn timer_expiry_stops_tracks_once() {
        let (counters, session) = session(None, b"webm");
        let (_stop_tx, stop_rx) = async_channel::bounded(1);
        let ticks = Mutex::new(Vec::new());

        let clip = session
            .record(stop_rx, |left| ticks.lock().unwrap().push(left))
            .await
            .unwrap();

        assert_eq!(*ticks.lock().unwrap(), vec![5, 4, 3, 2, 1, 0]);
        assert_eq!(counters.releases(), (1, 0));
        assert_eq!(clip.size(), 4);
        assert_eq!(clip.file_name(), "recorded_video.webm");
        assert!(clip.path().exists());
    }

    #[tokio::test(start_paused = true)]
    async fn manual_stop_stops_tracks_once() {
        let (counters, session) = session(None, b"webm");
        let (stop_tx, stop_rx) = async_channel::bounded(1);
        stop_tx.send(()).await.unwrap();

        let ticks = Mutex::new(Vec::new());
        session
            .record(stop_rx, |left| ticks.lock().unwrap().push(left))
            .await
            .unwrap();

        assert_eq!(*ticks.lock().unwrap(), vec![5]);
        assert_eq!(counters.releases(), (1, 0));
    }

    #[tokio::test(start_paused = true)]
    async fn camera_failure_releases_through_abort_once() {
        let (counters, session) = session(Some(Duration::from_millis(100)), b"webm");
        let (_stop_tx, stop_rx) = async_channel::bounded(1);

        let err = session.record(stop_rx, |_| {}).await.unwrap_err();
        assert!(matches!(err, CaptureError::Exited(_)));
        assert_eq!(counters.releases(), (0, 1));
    }

    #[test]
    fn teardown_before_recording_aborts_once() {
        let (counters, session) = session(None, b"webm");
        drop(session);
        assert_eq!(counters.releases(), (0, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_output_is_an_error_after_a_single_stop() {
        let (counters, session) = session(None, b"");
        let (stop_tx, stop_rx) = async_channel::bounded(1);
        stop_tx.send(()).await.unwrap();

        let err = session.record(stop_rx, |_| {}).await.unwrap_err();
        assert!(matches!(err, CaptureError::EmptyRecording));
        assert_eq!(counters.releases(), (1, 0));
    }

    #[test]
    fn clip_file_lives_until_last_clone_drops() {
        let clip = RecordedClip::new(output_with(b"data"), 4);
        let path = clip.path().to_path_buf();
        let copy = clip.clone();
        drop(clip);
        assert!(path.exists());
        drop(copy);
        assert!(!path.exists());
    }
}
