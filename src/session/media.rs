use std::path::{Path, PathBuf};

use super::preview::PreviewHandle;
use crate::capture::RecordedClip;
use crate::error::SelectionError;

/// Map a file extension to a video MIME type. Anything else is rejected.
pub fn video_mime(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "mp4" => "video/mp4",
        "m4v" => "video/x-m4v",
        "webm" => "video/webm",
        "ogg" | "ogv" => "video/ogg",
        "mov" => "video/quicktime",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mpeg" | "mpg" => "video/mpeg",
        "3gp" => "video/3gpp",
        _ => return None,
    };
    Some(mime)
}

#[derive(Debug)]
enum MediaSource {
    File(PathBuf),
    Recorded(RecordedClip),
}

/// The video currently chosen for upload.
#[derive(Debug)]
pub struct MediaSelection {
    name: String,
    mime: String,
    size: u64,
    source: MediaSource,
    preview: Option<PreviewHandle>,
}

impl MediaSelection {
    /// Accept a user-picked file if it looks like a video within `max_bytes`.
    pub fn from_path(path: &Path, max_bytes: u64) -> Result<Self, SelectionError> {
        let mime = video_mime(path).ok_or_else(|| SelectionError::NotVideo(path.to_path_buf()))?;
        let meta = std::fs::metadata(path).map_err(|source| SelectionError::Unreadable {
            path: path.to_path_buf(),
            source,
        })?;
        if !meta.is_file() {
            return Err(SelectionError::NotVideo(path.to_path_buf()));
        }

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "video".into());

        if meta.len() > max_bytes {
            return Err(SelectionError::TooLarge {
                name,
                size_mb: meta.len() / (1024 * 1024),
                limit_mb: max_bytes / (1024 * 1024),
            });
        }

        Ok(Self {
            name,
            mime: mime.to_string(),
            size: meta.len(),
            source: MediaSource::File(path.to_path_buf()),
            preview: None,
        })
    }

    pub fn recorded(clip: RecordedClip) -> Self {
        Self {
            name: clip.file_name().to_string(),
            mime: clip.mime().to_string(),
            size: clip.size(),
            source: MediaSource::Recorded(clip),
            preview: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn path(&self) -> &Path {
        match &self.source {
            MediaSource::File(path) => path,
            MediaSource::Recorded(clip) => clip.path(),
        }
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.source, MediaSource::Recorded(_))
    }

    /// Attach a preview, releasing any previous one first.
    pub fn set_preview(&mut self, handle: PreviewHandle) {
        if let Some(old) = self.preview.replace(handle) {
            old.release();
        }
    }

    pub fn upload_source(&self) -> UploadSource {
        UploadSource {
            path: self.path().to_path_buf(),
            file_name: self.name.clone(),
            mime: self.mime.clone(),
            _recording: match &self.source {
                MediaSource::Recorded(clip) => Some(clip.clone()),
                MediaSource::File(_) => None,
            },
        }
    }
}

/// What an upload task needs. Holds recordings alive until the task ends,
/// even if the selection is replaced meanwhile.
#[derive(Debug, Clone)]
pub struct UploadSource {
    pub path: PathBuf,
    pub file_name: String,
    pub mime: String,
    _recording: Option<RecordedClip>,
}

#[cfg(test)]
impl UploadSource {
    pub fn for_file(path: impl AsRef<Path>, file_name: &str, mime: &str) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            file_name: file_name.into(),
            mime: mime.into(),
            _recording: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn mime_by_extension() {
        assert_eq!(video_mime(Path::new("a/b/clip.MP4")), Some("video/mp4"));
        assert_eq!(video_mime(Path::new("clip.webm")), Some("video/webm"));
        assert_eq!(video_mime(Path::new("clip.ogv")), Some("video/ogg"));
        assert_eq!(video_mime(Path::new("notes.txt")), None);
        assert_eq!(video_mime(Path::new("README")), None);
    }

    #[test]
    fn accepts_video_within_limit() {
        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(&[0u8; 2048]).unwrap();

        let media = MediaSelection::from_path(file.path(), 4096).unwrap();
        assert_eq!(media.mime(), "video/mp4");
        assert_eq!(media.size(), 2048);
        assert!(media.name().ends_with(".mp4"));
        assert!(!media.is_recording());

        let source = media.upload_source();
        assert_eq!(source.path, file.path());
        assert_eq!(source.mime, "video/mp4");
    }

    #[test]
    fn rejects_non_video() {
        let file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        let err = MediaSelection::from_path(file.path(), u64::MAX).unwrap_err();
        assert!(matches!(err, SelectionError::NotVideo(_)));
    }

    #[test]
    fn rejects_oversized_video() {
        let mut file = tempfile::Builder::new().suffix(".webm").tempfile().unwrap();
        file.write_all(&[0u8; 4096]).unwrap();
        let err = MediaSelection::from_path(file.path(), 1024).unwrap_err();
        assert!(matches!(err, SelectionError::TooLarge { .. }));
    }

    #[test]
    fn rejects_missing_file() {
        let err = MediaSelection::from_path(Path::new("/no/such/clip.mp4"), u64::MAX).unwrap_err();
        assert!(matches!(err, SelectionError::Unreadable { .. }));
    }
}
