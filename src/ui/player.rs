use std::path::Path;

use gtk4::prelude::*;

use crate::session::PreviewHandle;

/// Show `path` in every video widget. Releasing the handle detaches the
/// media from widgets still showing it and closes the stream.
pub fn show_preview(videos: &[gtk4::Video], path: &Path) -> PreviewHandle {
    let media = gtk4::MediaFile::for_filename(path);
    for video in videos {
        video.set_media_stream(Some(&media));
    }

    let videos = videos.to_vec();
    PreviewHandle::new(move || {
        let stream = media.upcast_ref::<gtk4::MediaStream>();
        for video in &videos {
            if video.media_stream().as_ref() == Some(stream) {
                video.set_media_stream(None::<&gtk4::MediaStream>);
            }
        }
        media.clear();
        log::debug!("Released preview");
    })
}
