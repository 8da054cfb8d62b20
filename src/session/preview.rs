use std::fmt;

/// A preview attached to some surface (a video widget, a player).
///
/// The release callback runs exactly once: on `release()` or when the
/// handle is dropped, whichever comes first.
pub struct PreviewHandle {
    release: Option<Box<dyn FnOnce()>>,
}

impl PreviewHandle {
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn release(mut self) {
        self.run_release();
    }

    fn run_release(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for PreviewHandle {
    fn drop(&mut self) {
        self.run_release();
    }
}

impl fmt::Debug for PreviewHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PreviewHandle")
            .field("attached", &self.release.is_some())
            .finish()
    }
}
