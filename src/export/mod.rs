//! Local report documents: plain text and a self-contained HTML page.

mod html;
mod text;

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::analysis::AnalysisResult;
use crate::error::ExportError;
use crate::session::{ReportState, UploadSession};

const BASE_NAME: &str = "deepfake-analysis-report";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Html,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Html => "html",
        }
    }
}

/// Everything a report document shows.
#[derive(Debug, Clone)]
pub struct ReportDocument {
    pub generated_on: NaiveDate,
    pub result: AnalysisResult,
    pub narrative: String,
}

impl ReportDocument {
    /// Only a complete session with a ready narrative can be exported.
    pub fn from_session(session: &UploadSession, generated_on: NaiveDate) -> Result<Self, ExportError> {
        let result = session
            .result()
            .ok_or_else(|| ExportError::not_ready("the analysis has not completed"))?;
        match session.report() {
            Some(ReportState::Ready(narrative)) => Ok(Self {
                generated_on,
                result: result.clone(),
                narrative: narrative.clone(),
            }),
            _ => Err(ExportError::not_ready("no report has been generated")),
        }
    }

    pub fn date_text(&self) -> String {
        self.generated_on.format("%B %-d, %Y").to_string()
    }

    pub fn write<W: Write>(&self, format: ExportFormat, writer: &mut W) -> io::Result<()> {
        match format {
            ExportFormat::Text => text::write(writer, self),
            ExportFormat::Html => html::write(writer, self),
        }
    }

    pub fn render(&self, format: ExportFormat) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write(format, &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Save into `dir` without overwriting: `name.ext`, `name (1).ext`, ...
    pub fn save(&self, format: ExportFormat, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let (path, file) = create_unique(dir, format.extension())?;
        let mut writer = BufWriter::new(file);
        self.write(format, &mut writer)?;
        writer.flush()?;
        log::info!("Saved report to {}", path.display());
        Ok(path)
    }
}

fn create_unique(dir: &Path, ext: &str) -> io::Result<(PathBuf, File)> {
    let mut n = 0u32;
    loop {
        let name = if n == 0 {
            format!("{BASE_NAME}.{ext}")
        } else {
            format!("{BASE_NAME} ({n}).{ext}")
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write as _;

    use super::*;
    use crate::analysis::TopFrame;
    use crate::session::MediaSelection;

    pub(super) fn document() -> ReportDocument {
        ReportDocument {
            generated_on: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            result: AnalysisResult {
                fake_percentage: Some(87.5),
                is_likely_deepfake: true,
                top_frames: vec![
                    TopFrame {
                        frame_number: 12,
                        prediction: "fake".into(),
                        confidence: 0.931,
                        visualization: Some("iVBORw0KGgo=".into()),
                    },
                    TopFrame {
                        frame_number: 30,
                        prediction: "fake".into(),
                        confidence: 0.88,
                        visualization: None,
                    },
                ],
            },
            narrative: "Blending artifacts around the jaw.\n\nLighting is inconsistent.".into(),
        }
    }

    #[test]
    fn export_needs_complete_session_with_report() {
        let date = NaiveDate::from_ymd_opt(2026, 1, 2).unwrap();
        let mut session = UploadSession::new();
        assert!(ReportDocument::from_session(&session, date).is_err());

        let mut file = tempfile::Builder::new().suffix(".mp4").tempfile().unwrap();
        file.write_all(b"x").unwrap();
        session.select(MediaSelection::from_path(file.path(), u64::MAX).unwrap());
        let (ticket, _) = session.begin_upload().unwrap();
        session.acknowledge(ticket).unwrap();
        session.complete(ticket, document().result).unwrap();
        assert!(matches!(
            ReportDocument::from_session(&session, date),
            Err(ExportError::NotReady(_))
        ));

        let (report, _) = session.request_report().unwrap();
        session.report_ready(report, "narrative".into()).unwrap();
        let doc = ReportDocument::from_session(&session, date).unwrap();
        assert_eq!(doc.narrative, "narrative");
        assert_eq!(doc.date_text(), "January 2, 2026");
    }

    #[test]
    fn save_never_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let doc = document();

        let first = doc.save(ExportFormat::Text, dir.path()).unwrap();
        let second = doc.save(ExportFormat::Text, dir.path()).unwrap();
        let html = doc.save(ExportFormat::Html, dir.path()).unwrap();

        assert_eq!(first.file_name().unwrap(), "deepfake-analysis-report.txt");
        assert_eq!(second.file_name().unwrap(), "deepfake-analysis-report (1).txt");
        assert_eq!(html.file_name().unwrap(), "deepfake-analysis-report.html");
        assert_eq!(
            std::fs::read_to_string(&first).unwrap(),
            doc.render(ExportFormat::Text)
        );
    }
}
