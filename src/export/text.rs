use std::io::{self, Write};

use super::ReportDocument;

pub fn write<W: Write>(writer: &mut W, doc: &ReportDocument) -> io::Result<()> {
    let result = &doc.result;

    writeln!(writer, "Deepfake Analysis Report")?;
    writeln!(writer, "Generated on {}", doc.date_text())?;
    writeln!(writer)?;

    writeln!(writer, "Analysis Results")?;
    writeln!(writer, "----------------")?;
    writeln!(writer, "{}", result.verdict_text())?;
    writeln!(writer, "Fake Percentage: {}", result.percentage_text())?;
    writeln!(writer)?;

    writeln!(writer, "Detailed Analysis")?;
    writeln!(writer, "-----------------")?;
    writeln!(writer, "{}", doc.narrative.trim())?;

    if !result.top_frames.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "Top Analyzed Frames")?;
        writeln!(writer, "-------------------")?;
        for frame in &result.top_frames {
            writeln!(
                writer,
                "Frame {}: Prediction - {}, Confidence - {}",
                frame.frame_number,
                frame.prediction,
                frame.confidence_text()
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::tests::document;
    use super::super::ExportFormat;

    #[test]
    fn plain_text_has_every_section() {
        let text = document().render(ExportFormat::Text);
        assert!(text.starts_with("Deepfake Analysis Report\nGenerated on October 16, 2026\n"));
        assert!(text.contains("This video is likely a deepfake.\nFake Percentage: 87.50%\n"));
        assert!(text.contains("Blending artifacts around the jaw.\n\nLighting is inconsistent.\n"));
        assert!(text.contains("Frame 12: Prediction - fake, Confidence - 93.10%\n"));
        assert!(text.ends_with("Frame 30: Prediction - fake, Confidence - 88.00%\n"));
    }

    #[test]
    fn frames_section_is_omitted_when_empty() {
        let mut doc = document();
        doc.result.top_frames.clear();
        assert!(!doc.render(ExportFormat::Text).contains("Top Analyzed Frames"));
    }
}
