//! Self-contained HTML report. Frame visualizations are embedded as data URIs.

use std::io::{self, Write};

use super::ReportDocument;
use crate::analysis::TopFrame;

pub fn write<W: Write>(writer: &mut W, doc: &ReportDocument) -> io::Result<()> {
    let result = &doc.result;
    let verdict_class = if result.is_likely_deepfake {
        "result fake"
    } else {
        "result genuine"
    };

    write!(
        writer,
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Deepfake Analysis Report</title>
    <style>
        body {{ font-family: Roboto, 'Segoe UI', Helvetica, Arial, sans-serif; background: #ffffff; color: #374151; margin: 0; }}
        .page {{ max-width: 800px; margin: 0 auto; padding: 40px; }}
        .header {{ margin-bottom: 30px; border-bottom: 2px solid #3b82f6; padding-bottom: 20px; }}
        .title {{ font-size: 28px; font-weight: 700; color: #1e40af; margin: 0; }}
        .subtitle {{ font-size: 16px; color: #6b7280; margin-top: 5px; }}
        .section {{ margin-bottom: 30px; }}
        .section-title {{ font-size: 20px; font-weight: 700; color: #1e40af; margin-bottom: 15px; border-bottom: 1px solid #e5e7eb; padding-bottom: 5px; }}
        .text p {{ font-size: 12pt; line-height: 1.6; }}
        .result {{ font-size: 16px; font-weight: 500; padding: 15px; border-radius: 8px; margin-bottom: 20px; }}
        .result.fake {{ background: #fee2e2; color: #dc2626; }}
        .result.genuine {{ background: #dcfce7; color: #16a34a; }}
        .percentage {{ display: flex; flex-direction: column; align-items: center; margin-bottom: 20px; }}
        .circle {{ width: 120px; height: 120px; border-radius: 60px; background: #3b82f6; display: flex; justify-content: center; align-items: center; font-size: 24px; font-weight: 700; color: #ffffff; }}
        .percentage-label {{ font-size: 14px; color: #6b7280; margin-top: 10px; }}
        .frames {{ display: flex; flex-wrap: wrap; justify-content: space-between; }}
        .frame {{ width: 48%; margin-bottom: 20px; border-radius: 8px; overflow: hidden; border: 1px solid #e5e7eb; }}
        .frame img {{ width: 100%; height: 150px; object-fit: cover; display: block; }}
        .frame .missing {{ height: 150px; display: flex; align-items: center; justify-content: center; color: #9ca3af; background: #f3f4f6; }}
        .frame-info {{ padding: 10px; background: #f9fafb; font-size: 10pt; }}
        .frame-info div {{ margin-bottom: 2px; }}
    </style>
</head>
<body>
<div class="page">
    <div class="header">
        <h1 class="title">Deepfake Analysis Report</h1>
        <div class="subtitle">Generated on {date}</div>
    </div>

    <div class="section">
        <h2 class="section-title">Analysis Results</h2>
        <div class="{verdict_class}">{verdict}</div>
        <div class="percentage">
            <div class="circle">{percentage}</div>
            <div class="percentage-label">Fake Percentage</div>
        </div>
    </div>

    <div class="section">
        <h2 class="section-title">Detailed Analysis</h2>
        <div class="text">
"#,
        date = escape_html(&doc.date_text()),
        verdict = escape_html(result.verdict_text()),
        percentage = escape_html(&result.percentage_text()),
    )?;

    for paragraph in paragraphs(&doc.narrative) {
        writeln!(writer, "            <p>{}</p>", escape_html(&paragraph).replace('\n', "<br>"))?;
    }

    writeln!(writer, "        </div>\n    </div>")?;

    if !result.top_frames.is_empty() {
        writeln!(
            writer,
            "\n    <div class=\"section\">\n        <h2 class=\"section-title\">Top Analyzed Frames</h2>\n        <div class=\"frames\">"
        )?;
        for frame in &result.top_frames {
            write_frame(writer, frame)?;
        }
        writeln!(writer, "        </div>\n    </div>")?;
    }

    writeln!(writer, "</div>\n</body>\n</html>")
}

fn write_frame<W: Write>(writer: &mut W, frame: &TopFrame) -> io::Result<()> {
    writeln!(writer, "            <div class=\"frame\">")?;
    match frame.visualization.as_deref().map(str::trim) {
        Some(encoded) if frame.visualization_bytes().is_some() => writeln!(
            writer,
            "                <img src=\"data:image/png;base64,{encoded}\" alt=\"Frame {}\">",
            frame.frame_number
        )?,
        _ => writeln!(writer, "                <div class=\"missing\">No visualization</div>")?,
    }
    writeln!(
        writer,
        "                <div class=\"frame-info\">\n                    <div>Frame: {}</div>\n                    <div>Prediction: {}</div>\n                    <div>Confidence: {}</div>\n                </div>\n            </div>",
        frame.frame_number,
        escape_html(&frame.prediction),
        frame.confidence_text()
    )
}

/// Split on blank lines, dropping empty paragraphs.
fn paragraphs(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                out.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        out.push(current.join("\n"));
    }
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::super::tests::document;
    use super::super::ExportFormat;
    use super::*;

    #[test]
    fn html_embeds_verdict_narrative_and_frames() {
        let html = document().render(ExportFormat::Html);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("Generated on October 16, 2026"));
        assert!(html.contains(r#"<div class="result fake">This video is likely a deepfake.</div>"#));
        assert!(html.contains(r#"<div class="circle">87.50%</div>"#));
        assert!(html.contains("<p>Blending artifacts around the jaw.</p>"));
        assert!(html.contains("<p>Lighting is inconsistent.</p>"));
        assert!(html.contains(r#"src="data:image/png;base64,iVBORw0KGgo=""#));
        assert!(html.contains("No visualization"));
        assert!(html.contains("<div>Confidence: 93.10%</div>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn narrative_is_escaped() {
        let mut doc = document();
        doc.narrative = "<script>alert('x')</script> & more".into();
        doc.result.is_likely_deepfake = false;
        let html = doc.render(ExportFormat::Html);
        assert!(html.contains("&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; more"));
        assert!(html.contains(r#"class="result genuine""#));
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        assert_eq!(
            paragraphs("one\ntwo\n\n\nthree  \n"),
            vec!["one\ntwo".to_string(), "three".to_string()]
        );
        assert!(paragraphs("  \n").is_empty());
    }
}
