//! Headless commands: `analyze` and `serve-report`.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tokio::net::TcpListener;
use tokio::sync::oneshot;

use crate::analysis::{AnalysisClient, UploadEvent};
use crate::config::Config;
use crate::error::{CliError, ExportError};
use crate::export::{ExportFormat, ReportDocument};
use crate::report::{self, LlmClient, ReportClient};
use crate::session::{MediaSelection, UploadSession};

pub const USAGE: &str = "\
Usage:
  deepfake-inspector                      start the desktop app
  deepfake-inspector analyze <video> [--report] [--text <file>] [--html <file>]
  deepfake-inspector serve-report [--bind <addr>]";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Gui,
    Analyze(AnalyzeArgs),
    ServeReport { bind: Option<String> },
    Help,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnalyzeArgs {
    pub video: PathBuf,
    pub report: bool,
    pub text: Option<PathBuf>,
    pub html: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// Writing a document needs the narrative, so either output implies `--report`.
    pub fn wants_report(&self) -> bool {
        self.report || self.text.is_some() || self.html.is_some()
    }
}

/// Parse arguments, excluding the program name.
pub fn parse<I>(args: I) -> Result<Command, CliError>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let Some(command) = args.next() else {
        return Ok(Command::Gui);
    };

    match command.as_str() {
        "analyze" => parse_analyze(args).map(Command::Analyze),
        "serve-report" => {
            let mut bind = None;
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--bind" => bind = Some(value_for("--bind", args.next())?),
                    other => return Err(CliError::usage(format!("Unexpected argument: {other}"))),
                }
            }
            Ok(Command::ServeReport { bind })
        }
        "-h" | "--help" | "help" => Ok(Command::Help),
        other => Err(CliError::usage(format!("Unknown command: {other}"))),
    }
}

fn parse_analyze(mut args: impl Iterator<Item = String>) -> Result<AnalyzeArgs, CliError> {
    let mut parsed = AnalyzeArgs::default();
    let mut video = None;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--report" => parsed.report = true,
            "--text" => parsed.text = Some(value_for("--text", args.next())?.into()),
            "--html" => parsed.html = Some(value_for("--html", args.next())?.into()),
            flag if flag.starts_with("--") => {
                return Err(CliError::usage(format!("Unknown option: {flag}")));
            }
            _ if video.is_none() => video = Some(PathBuf::from(arg)),
            _ => return Err(CliError::usage(format!("Unexpected argument: {arg}"))),
        }
    }
    parsed.video = video.ok_or_else(|| CliError::usage("analyze needs a video file"))?;
    Ok(parsed)
}

fn value_for(flag: &str, value: Option<String>) -> Result<String, CliError> {
    value.ok_or_else(|| CliError::usage(format!("{flag} needs a value")))
}

/// Run one video through the session and print the verdict.
pub async fn analyze(config: &Config, args: &AnalyzeArgs) -> Result<(), CliError> {
    let mut session = UploadSession::new();
    session.select(MediaSelection::from_path(&args.video, config.max_upload_bytes())?);

    let client = AnalysisClient::new(config.analysis_endpoint.clone(), config.request_timeout())?;
    let (ticket, source) = session.begin_upload()?;

    let (event_tx, event_rx) = async_channel::unbounded::<UploadEvent>();
    let outcome = client
        .analyze(&source, move |event| {
            let _ = event_tx.try_send(event);
        })
        .await;

    while let Ok(event) = event_rx.try_recv() {
        match event {
            UploadEvent::Progress(percent) => {
                log::debug!("Upload {percent:.0}%");
                if let Err(e) = session.upload_progress(ticket, percent) {
                    log::debug!("Dropped progress event: {e}");
                }
            }
            UploadEvent::Acknowledged => session.acknowledge(ticket)?,
        }
    }

    match outcome {
        Ok(result) => session.complete(ticket, result)?,
        Err(e) => {
            session.fail(ticket, e.to_string())?;
            return Err(e.into());
        }
    }

    if let Some(result) = session.result() {
        println!("{}", result.verdict_text());
        println!("Fake Percentage: {}", result.percentage_text());
        for frame in &result.top_frames {
            println!(
                "Frame {}: Prediction - {}, Confidence - {}",
                frame.frame_number,
                frame.prediction,
                frame.confidence_text()
            );
        }
    }

    if !args.wants_report() {
        return Ok(());
    }

    let (endpoint, relay_shutdown) = report_endpoint(config).await?;
    let narrative = generate_report(config, &endpoint, &mut session).await;
    if let Some(shutdown) = relay_shutdown {
        let _ = shutdown.send(());
    }
    let narrative = narrative?;
    println!();
    println!("{}", narrative.trim());

    let doc = ReportDocument::from_session(&session, chrono::Local::now().date_naive())?;
    if let Some(path) = &args.text {
        write_document(&doc, ExportFormat::Text, path)?;
    }
    if let Some(path) = &args.html {
        write_document(&doc, ExportFormat::Html, path)?;
    }
    Ok(())
}

async fn generate_report(
    config: &Config,
    endpoint: &str,
    session: &mut UploadSession,
) -> Result<String, CliError> {
    let client = ReportClient::new(endpoint, config.request_timeout())?;
    let (ticket, result) = session.request_report()?;
    match client.generate(&result).await {
        Ok(text) => {
            session.report_ready(ticket, text.clone())?;
            Ok(text)
        }
        Err(e) => {
            session.report_failed(ticket, e.to_string())?;
            Err(e.into())
        }
    }
}

/// With the relay enabled, run a private one on an ephemeral port for the
/// duration of the command. Otherwise use the configured endpoint.
async fn report_endpoint(config: &Config) -> Result<(String, Option<oneshot::Sender<()>>), CliError> {
    if !config.relay.enabled {
        return Ok((config.report_endpoint.clone(), None));
    }

    let llm = LlmClient::new(&config.llm, config.request_timeout())?;
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    tokio::spawn(async move {
        let shutdown = async move {
            let _ = shutdown_rx.await;
        };
        if let Err(e) = report::serve(listener, llm, shutdown).await {
            log::error!("Report relay stopped: {e}");
        }
    });
    Ok((format!("http://{addr}/api/generate-report"), Some(shutdown_tx)))
}

fn write_document(doc: &ReportDocument, format: ExportFormat, path: &Path) -> Result<(), CliError> {
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .map_err(ExportError::from)?;
    let mut writer = BufWriter::new(file);
    doc.write(format, &mut writer).map_err(ExportError::from)?;
    writer.flush().map_err(ExportError::from)?;
    log::info!("Wrote {}", path.display());
    println!("Saved {}", path.display());
    Ok(())
}

/// Serve the report relay until Ctrl+C.
pub async fn serve_report(config: &Config, bind: Option<&str>) -> Result<(), CliError> {
    let llm = LlmClient::new(&config.llm, config.request_timeout())?;
    let bind = bind.unwrap_or(&config.relay.bind);
    let listener = TcpListener::bind(bind).await?;
    report::serve(listener, llm, async {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Shutting down report relay");
    })
    .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_start_the_gui() {
        assert_eq!(parse(args(&[])).unwrap(), Command::Gui);
    }

    #[test]
    fn analyze_flags() {
        let cmd = parse(args(&["analyze", "clip.mp4", "--html", "out.html"])).unwrap();
        let Command::Analyze(a) = cmd else {
            panic!("expected analyze");
        };
        assert_eq!(a.video, PathBuf::from("clip.mp4"));
        assert_eq!(a.html, Some(PathBuf::from("out.html")));
        assert!(!a.report);
        assert!(a.wants_report());
    }

    #[test]
    fn usage_errors() {
        assert!(matches!(parse(args(&["analyze"])), Err(CliError::Usage(_))));
        assert!(matches!(
            parse(args(&["analyze", "a.mp4", "--text"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(
            parse(args(&["analyze", "a.mp4", "b.mp4"])),
            Err(CliError::Usage(_))
        ));
        assert!(matches!(parse(args(&["bogus"])), Err(CliError::Usage(_))));
        assert_eq!(
            parse(args(&["serve-report", "--bind", "0.0.0.0:9000"])).unwrap(),
            Command::ServeReport {
                bind: Some("0.0.0.0:9000".into())
            }
        );
    }

    fn video_file(dir: &Path) -> PathBuf {
        let path = dir.join("clip.mp4");
        std::fs::write(&path, vec![7u8; 2048]).unwrap();
        path
    }

    #[tokio::test]
    async fn analyze_writes_report_documents() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/analyze"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "fake_percentage": 12.0,
                "is_likely_deepfake": false,
                "top_frames": [{"frame_number": 3, "prediction": "real", "confidence": 0.9}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/generate-report"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"report": "Genuine."})))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.analysis_endpoint = format!("{}/analyze", server.uri());
        config.report_endpoint = format!("{}/api/generate-report", server.uri());
        config.relay.enabled = false;
        config.request_timeout_secs = 5;

        let text = dir.path().join("report.txt");
        let html = dir.path().join("report.html");
        let args = AnalyzeArgs {
            video: video_file(dir.path()),
            report: false,
            text: Some(text.clone()),
            html: Some(html.clone()),
        };
        analyze(&config, &args).await.unwrap();

        let saved = std::fs::read_to_string(&text).unwrap();
        assert!(saved.contains("This video is likely genuine."));
        assert!(saved.contains("Genuine."));
        assert!(std::fs::read_to_string(&html).unwrap().contains("<!DOCTYPE html>"));

        // Existing outputs are never overwritten.
        assert!(analyze(&config, &args).await.is_err());
    }

    #[tokio::test]
    async fn analysis_failure_is_returned() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.analysis_endpoint = server.uri();
        config.request_timeout_secs = 5;

        let args = AnalyzeArgs {
            video: video_file(dir.path()),
            ..AnalyzeArgs::default()
        };
        let err = analyze(&config, &args).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 503");
    }

    #[tokio::test]
    async fn private_relay_is_used_when_enabled() {
        let llm = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "choices": [{"message": {"role": "assistant", "content": "From the relay."}}]
            })))
            .expect(1)
            .mount(&llm)
            .await;

        let mut config = Config::default();
        config.llm.api_key = "sk-test".into();
        config.llm.base_url = llm.uri();
        config.request_timeout_secs = 5;

        let (endpoint, shutdown) = report_endpoint(&config).await.unwrap();
        assert!(endpoint.starts_with("http://127.0.0.1:"));

        let client = ReportClient::new(endpoint, Duration::from_secs(5)).unwrap();
        let result = crate::analysis::AnalysisResult {
            fake_percentage: Some(50.0),
            is_likely_deepfake: true,
            top_frames: Vec::new(),
        };
        assert_eq!(client.generate(&result).await.unwrap(), "From the relay.");
        if let Some(tx) = shutdown {
            let _ = tx.send(());
        }
    }
}
