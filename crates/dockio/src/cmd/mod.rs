use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Args, Subcommand, ValueEnum};
use dockio_stream::{ByteStream, PendingResponse, ResponseStart, StreamConfig};
use tokio::io::AsyncRead;
use tracing::debug;

use crate::exit::{io_error, CliError, CliResult, INTERNAL, TIMEOUT, USAGE};
use crate::output::OutputFormat;

pub mod demux;
pub mod frames;
pub mod json;
pub mod mux;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Demultiplex a captured attach/exec/logs body into stdout and stderr.
    Demux(DemuxArgs),
    /// Decode a captured JSON event stream (events, pull progress, stats).
    Json(JsonArgs),
    /// List the frames of a captured multiplexed body.
    Frames(FramesArgs),
    /// Encode a payload as one multiplexed frame.
    Mux(MuxArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Demux(args) => demux::run(args),
        Command::Json(args) => json::run(args, format),
        Command::Frames(args) => frames::run(args, format),
        Command::Mux(args) => mux::run(args),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DemuxArgs {
    /// Captured response body. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Write stderr frames to stderr instead of merging them into stdout.
    #[arg(long)]
    pub split: bool,
    /// Maximum payload of a single frame in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_frame_payload: Option<usize>,
    /// Give up after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct JsonArgs {
    /// Captured response body. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Print all values at once after the stream ends.
    #[arg(long)]
    pub collect: bool,
    /// Event name values are emitted on (e.g. progress).
    #[arg(long, default_value = "data")]
    pub event: String,
    /// Maximum size of a single JSON value in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_value_size: Option<usize>,
    /// Give up after this long (e.g. 5s, 500ms).
    #[arg(long)]
    pub timeout: Option<String>,
}

#[derive(Args, Debug)]
pub struct FramesArgs {
    /// Captured response body. Reads stdin when omitted or `-`.
    pub input: Option<PathBuf>,
    /// Maximum payload of a single frame in bytes.
    #[arg(long, value_name = "BYTES")]
    pub max_frame_payload: Option<usize>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum MuxStream {
    Stdout,
    Stderr,
}

#[derive(Args, Debug)]
pub struct MuxArgs {
    /// Output stream the payload is tagged with.
    #[arg(long, short = 's', value_enum, default_value = "stdout")]
    pub stream: MuxStream,
    /// Raw string payload.
    #[arg(long, conflicts_with = "file")]
    pub data: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with = "data")]
    pub file: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub(crate) fn stream_config(
    max_frame_payload: Option<usize>,
    max_json_value_size: Option<usize>,
) -> StreamConfig {
    let defaults = StreamConfig::default();
    StreamConfig {
        max_frame_payload: max_frame_payload.unwrap_or(defaults.max_frame_payload),
        max_json_value_size: max_json_value_size.unwrap_or(defaults.max_json_value_size),
        stderr_event: None,
    }
}

/// Run `task` to completion on a single-threaded runtime, bounded by `timeout`.
pub(crate) fn block_on<F, T>(timeout: Option<&str>, task: F) -> CliResult<T>
where
    F: Future<Output = CliResult<T>>,
{
    let timeout = timeout.map(parse_duration).transpose()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|err| CliError::new(INTERNAL, format!("failed to start runtime: {err}")))?;

    runtime.block_on(async move {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, task).await.map_err(|_| {
                CliError::new(TIMEOUT, format!("timed out after {}", humanize(limit)))
            })?,
            None => task.await,
        }
    })
}

/// The input as a byte stream, as if it were the body of a live response.
pub(crate) async fn open_body(input: Option<&Path>) -> CliResult<ByteStream> {
    let reader: Box<dyn AsyncRead + Send + Unpin> = match input {
        Some(path) if path != Path::new("-") => {
            debug!(path = %path.display(), "reading captured body");
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Box::new(file)
        }
        _ => {
            debug!("reading captured body from stdin");
            Box::new(tokio::io::stdin())
        }
    };
    Ok(ByteStream::new(PendingResponse::ready(
        ResponseStart::from_reader(200, reader),
    )))
}

pub(crate) fn open_blocking(input: Option<&Path>) -> CliResult<Box<dyn std::io::Read>> {
    match input {
        Some(path) if path != Path::new("-") => {
            let file = std::fs::File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?;
            Ok(Box::new(std::io::BufReader::new(file)))
        }
        _ => Ok(Box::new(std::io::stdin().lock())),
    }
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

fn humanize(duration: Duration) -> String {
    if duration.subsec_millis() == 0 {
        format!("{}s", duration.as_secs())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
