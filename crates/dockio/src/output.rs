use std::io::{IsTerminal, Write};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dockio_frame::Frame;
use dockio_stream::EventName;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

/// A frame together with its byte offset in the captured body.
pub struct FrameRecord {
    pub offset: u64,
    pub frame: Frame,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    offset: u64,
    stream: &'a str,
    stream_type: u8,
    payload_size: usize,
    payload: String,
}

impl<'a> From<&'a FrameRecord> for FrameOutput<'a> {
    fn from(record: &'a FrameRecord) -> Self {
        Self {
            offset: record.offset,
            stream: record.frame.stream.name(),
            stream_type: record.frame.stream.as_byte(),
            payload_size: record.frame.payload.len(),
            payload: payload_preview(record.frame.payload.as_ref()),
        }
    }
}

pub fn print_frames(records: &[FrameRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            for record in records {
                print_json_line(&FrameOutput::from(record));
            }
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["OFFSET", "STREAM", "SIZE", "PAYLOAD"]);
            for record in records {
                table.add_row(vec![
                    record.offset.to_string(),
                    record.frame.stream.to_string(),
                    record.frame.payload.len().to_string(),
                    payload_preview(record.frame.payload.as_ref()),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for record in records {
                println!(
                    "offset={} stream={} size={} payload={}",
                    record.offset,
                    record.frame.stream,
                    record.frame.payload.len(),
                    payload_preview(record.frame.payload.as_ref())
                );
            }
        }
        OutputFormat::Raw => {
            for record in records {
                print_raw(record.frame.payload.as_ref());
            }
        }
    }
}

pub fn print_value(event: &EventName, value: &Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json_line(value),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["EVENT", "VALUE"])
                .add_row(vec![event.to_string(), value.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "{}",
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            );
        }
        OutputFormat::Raw => match value {
            Value::String(text) => print_raw(text.as_bytes()),
            other => println!("{other}"),
        },
    }
}

pub fn print_values(event: &EventName, values: &[Value], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json_line(&values),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "EVENT", "VALUE"]);
            for (index, value) in values.iter().enumerate() {
                table.add_row(vec![index.to_string(), event.to_string(), value.to_string()]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty | OutputFormat::Raw => {
            for value in values {
                print_value(event, value, format);
            }
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json_line<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}
