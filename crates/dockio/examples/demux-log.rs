//! Demultiplex example: split a logs body into stdout and stderr.
//!
//! The body is built in memory and delivered in awkward chunk sizes to show
//! that frames are reassembled regardless of transport chunking.
//!
//! Run with:
//!   cargo run --example demux-log

use bytes::{Bytes, BytesMut};
use dockio::frame::{encode_frame, StreamType};
use dockio::stream::{pipe_split, EventName, ResponseStart};
use dockio::{demultiplex, to_byte_stream, PendingResponse};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut wire = BytesMut::new();
    encode_frame(StreamType::Stdout, b"starting worker\n", &mut wire)?;
    encode_frame(StreamType::Stderr, b"warning: cache miss\n", &mut wire)?;
    encode_frame(StreamType::Stdout, b"ready\n", &mut wire)?;
    let wire = wire.freeze();

    let chunks: Vec<std::io::Result<Bytes>> = (0..wire.len())
        .step_by(5)
        .map(|start| Ok(wire.slice(start..(start + 5).min(wire.len()))))
        .collect();
    let pending = PendingResponse::ready(ResponseStart::new(
        200,
        futures_util::stream::iter(chunks),
    ));

    let stderr_event = EventName::from("stderr");
    let stream = demultiplex(to_byte_stream(pending), Some(stderr_event.clone()));

    let (out, err) = pipe_split(
        stream,
        &stderr_event,
        &mut tokio::io::stdout(),
        &mut tokio::io::stderr(),
    )
    .await?;
    eprintln!("[example] {out} bytes on stdout, {err} bytes on stderr");
    Ok(())
}
