//! Copy stream output into async writers.

use futures_util::StreamExt;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

use crate::aggregate::Emitted;
use crate::error::{Result, StreamError};
use crate::event::EventName;
use crate::lifecycle::ReadableStream;

/// Write every `data` chunk of `stream` to `writer` until the stream ends.
///
/// Returns the number of bytes written. A write failure closes the stream;
/// a stream error is returned after flushing what was already written.
pub async fn pipe<S, E, W>(mut stream: S, writer: &mut W) -> Result<u64>
where
    S: ReadableStream<Item = Result<E>>,
    E: Emitted,
    E::Item: AsRef<[u8]>,
    W: AsyncWrite + Unpin,
{
    let mut written = 0u64;
    while let Some(emitted) = stream.next().await {
        let emitted = match emitted {
            Ok(emitted) => emitted,
            Err(err) => {
                // Keep what was delivered before the failure.
                let _ = writer.flush().await;
                return Err(err);
            }
        };
        if !emitted.event().is_data() {
            continue;
        }
        let chunk = emitted.into_item();
        if let Err(err) = writer.write_all(chunk.as_ref()).await {
            debug!(error = %err, "pipe destination failed");
            stream.close();
            return Err(StreamError::Transport(err));
        }
        written += chunk.as_ref().len() as u64;
    }
    writer.flush().await?;
    Ok(written)
}

/// Route `data` chunks to `stdout` and `stderr_event` chunks to `stderr`.
///
/// Returns the number of bytes written to each. Chunks on any other event
/// are dropped.
pub async fn pipe_split<S, E, O, W>(
    mut stream: S,
    stderr_event: &EventName,
    stdout: &mut O,
    stderr: &mut W,
) -> Result<(u64, u64)>
where
    S: ReadableStream<Item = Result<E>>,
    E: Emitted,
    E::Item: AsRef<[u8]>,
    O: AsyncWrite + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut counts = (0u64, 0u64);
    while let Some(emitted) = stream.next().await {
        let emitted = match emitted {
            Ok(emitted) => emitted,
            Err(err) => {
                let _ = stdout.flush().await;
                let _ = stderr.flush().await;
                return Err(err);
            }
        };
        let to_stderr = emitted.event() == stderr_event && !stderr_event.is_data();
        if !to_stderr && !emitted.event().is_data() {
            continue;
        }
        let chunk = emitted.into_item();
        let chunk = chunk.as_ref();
        let result = if to_stderr {
            counts.1 += chunk.len() as u64;
            stderr.write_all(chunk).await
        } else {
            counts.0 += chunk.len() as u64;
            stdout.write_all(chunk).await
        };
        if let Err(err) = result {
            debug!(error = %err, "pipe destination failed");
            stream.close();
            return Err(StreamError::Transport(err));
        }
    }
    stdout.flush().await?;
    stderr.flush().await?;
    Ok(counts)
}
