use dockio_stream::{pipe, pipe_split, DemuxStream, EventName};
use tracing::debug;

use crate::cmd::{block_on, open_body, stream_config, DemuxArgs};
use crate::exit::{stream_error, CliResult, SUCCESS};

pub fn run(args: DemuxArgs) -> CliResult<i32> {
    let config = stream_config(args.max_frame_payload, None);
    let stderr_event = EventName::from("stderr");

    let DemuxArgs {
        input,
        split,
        timeout,
        ..
    } = args;

    block_on(timeout.as_deref(), async move {
        let body = open_body(input.as_deref()).await?;
        let mut stdout = tokio::io::stdout();

        if split {
            let config = config.with_stderr_event(stderr_event.clone());
            let stream = DemuxStream::with_config(body, &config);
            let mut stderr = tokio::io::stderr();
            let (out, err) = pipe_split(stream, &stderr_event, &mut stdout, &mut stderr)
                .await
                .map_err(|err| stream_error("demux failed", err))?;
            debug!(stdout = out, stderr = err, "demultiplexed body");
        } else {
            let stream = DemuxStream::with_config(body, &config);
            let written = pipe(stream, &mut stdout)
                .await
                .map_err(|err| stream_error("demux failed", err))?;
            debug!(bytes = written, "demultiplexed body");
        }
        Ok(SUCCESS)
    })
}
