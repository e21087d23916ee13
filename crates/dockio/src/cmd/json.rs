use dockio_stream::{collect_all, EventName, JsonStream};
use futures_util::StreamExt;
use tracing::debug;

use crate::cmd::{block_on, open_body, stream_config, JsonArgs};
use crate::exit::{stream_error, CliResult, SUCCESS};
use crate::output::{print_value, print_values, OutputFormat};

pub fn run(args: JsonArgs, format: OutputFormat) -> CliResult<i32> {
    let config = stream_config(None, args.max_value_size);
    let event = EventName::from(args.event);
    let JsonArgs {
        input,
        collect,
        timeout,
        ..
    } = args;

    block_on(timeout.as_deref(), async move {
        let body = open_body(input.as_deref()).await?;
        let mut stream = JsonStream::with_config(body, &config).with_event(event.clone());

        if collect {
            let values = collect_all(stream, event.clone())
                .await
                .map_err(|err| stream_error("json stream failed", err))?;
            print_values(&event, &values, format);
            return Ok(SUCCESS);
        }

        let mut count = 0usize;
        while let Some(item) = stream.next().await {
            let item = item.map_err(|err| stream_error("json stream failed", err))?;
            print_value(&item.name, &item.item, format);
            count += 1;
        }
        debug!(values = count, "json stream ended");
        Ok(SUCCESS)
    })
}
