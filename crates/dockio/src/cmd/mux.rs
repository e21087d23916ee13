use std::io::Read;

use dockio_frame::{FrameWriter, StreamType};

use crate::cmd::{MuxArgs, MuxStream};
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};

pub fn run(args: MuxArgs) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let stream = match args.stream {
        MuxStream::Stdout => StreamType::Stdout,
        MuxStream::Stderr => StreamType::Stderr,
    };

    let mut writer = FrameWriter::new(std::io::stdout().lock());
    writer
        .send(stream, &payload)
        .map_err(|err| frame_error("failed writing frame", err))?;
    Ok(SUCCESS)
}

fn resolve_payload(args: &MuxArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(path) = &args.file {
        return std::fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    let mut payload = Vec::new();
    std::io::stdin()
        .read_to_end(&mut payload)
        .map_err(|err| io_error("failed reading stdin", err))?;
    Ok(payload)
}
