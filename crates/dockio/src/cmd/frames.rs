use dockio_frame::{FrameConfig, FrameReader};

use crate::cmd::{open_blocking, FramesArgs};
use crate::exit::{frame_error, CliResult, SUCCESS};
use crate::output::{print_frames, FrameRecord, OutputFormat};

pub fn run(args: FramesArgs, format: OutputFormat) -> CliResult<i32> {
    let mut config = FrameConfig::default();
    if let Some(max) = args.max_frame_payload {
        config.max_payload_size = max;
    }

    let mut reader = FrameReader::with_config(open_blocking(args.input.as_deref())?, config);
    let mut records = Vec::new();
    let mut offset = 0u64;
    while let Some(frame) = reader
        .read_frame()
        .map_err(|err| frame_error("failed reading frames", err))?
    {
        let size = frame.wire_size() as u64;
        records.push(FrameRecord { offset, frame });
        offset += size;
    }

    print_frames(&records, format);
    Ok(SUCCESS)
}
