use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("dockio {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: dockio");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target: {}", env!("DOCKIO_BUILD_TARGET"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "max_frame_payload: {}",
        dockio_frame::DEFAULT_MAX_PAYLOAD
    );
    println!(
        "max_json_value_size: {}",
        dockio_stream::DEFAULT_MAX_JSON_VALUE
    );

    Ok(SUCCESS)
}
