use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("xrpc {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: xrpc");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("XRPC_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "protocol: magic={:#010x} header={}B",
        xrpc_frame::MAGIC_NUM,
        xrpc_frame::HEADER_SIZE
    );
    println!(
        "default timeouts: connect={}ms read={}ms write={}ms",
        xrpc_client::DEFAULT_CONNECT_TIMEOUT.as_millis(),
        xrpc_client::DEFAULT_READ_TIMEOUT.as_millis(),
        xrpc_client::DEFAULT_WRITE_TIMEOUT.as_millis()
    );

    Ok(SUCCESS)
}
