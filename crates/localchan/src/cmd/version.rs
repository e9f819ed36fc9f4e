use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("localchan {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: localchan");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("LOCALCHAN_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("transport: {}", transport_kind());
    println!(
        "features: async={}, bincode={}, msgpack={}, cbor={}, cli=true",
        cfg!(feature = "async"),
        cfg!(feature = "bincode"),
        cfg!(feature = "msgpack"),
        cfg!(feature = "cbor")
    );

    Ok(SUCCESS)
}

fn transport_kind() -> &'static str {
    if cfg!(windows) {
        "named-pipe"
    } else {
        "unix-domain-socket"
    }
}
