use localchan_transport::{ChannelName, Endpoint};

use crate::cmd::EndpointArgs;
use crate::exit::{transport_error, CliResult, SUCCESS};
use crate::output::{print_endpoint, OutputFormat};

pub fn run(args: EndpointArgs, format: OutputFormat) -> CliResult<i32> {
    let name = channel_name(&args.name, args.qualifier.as_deref())?;
    let endpoint =
        Endpoint::resolve(&name).map_err(|err| transport_error("cannot resolve endpoint", err))?;
    print_endpoint(name.as_str(), &endpoint, format);
    Ok(SUCCESS)
}

/// Validate a name from the command line and apply an optional qualifier.
pub fn channel_name(name: &str, qualifier: Option<&str>) -> CliResult<ChannelName> {
    let base = ChannelName::new(name).map_err(|err| transport_error("invalid name", err))?;
    match qualifier {
        Some(qualifier) => base
            .qualified(qualifier)
            .map_err(|err| transport_error("invalid qualifier", err)),
        None => Ok(base),
    }
}
