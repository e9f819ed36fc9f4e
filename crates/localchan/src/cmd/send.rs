use std::time::{Duration, Instant};

use localchan_client::{connect_with_config, Client, ClientConfig, JsonCodec};
use localchan_frame::FrameConfig;
use localchan_transport::RetryPolicy;
use serde_json::Value;
use tracing::debug;

use crate::cmd::endpoint::channel_name;
use crate::cmd::SendArgs;
use crate::exit::{client_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_response, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let name = channel_name(&args.name, args.qualifier.as_deref())?;
    let request: Value = serde_json::from_str(&args.json)
        .map_err(|err| CliError::new(USAGE, format!("--json is not valid JSON: {err}")))?;
    let config = client_config(&args)?;

    let started = Instant::now();
    let mut client: Client<Value, Value> = connect_with_config(&name, JsonCodec, &config, None)
        .map_err(|err| client_error("connect failed", err))?;
    debug!(name = %name, elapsed_ms = started.elapsed().as_millis() as u64, "connected");

    let response = client
        .send(&request)
        .map_err(|err| client_error("request failed", err))?;
    client.close();

    if let Some(endpoint) = client.endpoint() {
        print_response(endpoint, &response, started.elapsed(), format);
    }
    Ok(SUCCESS)
}

fn client_config(args: &SendArgs) -> CliResult<ClientConfig> {
    let mut retry = RetryPolicy::new(parse_duration(&args.retry_interval)?);
    if let Some(max_attempts) = args.max_attempts {
        if max_attempts == 0 {
            return Err(CliError::new(USAGE, "--max-attempts must be at least 1"));
        }
        retry = retry.with_max_attempts(max_attempts);
    }

    let mut frame = FrameConfig::default();
    if let Some(timeout) = &args.timeout {
        let timeout = parse_duration(timeout)?;
        retry = retry.with_deadline(timeout);
        frame.read_timeout = Some(timeout);
        frame.write_timeout = Some(timeout);
    }

    Ok(ClientConfig::default().with_retry(retry).with_frame(frame))
}

fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
