use std::time::{Duration, Instant};

use headlink_peer::{connect_with_config, LinkConfig};

use crate::cmd::SendArgs;
use crate::exit::{peer_error, status_code, CliError, CliResult, USAGE};
use crate::output::{print_send_result, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let config = link_config(timeout);
    let request = args.request.to_request();

    let mut client = connect_with_config(args.addr.as_str(), &config)
        .map_err(|err| peer_error("connect failed", err))?;

    let started = Instant::now();
    let status = client
        .request(&request)
        .map_err(|err| peer_error("request failed", err))?;
    tracing::debug!(command = %request.command_id(), %status, "request complete");

    print_send_result(
        &args.addr,
        request.command_id(),
        status,
        started.elapsed(),
        format,
    );
    Ok(status_code(status))
}

fn link_config(timeout: Duration) -> LinkConfig {
    LinkConfig::default()
        .with_read_timeout(Some(timeout))
        .with_response_timeout(timeout)
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
