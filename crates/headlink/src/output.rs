use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use headlink_frame::{CommandId, Rpy, Status};
use headlink_peer::RequestedConfiguration;
use serde::Serialize;

#[derive(Clone, Debug, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct SendOutput<'a> {
    address: &'a str,
    command: &'a str,
    status: Status,
    elapsed_ms: u64,
}

pub fn print_send_result(
    address: &str,
    command: CommandId,
    status: Status,
    elapsed: Duration,
    format: OutputFormat,
) {
    let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
    match format {
        OutputFormat::Json => {
            let out = SendOutput {
                address,
                command: command.name(),
                status,
                elapsed_ms,
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["HEAD", "COMMAND", "STATUS", "ELAPSED"])
                .add_row(vec![
                    address.to_string(),
                    command.to_string(),
                    status.to_string(),
                    format!("{elapsed_ms} ms"),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!("head={address} command={command} status={status} elapsed={elapsed_ms}ms");
        }
    }
}

#[derive(Serialize)]
struct ServedOutput<'a> {
    peer: Option<SocketAddr>,
    command: &'a str,
    status: Status,
    stabilized: bool,
    configuration: &'a RequestedConfiguration,
    timestamp: String,
}

/// One interpreted request, as seen by the emulated head.
pub struct Served<'a> {
    pub peer: Option<SocketAddr>,
    pub command: CommandId,
    pub status: Status,
    pub stabilized: bool,
    pub configuration: &'a RequestedConfiguration,
}

pub fn print_served(served: &Served<'_>, format: OutputFormat) {
    let config = served.configuration;
    match format {
        OutputFormat::Json => {
            let out = ServedOutput {
                peer: served.peer,
                command: served.command.name(),
                status: served.status,
                stabilized: served.stabilized,
                configuration: config,
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["COMMAND", "STATUS", "MODE", "RATES", "RPY (deg)", "TARGET"])
                .add_row(vec![
                    served.command.to_string(),
                    served.status.to_string(),
                    config.control_mode.to_string(),
                    format!(
                        "pt={}Hz imu={}Hz",
                        config.rate_status_pt.hz(),
                        config.rate_status_imu.hz()
                    ),
                    rpy_degrees(&config.rpy),
                    target_summary(config),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "command={} status={} mode={} stabilized={} rpy_deg=[{}] target={}",
                served.command,
                served.status,
                config.control_mode,
                served.stabilized,
                rpy_degrees(&config.rpy),
                target_summary(config)
            );
        }
    }
}

fn rpy_degrees(rpy: &Rpy) -> String {
    format!(
        "{:.2}, {:.2}, {:.2}",
        rpy.roll.to_degrees(),
        rpy.pitch.to_degrees(),
        rpy.yaw.to_degrees()
    )
}

fn target_summary(config: &RequestedConfiguration) -> String {
    match config.lat_lon_alt {
        Some(target) => format!(
            "{:.6}, {:.6}, {:.1} m",
            target.latitude, target.longitude, target.altitude
        ),
        None => "-".to_string(),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
