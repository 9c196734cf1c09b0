use clap::{Args, Subcommand, ValueEnum};
use headlink_frame::{GeoTarget, Rate, Request, Rpy, StabilizationAxes, Status};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod send;
pub mod serve;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Emulate a head: accept controllers and answer every request.
    Serve(ServeArgs),
    /// Send a single request to a head and print its status.
    Send(SendArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Serve(args) => serve::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Address to listen on (e.g. 127.0.0.1:7700).
    pub addr: String,
    /// Status to answer every request with.
    #[arg(long, value_enum, default_value = "ok")]
    pub status: StatusArg,
    /// Exit after answering N requests.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address of the head (e.g. 127.0.0.1:7700).
    pub addr: String,
    /// How long to wait for the response (e.g. 5s, 500ms).
    #[arg(long, default_value = "10s")]
    pub timeout: String,
    #[command(subcommand)]
    pub request: RequestCommand,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Status a served head answers with. Timeouts never go on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Ok,
    Failed,
    Unsupported,
}

impl From<StatusArg> for Status {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Ok => Status::Ok,
            StatusArg::Failed => Status::Failed,
            StatusArg::Unsupported => Status::Unsupported,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RateArg {
    #[value(name = "disable")]
    Disable,
    #[value(name = "10")]
    Hz10,
    #[value(name = "20")]
    Hz20,
    #[value(name = "50")]
    Hz50,
}

impl From<RateArg> for Rate {
    fn from(value: RateArg) -> Self {
        match value {
            RateArg::Disable => Rate::Disabled,
            RateArg::Hz10 => Rate::Hz10,
            RateArg::Hz20 => Rate::Hz20,
            RateArg::Hz50 => Rate::Hz50,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Three axes in degrees (or degrees per second for velocities).
#[derive(Args, Debug, Clone, Copy)]
pub struct AxesArgs {
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub roll: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub pitch: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    pub yaw: f64,
}

impl AxesArgs {
    fn to_radians(self) -> Rpy {
        Rpy::new(
            self.roll.to_radians(),
            self.pitch.to_radians(),
            self.yaw.to_radians(),
        )
    }
}

#[derive(Subcommand, Debug)]
pub enum RequestCommand {
    /// Stop all motion.
    Stop,
    /// Run the head's self test.
    SelfTest,
    /// Set the pan/tilt status refresh rate (Hz).
    RatePt {
        #[arg(value_enum)]
        rate: RateArg,
    },
    /// Set the IMU status refresh rate (Hz).
    RateImu {
        #[arg(value_enum)]
        rate: RateArg,
    },
    /// Point to angles relative to the platform (degrees).
    AnglesRel(AxesArgs),
    /// Point to angles in the geographic frame (degrees).
    AnglesGeo(AxesArgs),
    /// Rotate at angular velocities (degrees per second).
    Velocity(AxesArgs),
    /// Enable or disable stabilization on every axis.
    Stabilization {
        #[arg(value_enum)]
        state: Toggle,
    },
    /// Track a geographic point.
    Target {
        /// Latitude in degrees.
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in degrees.
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Altitude in meters.
        #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
        alt: f64,
    },
}

impl RequestCommand {
    pub fn to_request(&self) -> Request {
        match self {
            RequestCommand::Stop => Request::Stop,
            RequestCommand::SelfTest => Request::SelfTest,
            RequestCommand::RatePt { rate } => Request::StatusRefreshRatePt((*rate).into()),
            RequestCommand::RateImu { rate } => Request::StatusRefreshRateImu((*rate).into()),
            RequestCommand::AnglesRel(axes) => Request::AnglesRelative(axes.to_radians()),
            RequestCommand::AnglesGeo(axes) => Request::AnglesGeo(axes.to_radians()),
            RequestCommand::Velocity(axes) => Request::AngularVelocity(axes.to_radians()),
            RequestCommand::Stabilization { state } => {
                Request::EnableStabilization(StabilizationAxes::all(*state == Toggle::On))
            }
            RequestCommand::Target { lat, lon, alt } => {
                Request::StabilizationTarget(GeoTarget::new(*lat, *lon, *alt))
            }
        }
    }
}
