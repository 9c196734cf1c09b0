//! Head-side interpretation of requests into a requested configuration.
//!
//! The only state carried from one packet to the next is
//! [`StabilizationState`]: `AngularVelocity` is a geo-frame rate command while
//! stabilization is enabled and a body-frame one otherwise.

use std::fmt;
use std::time::SystemTime;

use headlink_frame::{CommandId, GeoTarget, Rate, Request, Rpy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Behavior the head was last asked to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlMode {
    #[default]
    Stop,
    SelfTest,
    AnglesRelative,
    AnglesGeo,
    AngularVelocityRelative,
    AngularVelocityGeo,
    /// Keep pointing at [`RequestedConfiguration::lat_lon_alt`].
    Stabilized,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ControlMode::Stop => "stop",
            ControlMode::SelfTest => "self-test",
            ControlMode::AnglesRelative => "angles-relative",
            ControlMode::AnglesGeo => "angles-geo",
            ControlMode::AngularVelocityRelative => "angular-velocity-relative",
            ControlMode::AngularVelocityGeo => "angular-velocity-geo",
            ControlMode::Stabilized => "stabilized",
        };
        f.write_str(name)
    }
}

/// Whether the head is in geo-stabilized mode. Enabled until told otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StabilizationState {
    enabled: bool,
}

impl StabilizationState {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl Default for StabilizationState {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Accumulated view of what the controller has asked the head to do.
///
/// Each request overwrites only the fields it carries.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RequestedConfiguration {
    /// Last interpreted command, `None` before the first request.
    pub command_id: Option<CommandId>,
    /// Time of the last update.
    pub time: Option<SystemTime>,
    pub control_mode: ControlMode,
    /// Refresh rate of the pan/tilt status stream.
    pub rate_status_pt: Rate,
    /// Refresh rate of the IMU status stream.
    pub rate_status_imu: Rate,
    /// Pose (rad) or rate (rad/s) target, depending on `control_mode`.
    pub rpy: Rpy,
    /// Geo target for stabilized mode, `None` until one is received.
    pub lat_lon_alt: Option<GeoTarget>,
}

/// Apply one request to the session state and configuration.
pub fn interpret(
    request: &Request,
    stabilization: &mut StabilizationState,
    configuration: &mut RequestedConfiguration,
    at: SystemTime,
) -> CommandId {
    let command_id = request.command_id();
    configuration.command_id = Some(command_id);
    configuration.time = Some(at);

    match *request {
        Request::Stop => configuration.control_mode = ControlMode::Stop,
        Request::SelfTest => configuration.control_mode = ControlMode::SelfTest,
        Request::StatusRefreshRatePt(rate) => configuration.rate_status_pt = rate,
        Request::StatusRefreshRateImu(rate) => configuration.rate_status_imu = rate,
        Request::AnglesRelative(rpy) => {
            configuration.control_mode = ControlMode::AnglesRelative;
            configuration.rpy = rpy;
        }
        Request::AnglesGeo(rpy) => {
            configuration.control_mode = ControlMode::AnglesGeo;
            configuration.rpy = rpy;
        }
        Request::AngularVelocity(rpy) => {
            configuration.control_mode = if stabilization.is_enabled() {
                ControlMode::AngularVelocityGeo
            } else {
                ControlMode::AngularVelocityRelative
            };
            configuration.rpy = rpy;
        }
        Request::EnableStabilization(axes) => stabilization.set_enabled(axes.any()),
        Request::StabilizationTarget(target) => {
            configuration.control_mode = ControlMode::Stabilized;
            configuration.lat_lon_alt = Some(target);
        }
    }

    debug!(
        command = %command_id,
        mode = %configuration.control_mode,
        stabilized = stabilization.is_enabled(),
        "interpreted request"
    );
    command_id
}

/// One link's interpreter session.
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    stabilization: StabilizationState,
    configuration: RequestedConfiguration,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret a request, stamping it with the current time.
    pub fn apply(&mut self, request: &Request) -> CommandId {
        self.apply_at(request, SystemTime::now())
    }

    pub fn apply_at(&mut self, request: &Request, at: SystemTime) -> CommandId {
        interpret(request, &mut self.stabilization, &mut self.configuration, at)
    }

    pub fn requested_configuration(&self) -> &RequestedConfiguration {
        &self.configuration
    }

    pub fn stabilization(&self) -> StabilizationState {
        self.stabilization
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use headlink_frame::{decode_request, StabilizationAxes};

    use super::*;

    fn at(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    #[test]
    fn starts_stopped_with_stabilization_enabled() {
        let interpreter = Interpreter::new();
        let config = interpreter.requested_configuration();
        assert_eq!(config.control_mode, ControlMode::Stop);
        assert_eq!(config.command_id, None);
        assert_eq!(config.rate_status_pt, Rate::Disabled);
        assert!(config.lat_lon_alt.is_none());
        assert!(interpreter.stabilization().is_enabled());
    }

    #[test]
    fn stop_packet_sets_stop_mode() {
        let mut interpreter = Interpreter::new();
        interpreter.apply(&Request::SelfTest);

        let request = decode_request(&[0x00, 0x00, 0x00]).unwrap();
        assert_eq!(interpreter.apply_at(&request, at(5)), CommandId::Stop);

        let config = interpreter.requested_configuration();
        assert_eq!(config.control_mode, ControlMode::Stop);
        assert_eq!(config.command_id, Some(CommandId::Stop));
        assert_eq!(config.time, Some(at(5)));
    }

    #[test]
    fn angular_velocity_is_geo_by_default() {
        let mut interpreter = Interpreter::new();
        interpreter.apply(&Request::AngularVelocity(Rpy::new(0.1, 0.0, 0.0)));
        assert_eq!(
            interpreter.requested_configuration().control_mode,
            ControlMode::AngularVelocityGeo
        );
    }

    #[test]
    fn angular_velocity_is_relative_once_stabilization_is_disabled() {
        let mut interpreter = Interpreter::new();
        let disable = decode_request(&[0x07, 0x00, 0x00, 0x00, 0x00, 0x29]).unwrap();
        assert_eq!(interpreter.apply(&disable), CommandId::EnableStabilization);
        assert!(!interpreter.stabilization().is_enabled());

        let rates = Rpy::new(0.3, -0.2, 0.1);
        interpreter.apply(&Request::AngularVelocity(rates));
        let config = interpreter.requested_configuration();
        assert_eq!(config.control_mode, ControlMode::AngularVelocityRelative);
        assert_eq!(config.rpy, rates);
    }

    #[test]
    fn enabling_any_axis_restores_geo_rates() {
        let mut interpreter = Interpreter::new();
        interpreter.apply(&Request::EnableStabilization(StabilizationAxes::all(false)));
        interpreter.apply(&Request::EnableStabilization(StabilizationAxes {
            pitch: true,
            ..StabilizationAxes::default()
        }));
        interpreter.apply(&Request::AngularVelocity(Rpy::default()));
        assert_eq!(
            interpreter.requested_configuration().control_mode,
            ControlMode::AngularVelocityGeo
        );
    }

    #[test]
    fn enable_stabilization_leaves_control_mode_alone() {
        let mut interpreter = Interpreter::new();
        interpreter.apply(&Request::AnglesGeo(Rpy::new(0.2, 0.3, 0.1)));
        interpreter.apply(&Request::EnableStabilization(StabilizationAxes::all(false)));

        let config = interpreter.requested_configuration();
        assert_eq!(config.control_mode, ControlMode::AnglesGeo);
        assert_eq!(config.command_id, Some(CommandId::EnableStabilization));
    }

    #[test]
    fn rates_update_independently() {
        let mut interpreter = Interpreter::new();
        interpreter.apply(&Request::AnglesRelative(Rpy::new(0.2, 0.3, 0.1)));
        interpreter.apply(&Request::StatusRefreshRatePt(Rate::Hz20));
        interpreter.apply(&Request::StatusRefreshRateImu(Rate::Hz50));

        let config = interpreter.requested_configuration();
        assert_eq!(config.rate_status_pt, Rate::Hz20);
        assert_eq!(config.rate_status_imu, Rate::Hz50);
        assert_eq!(config.control_mode, ControlMode::AnglesRelative);
        assert_eq!(config.rpy, Rpy::new(0.2, 0.3, 0.1));
    }

    #[test]
    fn stabilization_target_keeps_last_pose() {
        let mut interpreter = Interpreter::new();
        interpreter.apply(&Request::AnglesGeo(Rpy::new(0.2, 0.3, 0.1)));
        let target = GeoTarget::new(-0.1, 0.2, -0.3);
        interpreter.apply(&Request::StabilizationTarget(target));

        let config = interpreter.requested_configuration();
        assert_eq!(config.control_mode, ControlMode::Stabilized);
        assert_eq!(config.lat_lon_alt, Some(target));
        assert_eq!(config.rpy, Rpy::new(0.2, 0.3, 0.1));
    }

    #[test]
    fn free_function_uses_explicit_session_state() {
        let mut stabilization = StabilizationState::new(false);
        let mut config = RequestedConfiguration::default();
        interpret(
            &Request::AngularVelocity(Rpy::default()),
            &mut stabilization,
            &mut config,
            at(1),
        );
        assert_eq!(config.control_mode, ControlMode::AngularVelocityRelative);
        assert_eq!(config.time, Some(at(1)));
    }

    #[test]
    fn configuration_serializes_to_json() {
        let mut interpreter = Interpreter::new();
        interpreter.apply_at(&Request::StatusRefreshRateImu(Rate::Hz10), at(0));

        let value = serde_json::to_value(interpreter.requested_configuration()).unwrap();
        assert_eq!(value["command_id"], "status_refresh_rate_imu");
        assert_eq!(value["control_mode"], "stop");
        assert_eq!(value["rate_status_imu"], "hz10");
        assert!(value["lat_lon_alt"].is_null());
    }
}
