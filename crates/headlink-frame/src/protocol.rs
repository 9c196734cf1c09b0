//! Protocol identifiers and packet sizes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Header: command id (1) + message kind (1).
pub const HEADER_SIZE: usize = 2;

/// Trailing CRC-8 checksum.
pub const CHECKSUM_SIZE: usize = 1;

/// Smallest packet on the wire (Stop/SelfTest request).
pub const MIN_PACKET_SIZE: usize = HEADER_SIZE + CHECKSUM_SIZE;

/// Largest packet on the wire (StabilizationTarget request).
pub const MAX_PACKET_SIZE: usize = 16;

/// Command carried by a packet.
///
/// Relative and geo-stabilized angular velocity share [`CommandId::AngularVelocity`];
/// the head picks the frame from its stabilization state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum CommandId {
    /// Deploy/stop: halt every motion of the head.
    Stop = 0,
    /// Built-in self test.
    SelfTest = 1,
    StatusRefreshRatePt = 2,
    StatusRefreshRateImu = 3,
    AnglesRelative = 4,
    AnglesGeo = 5,
    AngularVelocity = 6,
    EnableStabilization = 7,
    StabilizationTarget = 8,
}

impl CommandId {
    /// Every command, in wire order.
    pub const ALL: [CommandId; 9] = [
        CommandId::Stop,
        CommandId::SelfTest,
        CommandId::StatusRefreshRatePt,
        CommandId::StatusRefreshRateImu,
        CommandId::AnglesRelative,
        CommandId::AnglesGeo,
        CommandId::AngularVelocity,
        CommandId::EnableStabilization,
        CommandId::StabilizationTarget,
    ];

    /// Map a wire byte to a command, `None` if unknown.
    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(usize::from(value)).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Human-readable name used in logs and CLI output.
    pub fn name(self) -> &'static str {
        match self {
            CommandId::Stop => "stop",
            CommandId::SelfTest => "self-test",
            CommandId::StatusRefreshRatePt => "status-rate-pt",
            CommandId::StatusRefreshRateImu => "status-rate-imu",
            CommandId::AnglesRelative => "angles-relative",
            CommandId::AnglesGeo => "angles-geo",
            CommandId::AngularVelocity => "angular-velocity",
            CommandId::EnableStabilization => "enable-stabilization",
            CommandId::StabilizationTarget => "stabilization-target",
        }
    }
}

impl TryFrom<u8> for CommandId {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(FrameError::UnknownCommand(value))
    }
}

impl fmt::Display for CommandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Whether a packet carries a command or the outcome of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MessageKind {
    Request = 0,
    Response = 1,
}

impl MessageKind {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(MessageKind::Request),
            1 => Some(MessageKind::Response),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for MessageKind {
    type Error = FrameError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or(FrameError::UnknownMessageKind(value))
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Request => f.write_str("request"),
            MessageKind::Response => f.write_str("response"),
        }
    }
}

/// Outcome of a command as reported by the head.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Ok,
    Failed,
    Unsupported,
    /// No matching response arrived in time. Synthesized locally.
    Timeout,
}

impl Status {
    /// Map a wire byte to a status. `Timeout` has no wire value.
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Status::Ok),
            1 => Some(Status::Failed),
            2 => Some(Status::Unsupported),
            _ => None,
        }
    }

    /// Wire byte for this status, `None` for `Timeout`.
    pub fn to_wire(self) -> Option<u8> {
        match self {
            Status::Ok => Some(0),
            Status::Failed => Some(1),
            Status::Unsupported => Some(2),
            Status::Timeout => None,
        }
    }

    pub fn is_ok(self) -> bool {
        self == Status::Ok
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Ok => f.write_str("ok"),
            Status::Failed => f.write_str("failed"),
            Status::Unsupported => f.write_str("unsupported"),
            Status::Timeout => f.write_str("timeout"),
        }
    }
}

/// Refresh rate of a periodic status stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Rate {
    #[default]
    Disabled = 0,
    Hz10 = 1,
    Hz20 = 2,
    Hz50 = 3,
}

impl Rate {
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            0 => Some(Rate::Disabled),
            1 => Some(Rate::Hz10),
            2 => Some(Rate::Hz20),
            3 => Some(Rate::Hz50),
            _ => None,
        }
    }

    pub fn to_wire(self) -> u8 {
        self as u8
    }

    /// Map a frequency in Hz to a rate; `0` disables the stream.
    pub fn from_hz(hz: u32) -> Option<Self> {
        match hz {
            0 => Some(Rate::Disabled),
            10 => Some(Rate::Hz10),
            20 => Some(Rate::Hz20),
            50 => Some(Rate::Hz50),
            _ => None,
        }
    }

    pub fn hz(self) -> u32 {
        match self {
            Rate::Disabled => 0,
            Rate::Hz10 => 10,
            Rate::Hz20 => 20,
            Rate::Hz50 => 50,
        }
    }
}

/// Size of header plus payload for a packet kind, excluding the checksum.
pub fn packet_size(command_id: CommandId, kind: MessageKind) -> usize {
    if kind == MessageKind::Response {
        return HEADER_SIZE + 1;
    }

    match command_id {
        CommandId::Stop | CommandId::SelfTest => HEADER_SIZE,
        CommandId::StatusRefreshRatePt | CommandId::StatusRefreshRateImu => HEADER_SIZE + 1,
        CommandId::AnglesRelative | CommandId::AnglesGeo => HEADER_SIZE + 3 * 2,
        CommandId::AngularVelocity => HEADER_SIZE + 3 * 2,
        CommandId::EnableStabilization => HEADER_SIZE + 3,
        CommandId::StabilizationTarget => HEADER_SIZE + 2 * (1 + 4) + (1 + 2),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_ids_roundtrip_through_their_byte() {
        for id in CommandId::ALL {
            assert_eq!(CommandId::try_from(id.as_u8()).unwrap(), id);
        }
        assert!(matches!(
            CommandId::try_from(9),
            Err(FrameError::UnknownCommand(9))
        ));
        assert!(CommandId::from_u8(0xF0).is_none());
    }

    #[test]
    fn message_kind_rejects_unknown_values() {
        assert_eq!(MessageKind::from_u8(0), Some(MessageKind::Request));
        assert_eq!(MessageKind::from_u8(1), Some(MessageKind::Response));
        assert!(matches!(
            MessageKind::try_from(2),
            Err(FrameError::UnknownMessageKind(2))
        ));
    }

    #[test]
    fn timeout_has_no_wire_value() {
        assert_eq!(Status::Timeout.to_wire(), None);
        for status in [Status::Ok, Status::Failed, Status::Unsupported] {
            let wire = status.to_wire().unwrap();
            assert_eq!(Status::from_wire(wire), Some(status));
        }
        assert_eq!(Status::from_wire(3), None);
    }

    #[test]
    fn rates_map_to_frequencies() {
        assert_eq!(Rate::from_hz(20), Some(Rate::Hz20));
        assert_eq!(Rate::from_hz(0), Some(Rate::Disabled));
        assert_eq!(Rate::from_hz(25), None);
        assert_eq!(Rate::Hz50.hz(), 50);
        assert_eq!(Rate::from_wire(4), None);
    }

    #[test]
    fn packet_sizes_match_wire_layouts() {
        let req = MessageKind::Request;
        assert_eq!(packet_size(CommandId::Stop, req), 2);
        assert_eq!(packet_size(CommandId::SelfTest, req), 2);
        assert_eq!(packet_size(CommandId::StatusRefreshRatePt, req), 3);
        assert_eq!(packet_size(CommandId::AnglesGeo, req), 8);
        assert_eq!(packet_size(CommandId::AngularVelocity, req), 8);
        assert_eq!(packet_size(CommandId::EnableStabilization, req), 5);
        assert_eq!(packet_size(CommandId::StabilizationTarget, req), 15);
        for id in CommandId::ALL {
            assert_eq!(packet_size(id, MessageKind::Response), 3);
        }
    }

    #[test]
    fn max_and_min_packet_sizes_bound_every_layout() {
        for id in CommandId::ALL {
            for kind in [MessageKind::Request, MessageKind::Response] {
                let total = packet_size(id, kind) + CHECKSUM_SIZE;
                assert!(total >= MIN_PACKET_SIZE);
                assert!(total <= MAX_PACKET_SIZE);
            }
        }
        assert_eq!(
            packet_size(CommandId::StabilizationTarget, MessageKind::Request) + CHECKSUM_SIZE,
            MAX_PACKET_SIZE
        );
    }
}
