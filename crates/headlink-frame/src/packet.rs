//! Typed packets and their byte layouts.
//!
//! Layouts are written field by field with `BufMut` and read back through
//! named offsets; no struct is ever overlaid on wire bytes.
//!
//! ```text
//! ┌────────┬────────┬──────────────────────────────┬──────────┐
//! │ id (1) │ kind(1)│ payload (fixed per id/kind)  │ CRC-8 (1)│
//! └────────┴────────┴──────────────────────────────┴──────────┘
//! ```
//!
//! 3-axis payloads are always ordered yaw, pitch, roll on the wire.

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::codec::{
    compute_checksum, decode_altitude, decode_angle, decode_angular_velocity, decode_latlon,
    encode_altitude, encode_angle, encode_angular_velocity, encode_latlon,
};
use crate::error::{FrameError, Result};
use crate::protocol::{
    packet_size, CommandId, MessageKind, Rate, Status, CHECKSUM_SIZE, HEADER_SIZE, MAX_PACKET_SIZE,
};

const OFF_COMMAND: usize = 0;
const OFF_KIND: usize = 1;

// StatusRefreshRate
const OFF_RATE: usize = 2;

// Angles: u16 per axis
const OFF_ANGLE_YAW: usize = 2;
const OFF_ANGLE_PITCH: usize = 4;
const OFF_ANGLE_ROLL: usize = 6;

// AngularVelocity: sign byte then magnitude byte per axis
const OFF_VELOCITY_YAW: usize = 2;
const OFF_VELOCITY_PITCH: usize = 4;
const OFF_VELOCITY_ROLL: usize = 6;

// EnableStabilization: one flag byte per axis
const OFF_STABILIZE_YAW: usize = 2;
const OFF_STABILIZE_PITCH: usize = 3;
const OFF_STABILIZE_ROLL: usize = 4;

// StabilizationTarget
const OFF_LATITUDE_SIGN: usize = 2;
const OFF_LATITUDE: usize = 3;
const OFF_LONGITUDE_SIGN: usize = 7;
const OFF_LONGITUDE: usize = 8;
const OFF_ALTITUDE_SIGN: usize = 12;
const OFF_ALTITUDE: usize = 13;

// Response
const OFF_STATUS: usize = 2;

/// Roll/pitch/yaw triple: a pose in radians or a rate in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rpy {
    pub roll: f64,
    pub pitch: f64,
    pub yaw: f64,
}

impl Rpy {
    pub fn new(roll: f64, pitch: f64, yaw: f64) -> Self {
        Self { roll, pitch, yaw }
    }

    /// True if every axis is within `tolerance` of `other`.
    pub fn approx_eq(&self, other: &Rpy, tolerance: f64) -> bool {
        (self.roll - other.roll).abs() <= tolerance
            && (self.pitch - other.pitch).abs() <= tolerance
            && (self.yaw - other.yaw).abs() <= tolerance
    }
}

/// Geographic point the head keeps pointed at in stabilized mode.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTarget {
    /// Degrees, positive north.
    pub latitude: f64,
    /// Degrees, positive east.
    pub longitude: f64,
    /// Meters.
    pub altitude: f64,
}

impl GeoTarget {
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
        }
    }
}

/// Per-axis stabilization flags carried by `EnableStabilization`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StabilizationAxes {
    pub yaw: bool,
    pub pitch: bool,
    pub roll: bool,
}

impl StabilizationAxes {
    pub fn all(enabled: bool) -> Self {
        Self {
            yaw: enabled,
            pitch: enabled,
            roll: enabled,
        }
    }

    /// True if stabilization is requested on at least one axis.
    pub fn any(&self) -> bool {
        self.yaw || self.pitch || self.roll
    }
}

/// A command sent from the controller to the head.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Request {
    Stop,
    SelfTest,
    StatusRefreshRatePt(Rate),
    StatusRefreshRateImu(Rate),
    /// Pose relative to the vehicle body, radians.
    AnglesRelative(Rpy),
    /// Pose relative to the geo frame, radians.
    AnglesGeo(Rpy),
    /// Rates in rad/s; the head decides the frame from its stabilization state.
    AngularVelocity(Rpy),
    EnableStabilization(StabilizationAxes),
    StabilizationTarget(GeoTarget),
}

impl Request {
    pub fn command_id(&self) -> CommandId {
        match self {
            Request::Stop => CommandId::Stop,
            Request::SelfTest => CommandId::SelfTest,
            Request::StatusRefreshRatePt(_) => CommandId::StatusRefreshRatePt,
            Request::StatusRefreshRateImu(_) => CommandId::StatusRefreshRateImu,
            Request::AnglesRelative(_) => CommandId::AnglesRelative,
            Request::AnglesGeo(_) => CommandId::AnglesGeo,
            Request::AngularVelocity(_) => CommandId::AngularVelocity,
            Request::EnableStabilization(_) => CommandId::EnableStabilization,
            Request::StabilizationTarget(_) => CommandId::StabilizationTarget,
        }
    }

    /// Encode into a complete packet, checksum included.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(MAX_PACKET_SIZE);
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the complete packet to `dst`.
    ///
    /// On error (a value outside its encodable domain) `dst` is left as it was.
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        let start = dst.len();
        if let Err(err) = self.put_packet(dst) {
            dst.truncate(start);
            return Err(err);
        }
        let checksum = compute_checksum(&dst[start..]);
        dst.put_u8(checksum);
        Ok(())
    }

    fn put_packet(&self, dst: &mut BytesMut) -> Result<()> {
        let command_id = self.command_id();
        dst.reserve(packet_size(command_id, MessageKind::Request) + CHECKSUM_SIZE);
        dst.put_u8(command_id.as_u8());
        dst.put_u8(MessageKind::Request.as_u8());

        match self {
            Request::Stop | Request::SelfTest => {}
            Request::StatusRefreshRatePt(rate) | Request::StatusRefreshRateImu(rate) => {
                dst.put_u8(rate.to_wire());
            }
            Request::AnglesRelative(angles) | Request::AnglesGeo(angles) => {
                dst.put_u16(encode_angle(angles.yaw)?);
                dst.put_u16(encode_angle(angles.pitch)?);
                dst.put_u16(encode_angle(angles.roll)?);
            }
            Request::AngularVelocity(rates) => {
                dst.put_slice(&encode_angular_velocity(rates.yaw)?);
                dst.put_slice(&encode_angular_velocity(rates.pitch)?);
                dst.put_slice(&encode_angular_velocity(rates.roll)?);
            }
            Request::EnableStabilization(axes) => {
                dst.put_u8(u8::from(axes.yaw));
                dst.put_u8(u8::from(axes.pitch));
                dst.put_u8(u8::from(axes.roll));
            }
            Request::StabilizationTarget(target) => {
                let (latitude_sign, latitude) = encode_latlon(target.latitude)?;
                let (longitude_sign, longitude) = encode_latlon(target.longitude)?;
                let (altitude_sign, altitude) = encode_altitude(target.altitude)?;
                dst.put_u8(latitude_sign);
                dst.put_u32(latitude);
                dst.put_u8(longitude_sign);
                dst.put_u32(longitude);
                dst.put_u8(altitude_sign);
                dst.put_u16(altitude);
            }
        }
        Ok(())
    }

    /// Decode one complete, checksummed request packet.
    ///
    /// Fails with [`FrameError::UnexpectedKind`] on a response packet.
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let command_id = check_packet(packet, MessageKind::Request)?;

        let request = match command_id {
            CommandId::Stop => Request::Stop,
            CommandId::SelfTest => Request::SelfTest,
            CommandId::StatusRefreshRatePt => Request::StatusRefreshRatePt(read_rate(packet)?),
            CommandId::StatusRefreshRateImu => Request::StatusRefreshRateImu(read_rate(packet)?),
            CommandId::AnglesRelative => Request::AnglesRelative(read_angles(packet)),
            CommandId::AnglesGeo => Request::AnglesGeo(read_angles(packet)),
            CommandId::AngularVelocity => Request::AngularVelocity(Rpy {
                roll: read_angular_velocity(packet, OFF_VELOCITY_ROLL)?,
                pitch: read_angular_velocity(packet, OFF_VELOCITY_PITCH)?,
                yaw: read_angular_velocity(packet, OFF_VELOCITY_YAW)?,
            }),
            CommandId::EnableStabilization => Request::EnableStabilization(StabilizationAxes {
                yaw: packet[OFF_STABILIZE_YAW] != 0,
                pitch: packet[OFF_STABILIZE_PITCH] != 0,
                roll: packet[OFF_STABILIZE_ROLL] != 0,
            }),
            CommandId::StabilizationTarget => Request::StabilizationTarget(GeoTarget {
                latitude: decode_latlon(
                    packet[OFF_LATITUDE_SIGN],
                    read_u32(packet, OFF_LATITUDE),
                )?,
                longitude: decode_latlon(
                    packet[OFF_LONGITUDE_SIGN],
                    read_u32(packet, OFF_LONGITUDE),
                )?,
                altitude: decode_altitude(
                    packet[OFF_ALTITUDE_SIGN],
                    read_u16(packet, OFF_ALTITUDE),
                )?,
            }),
        };
        Ok(request)
    }
}

/// The head's answer to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub command_id: CommandId,
    pub status: Status,
}

impl Response {
    pub fn new(command_id: CommandId, status: Status) -> Self {
        Self { command_id, status }
    }

    /// Encode into a complete packet, checksum included.
    pub fn encode(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(MAX_PACKET_SIZE);
        self.encode_into(&mut buf)?;
        Ok(buf.freeze())
    }

    /// Append the complete packet to `dst`.
    ///
    /// Fails with [`FrameError::LocalStatus`] for [`Status::Timeout`].
    pub fn encode_into(&self, dst: &mut BytesMut) -> Result<()> {
        let status = self
            .status
            .to_wire()
            .ok_or(FrameError::LocalStatus(self.status))?;

        let start = dst.len();
        dst.reserve(packet_size(self.command_id, MessageKind::Response) + CHECKSUM_SIZE);
        dst.put_u8(self.command_id.as_u8());
        dst.put_u8(MessageKind::Response.as_u8());
        dst.put_u8(status);
        let checksum = compute_checksum(&dst[start..]);
        dst.put_u8(checksum);
        Ok(())
    }

    /// Decode one complete, checksummed response packet.
    ///
    /// Fails with [`FrameError::UnexpectedKind`] on a request packet.
    pub fn decode(packet: &[u8]) -> Result<Self> {
        let command_id = check_packet(packet, MessageKind::Response)?;
        let status = Status::from_wire(packet[OFF_STATUS]).ok_or(FrameError::InvalidField {
            field: "status",
            value: packet[OFF_STATUS],
        })?;
        Ok(Self { command_id, status })
    }
}

/// Either side of the exchange, keyed by the header's message kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Packet {
    Request(Request),
    Response(Response),
}

impl Packet {
    pub fn decode(packet: &[u8]) -> Result<Self> {
        match header(packet)?.1 {
            MessageKind::Request => Request::decode(packet).map(Packet::Request),
            MessageKind::Response => Response::decode(packet).map(Packet::Response),
        }
    }

    pub fn command_id(&self) -> CommandId {
        match self {
            Packet::Request(request) => request.command_id(),
            Packet::Response(response) => response.command_id,
        }
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Packet::Request(_) => MessageKind::Request,
            Packet::Response(_) => MessageKind::Response,
        }
    }

    pub fn encode(&self) -> Result<Bytes> {
        match self {
            Packet::Request(request) => request.encode(),
            Packet::Response(response) => response.encode(),
        }
    }
}

impl From<Request> for Packet {
    fn from(request: Request) -> Self {
        Packet::Request(request)
    }
}

impl From<Response> for Packet {
    fn from(response: Response) -> Self {
        Packet::Response(response)
    }
}

/// Read the command id and message kind of a packet without decoding it.
pub fn header(packet: &[u8]) -> Result<(CommandId, MessageKind)> {
    if packet.len() < HEADER_SIZE {
        return Err(FrameError::LengthMismatch {
            expected: HEADER_SIZE,
            actual: packet.len(),
        });
    }
    let command_id = CommandId::try_from(packet[OFF_COMMAND])?;
    let kind = MessageKind::try_from(packet[OFF_KIND])?;
    Ok((command_id, kind))
}

/// Decode a request packet; see [`Request::decode`].
pub fn decode_request(packet: &[u8]) -> Result<Request> {
    Request::decode(packet)
}

/// Decode a response packet into its command id and status.
pub fn decode_response(packet: &[u8]) -> Result<(CommandId, Status)> {
    Response::decode(packet).map(|response| (response.command_id, response.status))
}

fn check_packet(packet: &[u8], expected_kind: MessageKind) -> Result<CommandId> {
    let (command_id, kind) = header(packet)?;
    if kind != expected_kind {
        return Err(FrameError::UnexpectedKind {
            expected: expected_kind,
            actual: kind,
        });
    }

    let size = packet_size(command_id, kind);
    if packet.len() != size + CHECKSUM_SIZE {
        return Err(FrameError::LengthMismatch {
            expected: size + CHECKSUM_SIZE,
            actual: packet.len(),
        });
    }

    let carried = packet[size];
    let computed = compute_checksum(&packet[..size]);
    if carried != computed {
        return Err(FrameError::ChecksumMismatch {
            expected: carried,
            actual: computed,
        });
    }
    Ok(command_id)
}

fn read_rate(packet: &[u8]) -> Result<Rate> {
    Rate::from_wire(packet[OFF_RATE]).ok_or(FrameError::InvalidField {
        field: "rate",
        value: packet[OFF_RATE],
    })
}

fn read_angles(packet: &[u8]) -> Rpy {
    Rpy {
        roll: decode_angle(read_u16(packet, OFF_ANGLE_ROLL)),
        pitch: decode_angle(read_u16(packet, OFF_ANGLE_PITCH)),
        yaw: decode_angle(read_u16(packet, OFF_ANGLE_YAW)),
    }
}

fn read_angular_velocity(packet: &[u8], offset: usize) -> Result<f64> {
    decode_angular_velocity(packet[offset], packet[offset + 1])
}

fn read_u16(packet: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([packet[offset], packet[offset + 1]])
}

fn read_u32(packet: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        packet[offset],
        packet[offset + 1],
        packet[offset + 2],
        packet[offset + 3],
    ])
}
