use std::time::Duration;

use crate::codec::compute_checksum;
use crate::protocol::{
    packet_size, CommandId, MessageKind, CHECKSUM_SIZE, HEADER_SIZE, MAX_PACKET_SIZE,
    MIN_PACKET_SIZE,
};

/// Stream timeouts applied by [`crate::PacketReader`] and [`crate::PacketWriter`].
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Optional read timeout for blocking stream reads.
    pub read_timeout: Option<Duration>,
    /// Optional write timeout for blocking stream writes.
    pub write_timeout: Option<Duration>,
}

/// Outcome of one framing attempt on the head of a receive buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameResult {
    /// The buffer is a valid prefix; at least this many more bytes are needed.
    NeedMoreBytes(usize),
    /// The first byte cannot start a packet. Drop exactly one byte.
    Invalid(InvalidReason),
    /// The buffer starts with a complete, checksum-valid packet of this length.
    Complete(usize),
}

/// Why the first byte of a buffer was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InvalidReason {
    #[error("unknown command id 0x{0:02X}")]
    UnknownCommand(u8),
    #[error("unknown message kind 0x{0:02X}")]
    UnknownMessageKind(u8),
    #[error("checksum mismatch (packet carries 0x{expected:02X}, computed 0x{actual:02X})")]
    ChecksumMismatch { expected: u8, actual: u8 },
}

/// Finds packet boundaries in a receive buffer.
///
/// Implementations must be pure: the result depends only on the bytes
/// passed in, so a caller may retry with a longer buffer at any time.
pub trait Framer {
    fn try_extract(&self, buf: &[u8]) -> FrameResult;

    /// Upper bound on the length of a `Complete` packet.
    fn max_packet_size(&self) -> usize;
}

/// Framer for headlink packets: header lookup, fixed size, CRC check.
#[derive(Debug, Clone, Copy, Default)]
pub struct PacketFramer;

impl Framer for PacketFramer {
    fn try_extract(&self, buf: &[u8]) -> FrameResult {
        extract_packet(buf)
    }

    fn max_packet_size(&self) -> usize {
        MAX_PACKET_SIZE
    }
}

/// Decide what the head of `buf` holds.
///
/// Never asks to drop more than one byte, so a packet start hidden behind
/// garbage is found on a later call.
pub fn extract_packet(buf: &[u8]) -> FrameResult {
    let Some(&command_byte) = buf.first() else {
        return FrameResult::NeedMoreBytes(MIN_PACKET_SIZE);
    };
    let Some(command_id) = CommandId::from_u8(command_byte) else {
        return FrameResult::Invalid(InvalidReason::UnknownCommand(command_byte));
    };

    let Some(&kind_byte) = buf.get(1) else {
        return FrameResult::NeedMoreBytes(MIN_PACKET_SIZE - buf.len());
    };
    let Some(kind) = MessageKind::from_u8(kind_byte) else {
        return FrameResult::Invalid(InvalidReason::UnknownMessageKind(kind_byte));
    };

    let size = packet_size(command_id, kind);
    let total = size + CHECKSUM_SIZE;
    debug_assert!(size >= HEADER_SIZE);
    if buf.len() < total {
        return FrameResult::NeedMoreBytes(total - buf.len());
    }

    let carried = buf[size];
    let computed = compute_checksum(&buf[..size]);
    if carried != computed {
        return FrameResult::Invalid(InvalidReason::ChecksumMismatch {
            expected: carried,
            actual: computed,
        });
    }

    FrameResult::Complete(total)
}

#[cfg(test)]
mod tests {
    use super::*;

    const STOP: [u8; 3] = [0x00, 0x00, 0x00];
    const RATE_PT: [u8; 4] = [0x02, 0x00, 0x02, 0xD8];
    const ANGLES_REL: [u8; 9] = [0x04, 0x00, 0x00, 0x0B, 0x00, 0x22, 0x00, 0x16, 0x04];

    #[test]
    fn empty_buffer_needs_a_minimal_packet() {
        assert_eq!(extract_packet(&[]), FrameResult::NeedMoreBytes(3));
    }

    #[test]
    fn lone_valid_command_byte_waits() {
        assert_eq!(extract_packet(&[0x00]), FrameResult::NeedMoreBytes(2));
    }

    #[test]
    fn unknown_command_byte_is_invalid() {
        assert_eq!(
            extract_packet(&[0xF0]),
            FrameResult::Invalid(InvalidReason::UnknownCommand(0xF0))
        );
    }

    #[test]
    fn unknown_message_kind_is_invalid() {
        assert_eq!(
            extract_packet(&[0x00, 0x02]),
            FrameResult::Invalid(InvalidReason::UnknownMessageKind(0x02))
        );
    }

    #[test]
    fn complete_packets_report_their_length() {
        assert_eq!(extract_packet(&STOP), FrameResult::Complete(3));
        assert_eq!(extract_packet(&RATE_PT), FrameResult::Complete(4));
        assert_eq!(extract_packet(&ANGLES_REL), FrameResult::Complete(9));

        // Trailing bytes belong to the next packet.
        let mut buf = RATE_PT.to_vec();
        buf.extend_from_slice(&STOP);
        assert_eq!(extract_packet(&buf), FrameResult::Complete(4));
    }

    #[test]
    fn partial_packet_reports_missing_bytes() {
        assert_eq!(extract_packet(&ANGLES_REL[..2]), FrameResult::NeedMoreBytes(7));
        assert_eq!(extract_packet(&ANGLES_REL[..8]), FrameResult::NeedMoreBytes(1));
    }

    #[test]
    fn bad_checksum_is_invalid() {
        assert_eq!(
            extract_packet(&[0x02, 0x00, 0x02, 0x21]),
            FrameResult::Invalid(InvalidReason::ChecksumMismatch {
                expected: 0x21,
                actual: 0xD8,
            })
        );
    }

    #[test]
    fn byte_at_a_time_matches_whole_buffer() {
        for packet in [&STOP[..], &RATE_PT[..], &ANGLES_REL[..]] {
            for len in 0..packet.len() {
                assert!(
                    matches!(extract_packet(&packet[..len]), FrameResult::NeedMoreBytes(n) if n > 0),
                    "emitted early at {len} bytes"
                );
            }
            assert_eq!(
                extract_packet(packet),
                FrameResult::Complete(packet.len())
            );
        }
    }

    #[test]
    fn corrupting_any_payload_byte_drops_exactly_one() {
        for index in 2..ANGLES_REL.len() - 1 {
            let mut corrupted = ANGLES_REL;
            corrupted[index] ^= 0x40;
            assert!(
                matches!(
                    extract_packet(&corrupted),
                    FrameResult::Invalid(InvalidReason::ChecksumMismatch { .. })
                ),
                "corruption at byte {index} went unnoticed"
            );
        }
    }

    #[test]
    fn resynchronizes_after_garbage() {
        let mut buf = vec![0xF0, 0x03, 0x07];
        buf.extend_from_slice(&RATE_PT);

        let mut dropped = 0;
        let mut offset = 0;
        let packet_len = loop {
            match extract_packet(&buf[offset..]) {
                FrameResult::Invalid(_) => {
                    offset += 1;
                    dropped += 1;
                }
                FrameResult::Complete(len) => break len,
                FrameResult::NeedMoreBytes(n) => panic!("stalled needing {n} bytes"),
            }
        };

        assert_eq!(dropped, 3);
        assert_eq!(&buf[offset..offset + packet_len], RATE_PT);
    }

    #[test]
    fn packet_framer_delegates() {
        let framer = PacketFramer;
        assert_eq!(framer.try_extract(&STOP), FrameResult::Complete(3));
        assert_eq!(framer.max_packet_size(), MAX_PACKET_SIZE);
    }
}
