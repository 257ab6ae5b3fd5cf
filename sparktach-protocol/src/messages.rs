//! Message types for the link protocol
//!
//! Message types are divided into two categories:
//! - Bridge → Sparktach: static advance queries and changes, heartbeat
//! - Sparktach → Bridge: telemetry, static advance replies, heartbeat

use crate::frame::{Frame, FrameError};

// Message type IDs: Bridge → Sparktach
pub const MSG_GET_STATIC_ADVANCE: u8 = 0x01;
pub const MSG_SET_STATIC_ADVANCE: u8 = 0x02;
pub const MSG_PING: u8 = 0x03;

// Message type IDs: Sparktach → Bridge
pub const MSG_TELEMETRY: u8 = 0x10;
pub const MSG_STATIC_ADVANCE: u8 = 0x11;
pub const MSG_REJECTED: u8 = 0x12;
pub const MSG_PONG: u8 = 0x1F;

/// Telemetry flag: speed field is valid
pub const FLAG_SPEED_VALID: u8 = 0x01;
/// Telemetry flag: advance field is valid
pub const FLAG_ADVANCE_VALID: u8 = 0x02;

/// One telemetry reading as sent on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Telemetry {
    /// RPM, `None` when unknown
    pub speed_rpm: Option<u32>,
    /// Spark advance in degrees, `None` when unknown
    pub advance_deg: Option<i16>,
}

impl Telemetry {
    /// Build from engine-side values, saturating the advance to the wire range
    pub fn new(speed_rpm: Option<u32>, advance_deg: Option<i32>) -> Self {
        Self {
            speed_rpm,
            advance_deg: advance_deg.map(|a| a.clamp(i16::MIN as i32, i16::MAX as i32) as i16),
        }
    }

    fn encode(&self) -> [u8; 7] {
        let mut flags = 0;
        if self.speed_rpm.is_some() {
            flags |= FLAG_SPEED_VALID;
        }
        if self.advance_deg.is_some() {
            flags |= FLAG_ADVANCE_VALID;
        }
        let speed = self.speed_rpm.unwrap_or(0).to_le_bytes();
        let advance = self.advance_deg.unwrap_or(0).to_le_bytes();

        [flags, speed[0], speed[1], speed[2], speed[3], advance[0], advance[1]]
    }

    fn decode(payload: &[u8]) -> Result<Self, FrameError> {
        let [flags, s0, s1, s2, s3, a0, a1] = payload else {
            return Err(FrameError::InvalidFrame);
        };
        let speed = u32::from_le_bytes([*s0, *s1, *s2, *s3]);
        let advance = i16::from_le_bytes([*a0, *a1]);

        Ok(Self {
            speed_rpm: (flags & FLAG_SPEED_VALID != 0).then_some(speed),
            advance_deg: (flags & FLAG_ADVANCE_VALID != 0).then_some(advance),
        })
    }
}

/// Messages from Sparktach to the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkMessage {
    /// Periodic reading
    Telemetry(Telemetry),
    /// Current static advance (reply to get or accepted set)
    StaticAdvance(u16),
    /// A set request failed validation; carries the rejected value
    Rejected(i16),
    /// Heartbeat response
    Pong,
}

impl LinkMessage {
    /// Encode this message into a frame
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            LinkMessage::Telemetry(t) => Frame::new(MSG_TELEMETRY, &t.encode()),
            LinkMessage::StaticAdvance(degrees) => {
                Frame::new(MSG_STATIC_ADVANCE, &degrees.to_le_bytes())
            }
            LinkMessage::Rejected(value) => Frame::new(MSG_REJECTED, &value.to_le_bytes()),
            LinkMessage::Pong => Ok(Frame::empty(MSG_PONG)),
        }
    }

    /// Parse a message from a frame (bridge side, tests)
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_TELEMETRY => Telemetry::decode(&frame.payload).map(LinkMessage::Telemetry),
            MSG_STATIC_ADVANCE => Ok(LinkMessage::StaticAdvance(u16::from_le_bytes(
                two_bytes(&frame.payload)?,
            ))),
            MSG_REJECTED => Ok(LinkMessage::Rejected(i16::from_le_bytes(two_bytes(
                &frame.payload,
            )?))),
            MSG_PONG => Ok(LinkMessage::Pong),
            _ => Err(FrameError::InvalidFrame),
        }
    }
}

/// Commands from the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlCommand {
    /// Ask for the current static advance
    GetStaticAdvance,
    /// Change the static advance; validated by the receiver
    SetStaticAdvance(i16),
    /// Heartbeat request
    Ping,
}

impl ControlCommand {
    /// Parse a command from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, FrameError> {
        match frame.msg_type {
            MSG_GET_STATIC_ADVANCE => Ok(ControlCommand::GetStaticAdvance),
            MSG_SET_STATIC_ADVANCE => Ok(ControlCommand::SetStaticAdvance(i16::from_le_bytes(
                two_bytes(&frame.payload)?,
            ))),
            MSG_PING => Ok(ControlCommand::Ping),
            _ => Err(FrameError::InvalidFrame),
        }
    }

    /// Encode this command into a frame (bridge side, tests)
    pub fn to_frame(&self) -> Result<Frame, FrameError> {
        match self {
            ControlCommand::GetStaticAdvance => Ok(Frame::empty(MSG_GET_STATIC_ADVANCE)),
            ControlCommand::SetStaticAdvance(value) => {
                Frame::new(MSG_SET_STATIC_ADVANCE, &value.to_le_bytes())
            }
            ControlCommand::Ping => Ok(Frame::empty(MSG_PING)),
        }
    }
}

fn two_bytes(payload: &[u8]) -> Result<[u8; 2], FrameError> {
    payload.try_into().map_err(|_| FrameError::InvalidFrame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::FrameParser;

    #[test]
    fn test_telemetry_layout() {
        let msg = LinkMessage::Telemetry(Telemetry::new(Some(3_000), Some(-18)));
        let frame = msg.to_frame().unwrap();

        assert_eq!(frame.msg_type, MSG_TELEMETRY);
        assert_eq!(
            frame.payload.as_slice(),
            &[0x03, 0xB8, 0x0B, 0x00, 0x00, 0xEE, 0xFF]
        );
    }

    #[test]
    fn test_unknown_telemetry_fields() {
        let msg = LinkMessage::Telemetry(Telemetry::new(None, None));
        let frame = msg.to_frame().unwrap();
        assert_eq!(frame.payload[0], 0);
        assert_eq!(LinkMessage::from_frame(&frame), Ok(msg));

        let speed_only = LinkMessage::Telemetry(Telemetry::new(Some(900), None));
        let frame = speed_only.to_frame().unwrap();
        assert_eq!(frame.payload[0], FLAG_SPEED_VALID);
        assert_eq!(LinkMessage::from_frame(&frame), Ok(speed_only));
    }

    #[test]
    fn test_advance_saturates_to_wire_range() {
        assert_eq!(Telemetry::new(None, Some(-100_000)).advance_deg, Some(i16::MIN));
        assert_eq!(Telemetry::new(None, Some(40_000)).advance_deg, Some(i16::MAX));
    }

    #[test]
    fn test_set_static_advance_command() {
        let frame = Frame::new(MSG_SET_STATIC_ADVANCE, &[0x68, 0x01]).unwrap();
        assert_eq!(
            ControlCommand::from_frame(&frame),
            Ok(ControlCommand::SetStaticAdvance(360))
        );

        // Negative values reach the validator intact
        let frame = ControlCommand::SetStaticAdvance(-5).to_frame().unwrap();
        assert_eq!(
            ControlCommand::from_frame(&frame),
            Ok(ControlCommand::SetStaticAdvance(-5))
        );
    }

    #[test]
    fn test_short_payload_rejected() {
        let frame = Frame::new(MSG_SET_STATIC_ADVANCE, &[36]).unwrap();
        assert_eq!(ControlCommand::from_frame(&frame), Err(FrameError::InvalidFrame));

        let frame = Frame::new(MSG_TELEMETRY, &[0, 1, 2]).unwrap();
        assert_eq!(LinkMessage::from_frame(&frame), Err(FrameError::InvalidFrame));
    }

    #[test]
    fn test_unknown_type_rejected() {
        assert_eq!(
            ControlCommand::from_frame(&Frame::empty(0x7E)),
            Err(FrameError::InvalidFrame)
        );
    }

    #[test]
    fn test_command_over_the_wire() {
        let bytes = ControlCommand::GetStaticAdvance
            .to_frame()
            .unwrap()
            .encode_to_vec()
            .unwrap();

        let mut parser = FrameParser::new();
        let frame = parser.feed_bytes(&bytes).unwrap().unwrap();
        assert_eq!(
            ControlCommand::from_frame(&frame),
            Ok(ControlCommand::GetStaticAdvance)
        );
    }

    #[test]
    fn test_replies() {
        let frame = LinkMessage::StaticAdvance(36).to_frame().unwrap();
        assert_eq!(frame.payload.as_slice(), &[36, 0]);

        let frame = LinkMessage::Rejected(400).to_frame().unwrap();
        assert_eq!(LinkMessage::from_frame(&frame), Ok(LinkMessage::Rejected(400)));

        assert_eq!(LinkMessage::Pong.to_frame().unwrap().msg_type, MSG_PONG);
    }
}
