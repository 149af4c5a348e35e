//! Register link messages
//!
//! Host → bridge: register reads and writes.
//! Bridge → host: the register value, or an error code.

use crate::link::{LinkError, LinkFrame};

// Message type IDs: host → bridge
pub const MSG_READ: u8 = 0x01;
pub const MSG_WRITE: u8 = 0x02;

// Message type IDs: bridge → host
pub const MSG_VALUE: u8 = 0x81;
pub const MSG_ERROR: u8 = 0x8F;

/// Requests sent by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkRequest {
    Read { address: u16 },
    Write { address: u16, value: u16 },
}

/// Why a request could not be answered with a value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkErrorCode {
    /// No register at that address
    UnknownAddress,
    /// Write to an input register
    ReadOnly,
    /// Value outside the register's accepted range
    OutOfRange,
    /// Another operation is already driving the keypad
    Busy,
    /// Frame could not be decoded
    Malformed,
}

impl LinkErrorCode {
    pub fn to_byte(self) -> u8 {
        match self {
            LinkErrorCode::UnknownAddress => 0x01,
            LinkErrorCode::ReadOnly => 0x02,
            LinkErrorCode::OutOfRange => 0x03,
            LinkErrorCode::Busy => 0x04,
            LinkErrorCode::Malformed => 0x05,
        }
    }

    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(LinkErrorCode::UnknownAddress),
            0x02 => Some(LinkErrorCode::ReadOnly),
            0x03 => Some(LinkErrorCode::OutOfRange),
            0x04 => Some(LinkErrorCode::Busy),
            0x05 => Some(LinkErrorCode::Malformed),
            _ => None,
        }
    }
}

/// Replies sent by the bridge
///
/// A failed operation on a valid register is still a `Value` carrying
/// [`crate::registers::FAILURE`]; `Error` is for requests that never
/// reached a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkResponse {
    Value { address: u16, value: u16 },
    Error(LinkErrorCode),
}

fn be_u16(payload: &[u8], offset: usize) -> Result<u16, LinkError> {
    payload
        .get(offset..offset + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or(LinkError::BadPayload)
}

impl LinkRequest {
    pub fn from_frame(frame: &LinkFrame) -> Result<Self, LinkError> {
        match frame.kind {
            MSG_READ if frame.payload.len() == 2 => Ok(LinkRequest::Read {
                address: be_u16(&frame.payload, 0)?,
            }),
            MSG_WRITE if frame.payload.len() == 4 => Ok(LinkRequest::Write {
                address: be_u16(&frame.payload, 0)?,
                value: be_u16(&frame.payload, 2)?,
            }),
            MSG_READ | MSG_WRITE => Err(LinkError::BadPayload),
            other => Err(LinkError::UnknownType(other)),
        }
    }

    pub fn to_frame(&self) -> Result<LinkFrame, LinkError> {
        match *self {
            LinkRequest::Read { address } => LinkFrame::new(MSG_READ, &address.to_be_bytes()),
            LinkRequest::Write { address, value } => {
                let [a0, a1] = address.to_be_bytes();
                let [v0, v1] = value.to_be_bytes();
                LinkFrame::new(MSG_WRITE, &[a0, a1, v0, v1])
            }
        }
    }
}

impl LinkResponse {
    pub fn to_frame(&self) -> Result<LinkFrame, LinkError> {
        match *self {
            LinkResponse::Value { address, value } => {
                let [a0, a1] = address.to_be_bytes();
                let [v0, v1] = value.to_be_bytes();
                LinkFrame::new(MSG_VALUE, &[a0, a1, v0, v1])
            }
            LinkResponse::Error(code) => LinkFrame::new(MSG_ERROR, &[code.to_byte()]),
        }
    }

    /// Parse a reply (host side and tests)
    pub fn from_frame(frame: &LinkFrame) -> Result<Self, LinkError> {
        match frame.kind {
            MSG_VALUE if frame.payload.len() == 4 => Ok(LinkResponse::Value {
                address: be_u16(&frame.payload, 0)?,
                value: be_u16(&frame.payload, 2)?,
            }),
            MSG_ERROR if frame.payload.len() == 1 => LinkErrorCode::from_byte(frame.payload[0])
                .map(LinkResponse::Error)
                .ok_or(LinkError::BadPayload),
            MSG_VALUE | MSG_ERROR => Err(LinkError::BadPayload),
            other => Err(LinkError::UnknownType(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_request_payload_is_big_endian() {
        let frame = LinkRequest::Read { address: 310 }.to_frame().unwrap();
        assert_eq!(frame.kind, MSG_READ);
        assert_eq!(&frame.payload[..], &[0x01, 0x36]);
    }

    #[test]
    fn test_write_request_parse() {
        let frame = LinkFrame::new(MSG_WRITE, &[0x01, 0x2C, 0x00, 0xAD]).unwrap();
        assert_eq!(
            LinkRequest::from_frame(&frame),
            Ok(LinkRequest::Write {
                address: 300,
                value: 173
            })
        );
    }

    #[test]
    fn test_short_payload_is_invalid() {
        let frame = LinkFrame::new(MSG_WRITE, &[0x01, 0x2C]).unwrap();
        assert_eq!(LinkRequest::from_frame(&frame), Err(LinkError::BadPayload));
    }

    #[test]
    fn test_unknown_type() {
        let frame = LinkFrame::new(0x33, &[]).unwrap();
        assert_eq!(
            LinkRequest::from_frame(&frame),
            Err(LinkError::UnknownType(0x33))
        );
    }

    #[test]
    fn test_error_response_frame() {
        let frame = LinkResponse::Error(LinkErrorCode::ReadOnly).to_frame().unwrap();
        assert_eq!(frame.kind, MSG_ERROR);
        assert_eq!(&frame.payload[..], &[0x02]);
        assert_eq!(
            LinkResponse::from_frame(&frame),
            Ok(LinkResponse::Error(LinkErrorCode::ReadOnly))
        );
    }

    #[test]
    fn test_value_response_frame() {
        let response = LinkResponse::Value {
            address: 102,
            value: 0x0013,
        };
        let frame = response.to_frame().unwrap();
        assert_eq!(&frame.payload[..], &[0x00, 0x66, 0x00, 0x13]);
        assert_eq!(LinkResponse::from_frame(&frame), Ok(response));
    }
}
