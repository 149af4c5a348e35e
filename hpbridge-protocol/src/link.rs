//! Serial register link framing
//!
//! The host talks to the bridge over a plain UART. Every message is one
//! short frame opened by a `0x7E` flag byte:
//!
//! ```text
//! 0x7E  len  kind  payload[len]  check
//! ```
//!
//! `len` counts payload bytes only and never exceeds [`MAX_LINK_PAYLOAD`]:
//! the largest message is a register write (address and value). `check` is
//! the XOR of `len`, `kind` and the payload. Nothing is escaped, so a flag
//! byte inside a payload is just data; after a bad frame the receiver hunts
//! for the next flag.

use heapless::Vec;

/// Flag byte opening every frame
pub const LINK_START: u8 = 0x7E;

/// Largest payload carried by any link message
pub const MAX_LINK_PAYLOAD: usize = 8;

/// Flag, length, kind and check bytes around the payload
const FRAME_OVERHEAD: usize = 4;

/// Largest frame on the wire
pub const MAX_LINK_FRAME: usize = MAX_LINK_PAYLOAD + FRAME_OVERHEAD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LinkError {
    /// Payload longer than [`MAX_LINK_PAYLOAD`]
    Oversize,
    /// Length byte announced more than [`MAX_LINK_PAYLOAD`] bytes
    BadLength(u8),
    /// Check byte did not match the frame contents
    Checksum { expected: u8, found: u8 },
    /// Payload size or contents wrong for the message kind
    BadPayload,
    /// Kind byte not handled by this side of the link
    UnknownType(u8),
    /// Output buffer shorter than the encoded frame
    NoRoom,
}

/// One link message: a kind byte and its payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFrame {
    pub kind: u8,
    pub payload: Vec<u8, MAX_LINK_PAYLOAD>,
}

fn check_byte(len: u8, kind: u8, payload: &[u8]) -> u8 {
    payload.iter().fold(len ^ kind, |acc, &b| acc ^ b)
}

impl LinkFrame {
    pub fn new(kind: u8, payload: &[u8]) -> Result<Self, LinkError> {
        let payload = Vec::from_slice(payload).map_err(|_| LinkError::Oversize)?;
        Ok(Self { kind, payload })
    }

    /// Size of this frame on the wire
    pub fn wire_len(&self) -> usize {
        self.payload.len() + FRAME_OVERHEAD
    }

    /// Write the frame into `out`, returning the number of bytes used
    pub fn encode(&self, out: &mut [u8]) -> Result<usize, LinkError> {
        let total = self.wire_len();
        let out = out.get_mut(..total).ok_or(LinkError::NoRoom)?;
        let len = self.payload.len() as u8;

        let (head, rest) = out.split_at_mut(3);
        head.copy_from_slice(&[LINK_START, len, self.kind]);
        let (body, check) = rest.split_at_mut(self.payload.len());
        body.copy_from_slice(&self.payload);
        check[0] = check_byte(len, self.kind, &self.payload);

        Ok(total)
    }
}

/// Where the receiver is inside the current frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RxState {
    /// Discarding bytes until a flag
    Hunt,
    Len,
    Kind { len: u8 },
    Body { len: u8, kind: u8 },
    Check { kind: u8 },
}

/// Incremental receiver for link frames
///
/// Bytes arrive one at a time from the UART. Errors are reported once, then
/// the receiver goes back to hunting for a flag.
#[derive(Debug, Clone)]
pub struct LinkParser {
    state: RxState,
    payload: Vec<u8, MAX_LINK_PAYLOAD>,
    /// Running XOR of everything after the flag
    check: u8,
}

impl Default for LinkParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkParser {
    pub const fn new() -> Self {
        Self {
            state: RxState::Hunt,
            payload: Vec::new(),
            check: 0,
        }
    }

    fn hunt(&mut self) {
        self.state = RxState::Hunt;
        self.payload.clear();
        self.check = 0;
    }

    /// Take one received byte, returning a frame when it completes one
    pub fn feed(&mut self, byte: u8) -> Result<Option<LinkFrame>, LinkError> {
        self.state = match self.state {
            RxState::Hunt => {
                if byte == LINK_START {
                    self.payload.clear();
                    self.check = 0;
                    RxState::Len
                } else {
                    RxState::Hunt
                }
            }
            RxState::Len => {
                if usize::from(byte) > MAX_LINK_PAYLOAD {
                    self.hunt();
                    return Err(LinkError::BadLength(byte));
                }
                self.check = byte;
                RxState::Kind { len: byte }
            }
            RxState::Kind { len } => {
                self.check ^= byte;
                if len == 0 {
                    RxState::Check { kind: byte }
                } else {
                    RxState::Body { len, kind: byte }
                }
            }
            RxState::Body { len, kind } => {
                self.check ^= byte;
                // Length was bounded on entry
                let _ = self.payload.push(byte);
                if self.payload.len() == usize::from(len) {
                    RxState::Check { kind }
                } else {
                    RxState::Body { len, kind }
                }
            }
            RxState::Check { kind } => {
                let expected = self.check;
                let payload = core::mem::take(&mut self.payload);
                self.hunt();
                if byte != expected {
                    return Err(LinkError::Checksum {
                        expected,
                        found: byte,
                    });
                }
                return Ok(Some(LinkFrame { kind, payload }));
            }
        };
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(frame: &LinkFrame) -> Vec<u8, MAX_LINK_FRAME> {
        let mut out = [0u8; MAX_LINK_FRAME];
        let len = frame.encode(&mut out).unwrap();
        Vec::from_slice(&out[..len]).unwrap()
    }

    fn receive(parser: &mut LinkParser, bytes: &[u8]) -> Result<Option<LinkFrame>, LinkError> {
        for &byte in bytes {
            if let Some(frame) = parser.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    #[test]
    fn test_encode_layout() {
        let frame = LinkFrame::new(0x01, &[0x00, 0x64]).unwrap();
        let mut out = [0u8; 8];
        let len = frame.encode(&mut out).unwrap();

        assert_eq!(len, 6);
        assert_eq!(&out[..6], &[LINK_START, 2, 0x01, 0x00, 0x64, 2 ^ 0x01 ^ 0x64]);
    }

    #[test]
    fn test_encode_needs_room_for_whole_frame() {
        let frame = LinkFrame::new(0x02, &[1, 2, 3, 4]).unwrap();
        assert_eq!(frame.wire_len(), 8);
        assert_eq!(frame.encode(&mut [0u8; 7]), Err(LinkError::NoRoom));
    }

    #[test]
    fn test_receiver_reads_back_encoded_frame() {
        let sent = LinkFrame::new(0x02, &[0x01, 0x2C, 0x00, 0xAD]).unwrap();
        let mut parser = LinkParser::new();
        assert_eq!(receive(&mut parser, &wire(&sent)), Ok(Some(sent)));
    }

    #[test]
    fn test_flag_byte_inside_payload_is_data() {
        let sent = LinkFrame::new(0x02, &[0x00, LINK_START, LINK_START, 0x01]).unwrap();
        let mut parser = LinkParser::new();
        assert_eq!(receive(&mut parser, &wire(&sent)), Ok(Some(sent)));
    }

    #[test]
    fn test_bad_check_byte_then_recovers() {
        let frame = LinkFrame::new(0x01, &[0x00, 0x65]).unwrap();
        let mut corrupted = wire(&frame);
        let last = corrupted.len() - 1;
        let good_check = corrupted[last];
        corrupted[last] ^= 0xFF;

        let mut parser = LinkParser::new();
        assert_eq!(
            receive(&mut parser, &corrupted),
            Err(LinkError::Checksum {
                expected: good_check,
                found: good_check ^ 0xFF
            })
        );
        assert_eq!(receive(&mut parser, &wire(&frame)), Ok(Some(frame)));
    }

    #[test]
    fn test_noise_before_flag_is_skipped() {
        let frame = LinkFrame::new(0x81, &[]).unwrap();
        let mut data = Vec::<u8, 16>::new();
        data.extend_from_slice(&[0x00, 0xFF, 0x12]).unwrap();
        data.extend_from_slice(&wire(&frame)).unwrap();

        let mut parser = LinkParser::new();
        let parsed = receive(&mut parser, &data).unwrap().unwrap();
        assert_eq!(parsed.kind, 0x81);
        assert!(parsed.payload.is_empty());
    }

    #[test]
    fn test_length_above_largest_message_is_rejected() {
        let mut parser = LinkParser::new();
        assert_eq!(parser.feed(LINK_START), Ok(None));
        assert_eq!(parser.feed(9), Err(LinkError::BadLength(9)));
        // Back to hunting: a stray kind byte is ignored
        assert_eq!(parser.feed(0x01), Ok(None));
    }

    #[test]
    fn test_payload_too_large() {
        assert_eq!(
            LinkFrame::new(0x01, &[0u8; MAX_LINK_PAYLOAD + 1]),
            Err(LinkError::Oversize)
        );
    }
}
