//! Ethernet II header decoding.
//!
//! The learning path needs only the two address fields, so this decoder
//! reads the fixed 14-byte header and leaves the payload untouched.

use byteorder::{BigEndian, ByteOrder};
use sonic_types::{MacAddress, ParseError};
use thiserror::Error;

/// Size of an untagged Ethernet II header.
pub const ETHERNET_HEADER_LEN: usize = 14;

/// Reasons a frame cannot be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FrameError {
    #[error("frame too short: {len} bytes (need 14)")]
    TooShort { len: usize },
}

/// Decoded Ethernet II header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: MacAddress,
    pub src: MacAddress,
    pub ethertype: u16,
}

impl EthernetHeader {
    /// Decodes the header at the start of `frame`.
    pub fn parse(frame: &[u8]) -> Result<Self, FrameError> {
        if frame.len() < ETHERNET_HEADER_LEN {
            return Err(FrameError::TooShort { len: frame.len() });
        }

        let too_short = |_: ParseError| FrameError::TooShort { len: frame.len() };
        Ok(Self {
            dst: MacAddress::from_slice(&frame[0..6]).map_err(too_short)?,
            src: MacAddress::from_slice(&frame[6..12]).map_err(too_short)?,
            ethertype: BigEndian::read_u16(&frame[12..14]),
        })
    }

    /// Encodes the header into a new buffer followed by `payload`.
    pub fn build_frame(&self, payload: &[u8]) -> Vec<u8> {
        let mut frame = Vec::with_capacity(ETHERNET_HEADER_LEN + payload.len());
        frame.extend_from_slice(self.dst.as_bytes());
        frame.extend_from_slice(self.src.as_bytes());
        let mut ethertype = [0u8; 2];
        BigEndian::write_u16(&mut ethertype, self.ethertype);
        frame.extend_from_slice(&ethertype);
        frame.extend_from_slice(payload);
        frame
    }
}
