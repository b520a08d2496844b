use chrono::{DateTime, Local, Utc};

use crate::core::{Error, Result};
use crate::time;
use super::{
    MODE_MASK, MODE_SERVER, NTP_PACKET_SIZE, REQUEST_HEADER, TRANSMIT_FRACTION_OFFSET,
    TRANSMIT_SECONDS_OFFSET,
};

/// Client-mode NTP request.
///
/// Every field except the header byte is zero, which servers accept from
/// SNTP clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtpRequest([u8; NTP_PACKET_SIZE]);

impl NtpRequest {
    /// Creates a fresh request packet
    pub fn new() -> Self {
        let mut packet = [0u8; NTP_PACKET_SIZE];
        packet[0] = REQUEST_HEADER;
        NtpRequest(packet)
    }

    /// Returns the wire representation
    pub fn as_bytes(&self) -> &[u8; NTP_PACKET_SIZE] {
        &self.0
    }
}

impl Default for NtpRequest {
    fn default() -> Self {
        NtpRequest::new()
    }
}

/// Reply received from an NTP server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtpResponse([u8; NTP_PACKET_SIZE]);

impl NtpResponse {
    /// Wraps a raw reply after checking it is a usable server packet.
    ///
    /// Only the first 48 bytes are kept, trailing extension fields or MACs
    /// are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < NTP_PACKET_SIZE {
            return Err(Error::malformed(format!(
                "Reply is {} bytes, expected at least {}",
                bytes.len(),
                NTP_PACKET_SIZE
            )));
        }

        let mode = bytes[0] & MODE_MASK;
        if mode != MODE_SERVER {
            return Err(Error::malformed(format!("Unexpected NTP mode {}", mode)));
        }

        let mut packet = [0u8; NTP_PACKET_SIZE];
        packet.copy_from_slice(&bytes[..NTP_PACKET_SIZE]);
        Ok(NtpResponse(packet))
    }

    /// Builds a server reply carrying the given transmit timestamp
    pub fn with_transmit(seconds: u32, fraction: u32) -> Self {
        let mut packet = [0u8; NTP_PACKET_SIZE];
        // LI 0, VN 3, server mode
        packet[0] = (3 << 3) | MODE_SERVER;
        packet[TRANSMIT_SECONDS_OFFSET..TRANSMIT_SECONDS_OFFSET + 4]
            .copy_from_slice(&seconds.to_be_bytes());
        packet[TRANSMIT_FRACTION_OFFSET..TRANSMIT_FRACTION_OFFSET + 4]
            .copy_from_slice(&fraction.to_be_bytes());
        NtpResponse(packet)
    }

    /// Returns the wire representation
    pub fn as_bytes(&self) -> &[u8; NTP_PACKET_SIZE] {
        &self.0
    }

    /// Transmit timestamp seconds since 1900
    pub fn transmit_seconds(&self) -> u32 {
        read_be_u32(&self.0, TRANSMIT_SECONDS_OFFSET)
    }

    /// Transmit timestamp fraction of a second in units of 2^-32 s
    pub fn transmit_fraction(&self) -> u32 {
        read_be_u32(&self.0, TRANSMIT_FRACTION_OFFSET)
    }

    /// Transmit timestamp as UTC
    pub fn transmit_utc(&self) -> Result<DateTime<Utc>> {
        time::ntp_to_utc(self.transmit_seconds(), self.transmit_fraction())
    }

    /// Transmit timestamp converted to local time
    pub fn transmit_local(&self) -> Result<DateTime<Local>> {
        time::ntp_to_local(self.transmit_seconds(), self.transmit_fraction())
    }
}

/// Reads the transmit timestamp of a raw 48-byte packet without checking the
/// header, returning it in local time.
pub fn parse_transmit_timestamp(bytes: &[u8]) -> Result<DateTime<Local>> {
    if bytes.len() < NTP_PACKET_SIZE {
        return Err(Error::malformed(format!(
            "Packet is {} bytes, expected {}",
            bytes.len(),
            NTP_PACKET_SIZE
        )));
    }

    time::ntp_to_local(
        read_be_u32(bytes, TRANSMIT_SECONDS_OFFSET),
        read_be_u32(bytes, TRANSMIT_FRACTION_OFFSET),
    )
}

fn read_be_u32(bytes: &[u8], offset: usize) -> u32 {
    let mut word = [0u8; 4];
    word.copy_from_slice(&bytes[offset..offset + 4]);
    u32::from_be_bytes(word)
}
