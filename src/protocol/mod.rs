//! NTP wire format
//! 
//! Only the parts of the packet an SNTP client needs are modelled: the
//! client-mode request header and the server's transmit timestamp.

pub mod codec;
pub mod message;

pub use self::codec::NtpCodec;
pub use self::message::{parse_transmit_timestamp, NtpRequest, NtpResponse};

/// Size of an NTP packet without extension fields
pub const NTP_PACKET_SIZE: usize = 48;

/// Largest datagram read from the server, room for extensions and a MAC
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// Request header byte: LI 0, VN 3, client mode
pub const REQUEST_HEADER: u8 = 0x1B;

/// Mask selecting the association mode bits of the header byte
pub const MODE_MASK: u8 = 0b0000_0111;

/// Association mode of a server reply
pub const MODE_SERVER: u8 = 4;

/// Offset of the transmit timestamp seconds field
pub const TRANSMIT_SECONDS_OFFSET: usize = 40;

/// Offset of the transmit timestamp fraction field
pub const TRANSMIT_FRACTION_OFFSET: usize = 44;
