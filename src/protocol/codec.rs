use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::core::Error;
use super::message::{NtpRequest, NtpResponse};
use super::NTP_PACKET_SIZE;

/// Datagram codec for NTP packets.
///
/// Each UDP datagram holds exactly one packet, so a decode consumes the whole
/// buffer whether or not the packet carried trailing fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct NtpCodec;

impl NtpCodec {
    /// Creates a new NTP codec
    pub fn new() -> Self {
        NtpCodec
    }
}

impl Decoder for NtpCodec {
    type Item = NtpResponse;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if src.len() < NTP_PACKET_SIZE {
            return Ok(None);
        }

        let datagram = src.split();
        NtpResponse::from_bytes(&datagram).map(Some)
    }
}

impl Encoder<NtpRequest> for NtpCodec {
    type Error = Error;

    fn encode(&mut self, item: NtpRequest, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(NTP_PACKET_SIZE);
        dst.put_slice(item.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_request() {
        let mut codec = NtpCodec::new();
        let mut bytes = BytesMut::new();

        codec.encode(NtpRequest::new(), &mut bytes).unwrap();

        assert_eq!(bytes.len(), 48);
        assert_eq!(bytes[0], 0x1B);
    }

    #[test]
    fn test_decode_response() {
        let mut codec = NtpCodec::new();
        let reply = NtpResponse::with_transmit(3_794_992_800, 0);
        let mut bytes = BytesMut::from(&reply.as_bytes()[..]);

        let decoded = codec.decode(&mut bytes).unwrap().unwrap();
        assert_eq!(decoded, reply);
        assert!(bytes.is_empty());
    }

    #[test]
    fn test_decode_short_datagram() {
        let mut codec = NtpCodec::new();
        let mut bytes = BytesMut::from(&[0x1Cu8; 20][..]);

        assert!(codec.decode(&mut bytes).unwrap().is_none());
        // Nothing is consumed until a full packet is present
        assert_eq!(bytes.len(), 20);
    }

    #[test]
    fn test_decode_rejects_client_packet() {
        let mut codec = NtpCodec::new();
        let mut bytes = BytesMut::new();
        codec.encode(NtpRequest::new(), &mut bytes).unwrap();

        let result = codec.decode(&mut bytes);
        assert!(matches!(result, Err(Error::MalformedResponse(_))));
    }
}
