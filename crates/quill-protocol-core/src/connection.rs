use crate::codec::{read_varint, varint_len, write_varint};
use crate::RawPacket;
use bytes::{Buf, BytesMut};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read as _, Write as _};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tracing::trace;

/// Largest frame a three-byte length prefix can announce.
pub const MAX_FRAME_LENGTH: usize = 2_097_151;

/// Largest uncompressed body a compressed frame may claim.
pub const MAX_DATA_LENGTH: usize = 8_388_608;

/// A framed play-state connection with optional compression.
pub struct Connection {
    stream: TcpStream,
    read_buf: BytesMut,
    compression_threshold: Option<i32>,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
            compression_threshold: None,
        }
    }

    pub fn enable_compression(&mut self, threshold: i32) {
        self.compression_threshold = Some(threshold);
    }

    /// Split into read and write halves, each keeping the compression setting.
    pub fn into_split(self) -> (ConnectionReader, ConnectionWriter) {
        let (read_half, write_half) = self.stream.into_split();
        (
            ConnectionReader {
                stream: read_half,
                read_buf: self.read_buf,
                compression_threshold: self.compression_threshold,
            },
            ConnectionWriter {
                stream: write_half,
                compression_threshold: self.compression_threshold,
            },
        )
    }
}

/// Read half of a split connection.
pub struct ConnectionReader {
    stream: OwnedReadHalf,
    read_buf: BytesMut,
    compression_threshold: Option<i32>,
}

impl ConnectionReader {
    pub async fn read_packet(&mut self) -> anyhow::Result<RawPacket> {
        loop {
            if let Some(packet) = decode_frame(&mut self.read_buf, self.compression_threshold)? {
                return Ok(packet);
            }
            let mut tmp = [0u8; 4096];
            let n = self.stream.read(&mut tmp).await?;
            if n == 0 {
                return Err(anyhow::anyhow!("Connection closed"));
            }
            self.read_buf.extend_from_slice(&tmp[..n]);
        }
    }
}

/// Write half of a split connection.
pub struct ConnectionWriter {
    stream: OwnedWriteHalf,
    compression_threshold: Option<i32>,
}

impl ConnectionWriter {
    pub async fn write_packet(&mut self, packet: &RawPacket) -> anyhow::Result<()> {
        let frame = encode_frame(packet, self.compression_threshold)?;
        self.stream.write_all(&frame).await?;
        Ok(())
    }
}

/// Pop one complete frame off `read_buf`, or `None` if more bytes are needed.
pub fn decode_frame(
    read_buf: &mut BytesMut,
    compression_threshold: Option<i32>,
) -> anyhow::Result<Option<RawPacket>> {
    if read_buf.is_empty() {
        return Ok(None);
    }

    let mut peek = read_buf.clone();
    let length = match read_varint(&mut peek) {
        Ok(len) if len < 0 => anyhow::bail!("negative frame length {}", len),
        Ok(len) if len as usize > MAX_FRAME_LENGTH => anyhow::bail!("frame length {} too large", len),
        Ok(len) => len as usize,
        Err(_) => return Ok(None),
    };
    let prefix_len = read_buf.len() - peek.len();
    if peek.remaining() < length {
        return Ok(None);
    }

    read_buf.advance(prefix_len);
    let mut body = read_buf.split_to(length);

    if compression_threshold.is_some() {
        let data_length = match read_varint(&mut body)? {
            len if len < 0 => anyhow::bail!("negative data length {}", len),
            len if len as usize > MAX_DATA_LENGTH => anyhow::bail!("data length {} too large", len),
            len => len as usize,
        };
        if data_length > 0 {
            let mut inflated = vec![0u8; data_length];
            ZlibDecoder::new(&body[..]).read_exact(&mut inflated)?;
            body = BytesMut::from(&inflated[..]);
        }
    }

    let id = read_varint(&mut body)?;
    trace!("Read packet id=0x{:02X} len={}", id, body.len());
    Ok(Some(RawPacket::new(id, body)))
}

/// Build the frame for `packet`.
pub fn encode_frame(packet: &RawPacket, compression_threshold: Option<i32>) -> anyhow::Result<BytesMut> {
    let mut body = BytesMut::new();
    write_varint(&mut body, packet.id);
    body.extend_from_slice(&packet.data);

    let mut frame = BytesMut::new();
    match compression_threshold {
        Some(threshold) if body.len() as i32 >= threshold => {
            let uncompressed_len = body.len() as i32;
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(&body)?;
            let compressed = encoder.finish()?;
            write_varint(&mut frame, (varint_len(uncompressed_len) + compressed.len()) as i32);
            write_varint(&mut frame, uncompressed_len);
            frame.extend_from_slice(&compressed);
        }
        Some(_) => {
            write_varint(&mut frame, (1 + body.len()) as i32);
            write_varint(&mut frame, 0);
            frame.extend_from_slice(&body);
        }
        None => {
            write_varint(&mut frame, body.len() as i32);
            frame.extend_from_slice(&body);
        }
    }
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(id: i32, payload: &[u8]) -> RawPacket {
        RawPacket::new(id, BytesMut::from(payload))
    }

    #[test]
    fn test_uncompressed_frame() {
        let frame = encode_frame(&packet(0x2E, &[1, 2, 3]), None).unwrap();
        assert_eq!(frame.to_vec(), vec![4, 0x2E, 1, 2, 3]);
        let mut buf = frame;
        assert_eq!(decode_frame(&mut buf, None).unwrap(), Some(packet(0x2E, &[1, 2, 3])));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_compressed_frames_both_sides_of_threshold() {
        let small = packet(0x01, &[9; 4]);
        let large = packet(0x02, &[7; 600]);
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&encode_frame(&small, Some(256)).unwrap());
        buf.extend_from_slice(&encode_frame(&large, Some(256)).unwrap());

        assert_eq!(decode_frame(&mut buf, Some(256)).unwrap(), Some(small));
        assert_eq!(decode_frame(&mut buf, Some(256)).unwrap(), Some(large));
        assert_eq!(decode_frame(&mut buf, Some(256)).unwrap(), None);
    }

    #[test]
    fn test_partial_frame_waits() {
        let frame = encode_frame(&packet(0x10, &[5; 10]), None).unwrap();
        let mut buf = BytesMut::from(&frame[..6]);
        assert_eq!(decode_frame(&mut buf, None).unwrap(), None);
        assert_eq!(buf.len(), 6);
        buf.extend_from_slice(&frame[6..]);
        assert!(decode_frame(&mut buf, None).unwrap().is_some());
    }

    #[test]
    fn test_negative_data_length_rejected() {
        // Data length varint is -1.
        let mut buf = BytesMut::from(&[0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F][..]);
        assert!(decode_frame(&mut buf, Some(256)).is_err());
    }

    #[test]
    fn test_oversized_data_length_rejected() {
        // Claims 8 MiB + 1 of inflated data.
        let mut buf = BytesMut::from(&[0x05, 0x81, 0x80, 0x80, 0x04, 0x00][..]);
        assert!(decode_frame(&mut buf, Some(256)).is_err());
    }

    #[test]
    fn test_oversized_frame_rejected_before_body_arrives() {
        let mut buf = BytesMut::from(&[0x80, 0x80, 0x80, 0x01][..]);
        assert!(decode_frame(&mut buf, None).is_err());
    }
}
