use bytes::{Buf, BufMut, BytesMut};
use quill_nbt::NbtValue;
use quill_types::BlockPos;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("VarInt too big")]
    VarIntTooBig,
    #[error("Not enough data")]
    NotEnoughData,
    #[error("String too long: {0} > {1}")]
    StringTooLong(usize, usize),
    #[error("Negative length: {0}")]
    NegativeLength(i32),
}

pub type CodecResult<T> = Result<T, CodecError>;

/// Which bit layout a generation uses to pack a block position into a long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionLayout {
    /// `x<<38 | y<<26 | z`, used before 1.14.
    Legacy,
    /// `x<<38 | z<<12 | y`, used from 1.14.
    Modern,
}

/// Read a VarInt from the buffer.
pub fn read_varint(buf: &mut BytesMut) -> CodecResult<i32> {
    let mut result: i32 = 0;
    let mut shift: u32 = 0;
    loop {
        if !buf.has_remaining() {
            return Err(CodecError::NotEnoughData);
        }
        let byte = buf.get_u8();
        result |= ((byte & 0x7F) as i32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
        if shift >= 35 {
            return Err(CodecError::VarIntTooBig);
        }
    }
}

/// Write a VarInt to the buffer.
pub fn write_varint(buf: &mut BytesMut, mut value: i32) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value = ((value as u32) >> 7) as i32;
        if value != 0 {
            byte |= 0x80;
        }
        buf.put_u8(byte);
        if value == 0 {
            break;
        }
    }
}

/// Calculate the byte length of a VarInt.
pub fn varint_len(value: i32) -> usize {
    let mut val = value as u32;
    let mut len = 0;
    loop {
        len += 1;
        val >>= 7;
        if val == 0 {
            break;
        }
    }
    len
}

/// Read a protocol string (varint-prefixed UTF-8).
pub fn read_string(buf: &mut BytesMut, max_len: usize) -> CodecResult<String> {
    let len = read_varint(buf)?;
    if len < 0 {
        return Err(CodecError::NegativeLength(len));
    }
    let len = len as usize;
    if len > max_len * 4 {
        return Err(CodecError::StringTooLong(len, max_len));
    }
    if buf.remaining() < len {
        return Err(CodecError::NotEnoughData);
    }
    let bytes = buf.split_to(len);
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Write a protocol string.
pub fn write_string(buf: &mut BytesMut, s: &str) {
    write_varint(buf, s.len() as i32);
    buf.put_slice(s.as_bytes());
}

pub fn read_u8(buf: &mut BytesMut) -> CodecResult<u8> {
    if buf.remaining() < 1 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_u8())
}

pub fn read_bool(buf: &mut BytesMut) -> CodecResult<bool> {
    Ok(read_u8(buf)? != 0)
}

pub fn read_i16(buf: &mut BytesMut) -> CodecResult<i16> {
    if buf.remaining() < 2 {
        return Err(CodecError::NotEnoughData);
    }
    Ok(buf.get_i16())
}

pub fn read_position(buf: &mut BytesMut, layout: PositionLayout) -> CodecResult<BlockPos> {
    if buf.remaining() < 8 {
        return Err(CodecError::NotEnoughData);
    }
    let raw = buf.get_u64();
    Ok(match layout {
        PositionLayout::Legacy => BlockPos::decode_legacy(raw),
        PositionLayout::Modern => BlockPos::decode(raw),
    })
}

pub fn write_position(buf: &mut BytesMut, pos: &BlockPos, layout: PositionLayout) {
    let raw = match layout {
        PositionLayout::Legacy => pos.encode_legacy(),
        PositionLayout::Modern => pos.encode(),
    };
    buf.put_u64(raw);
}

/// Write a slot in the 1.8 - 1.12 layout: i16 item id, i8 count, i16 damage,
/// then a named-root compound or a single TAG_END byte.
pub fn write_legacy_slot(buf: &mut BytesMut, item_id: i16, count: i8, nbt: Option<&NbtValue>) {
    buf.put_i16(item_id);
    buf.put_i8(count);
    buf.put_i16(0);
    write_optional_nbt(buf, nbt);
}

/// Write a slot in the 1.13 - 1.20.4 layout: present flag, varint item id,
/// i8 count, then a named-root compound or a single TAG_END byte.
pub fn write_flattened_slot(buf: &mut BytesMut, item_id: i32, count: i8, nbt: Option<&NbtValue>) {
    buf.put_u8(1);
    write_varint(buf, item_id);
    buf.put_i8(count);
    write_optional_nbt(buf, nbt);
}

/// An empty slot in either the legacy (`-1` id) or the flattened (`false`) layout.
pub fn write_empty_slot(buf: &mut BytesMut, legacy: bool) {
    if legacy {
        buf.put_i16(-1);
    } else {
        buf.put_u8(0);
    }
}

fn write_optional_nbt(buf: &mut BytesMut, nbt: Option<&NbtValue>) {
    match nbt {
        Some(value) => value.write_root_named("", buf),
        None => buf.put_u8(quill_nbt::TAG_END),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        let test_cases = vec![
            (0, vec![0x00]),
            (1, vec![0x01]),
            (127, vec![0x7F]),
            (128, vec![0x80, 0x01]),
            (25565, vec![0xDD, 0xC7, 0x01]),
            (-1, vec![0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
        ];

        for (value, expected_bytes) in test_cases {
            let mut buf = BytesMut::new();
            write_varint(&mut buf, value);
            assert_eq!(buf.to_vec(), expected_bytes, "write_varint({}) failed", value);

            let mut buf = BytesMut::from(&expected_bytes[..]);
            assert_eq!(read_varint(&mut buf).unwrap(), value);
        }
    }

    #[test]
    fn test_varint_truncated() {
        let mut buf = BytesMut::from(&[0x80u8, 0x80][..]);
        assert!(matches!(read_varint(&mut buf), Err(CodecError::NotEnoughData)));
    }

    #[test]
    fn test_varint_len() {
        assert_eq!(varint_len(0), 1);
        assert_eq!(varint_len(128), 2);
        assert_eq!(varint_len(-1), 5);
    }

    #[test]
    fn test_string_limits() {
        let mut buf = BytesMut::new();
        write_string(&mut buf, "Flaming Sword");
        assert_eq!(read_string(&mut buf, 50).unwrap(), "Flaming Sword");

        let mut buf = BytesMut::new();
        write_string(&mut buf, &"x".repeat(20));
        assert!(matches!(read_string(&mut buf, 4), Err(CodecError::StringTooLong(20, 4))));
    }

    #[test]
    fn test_position_layouts() {
        let pos = BlockPos::new(-12, 0, 400);
        for layout in [PositionLayout::Legacy, PositionLayout::Modern] {
            let mut buf = BytesMut::new();
            write_position(&mut buf, &pos, layout);
            assert_eq!(read_position(&mut buf, layout).unwrap(), pos);
        }
    }

    #[test]
    fn test_legacy_slot_without_nbt() {
        let mut buf = BytesMut::new();
        write_legacy_slot(&mut buf, 339, 1, None);
        assert_eq!(buf.to_vec(), vec![0x01, 0x53, 0x01, 0x00, 0x00, 0x00]);
    }

    #[test]
    fn test_flattened_slot_with_nbt() {
        let nbt = quill_nbt::nbt_compound! { "a" => NbtValue::Byte(1) };
        let mut buf = BytesMut::new();
        write_flattened_slot(&mut buf, 5, 1, Some(&nbt));
        assert_eq!(&buf[..3], &[0x01, 0x05, 0x01]);
        assert_eq!(buf[3], quill_nbt::TAG_COMPOUND);
        assert_eq!(*buf.last().unwrap(), quill_nbt::TAG_END);
    }
}
