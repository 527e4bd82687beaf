use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A block position in the world (x, y, z integers).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Encode as a 64-bit long (1.14+ layout).
    /// x: 26 bits, z: 26 bits, y: 12 bits
    pub fn encode(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.z as u64 & 0x3FFFFFF) << 12)
            | (self.y as u64 & 0xFFF)
    }

    pub fn decode(val: u64) -> Self {
        Self {
            x: sign_extend((val >> 38) as i32, 26),
            y: sign_extend((val & 0xFFF) as i32, 12),
            z: sign_extend(((val >> 12) & 0x3FFFFFF) as i32, 26),
        }
    }

    /// Encode with the pre-1.14 layout: x: 26 bits, y: 12 bits, z: 26 bits.
    pub fn encode_legacy(&self) -> u64 {
        ((self.x as u64 & 0x3FFFFFF) << 38)
            | ((self.y as u64 & 0xFFF) << 26)
            | (self.z as u64 & 0x3FFFFFF)
    }

    pub fn decode_legacy(val: u64) -> Self {
        Self {
            x: sign_extend((val >> 38) as i32, 26),
            y: sign_extend(((val >> 26) & 0xFFF) as i32, 12),
            z: sign_extend((val & 0x3FFFFFF) as i32, 26),
        }
    }

    pub fn with_y(self, y: i32) -> Self {
        Self { y, ..self }
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

fn sign_extend(value: i32, bits: u32) -> i32 {
    if value >= 1 << (bits - 1) {
        value - (1 << bits)
    } else {
        value
    }
}

/// A player's game profile as seen by the prompt engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameProfile {
    pub uuid: Uuid,
    pub name: String,
}

impl GameProfile {
    pub fn new(uuid: Uuid, name: impl Into<String>) -> Self {
        Self {
            uuid,
            name: name.into(),
        }
    }
}
