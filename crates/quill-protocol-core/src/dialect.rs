use crate::{PromptPacket, RawPacket, SurfaceKind};
use anyhow::Result;
use std::ops::RangeInclusive;

/// Wire format of one protocol generation.
///
/// A dialect covers a contiguous range of protocol numbers; ids that move
/// inside the range are looked up per protocol number.
pub trait ProtocolDialect: Send + Sync {
    /// Short identifier such as `v1_13`.
    fn generation(&self) -> &'static str;

    /// Protocol numbers this dialect speaks.
    fn protocols(&self) -> RangeInclusive<i32>;

    /// Whether the generation can show the given editor at all.
    fn supports(&self, kind: SurfaceKind) -> bool;

    /// Encode a clientbound packet for `protocol`.
    fn encode_clientbound(&self, protocol: i32, packet: &PromptPacket) -> Result<RawPacket>;

    /// Decode a serverbound packet. Packets the prompt never looks at
    /// return `Ok(None)` without touching the payload.
    fn decode_serverbound(&self, protocol: i32, packet: &RawPacket) -> Result<Option<PromptPacket>>;

    fn speaks(&self, protocol: i32) -> bool {
        self.protocols().contains(&protocol)
    }
}
