//! 1.19 through 1.19.4 (protocols 759 - 762). Sign prompts only.

use crate::common::{self, read_sign_lines};
use anyhow::Result;
use bytes::BytesMut;
use quill_protocol_core::*;
use std::ops::RangeInclusive;

pub struct V1_19Dialect;

const GENERATION: &str = "v1_19";

/// `minecraft:oak_sign[rotation=0,waterlogged=false]`
const SIGN_STATE: i32 = 3640;

#[derive(Debug, Clone, Copy)]
struct PacketIds {
    block_update: i32,
    open_sign_editor: i32,
    update_sign: i32,
}

/// Chat signing reshuffled the play ids on nearly every 1.19 release.
fn packet_ids(protocol: i32) -> PacketIds {
    match protocol {
        759 => PacketIds {
            block_update: 0x09,
            open_sign_editor: 0x2E,
            update_sign: 0x2D,
        },
        760 => PacketIds {
            block_update: 0x09,
            open_sign_editor: 0x2F,
            update_sign: 0x2E,
        },
        761 => PacketIds {
            block_update: 0x09,
            open_sign_editor: 0x2D,
            update_sign: 0x2E,
        },
        _ => PacketIds {
            block_update: 0x0A,
            open_sign_editor: 0x31,
            update_sign: 0x2E,
        },
    }
}

impl ProtocolDialect for V1_19Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        759..=762
    }

    fn supports(&self, kind: SurfaceKind) -> bool {
        kind == SurfaceKind::Sign
    }

    fn encode_clientbound(&self, protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
        let ids = packet_ids(protocol);
        let mut buf = BytesMut::new();
        let id = match packet {
            PromptPacket::BlockUpdate { position, block } => {
                write_position(&mut buf, position, PositionLayout::Modern);
                let state = match block {
                    SurfaceBlock::Sign => SIGN_STATE,
                    SurfaceBlock::Air => 0,
                };
                write_varint(&mut buf, state);
                ids.block_update
            }
            PromptPacket::OpenSignEditor { position } => {
                write_position(&mut buf, position, PositionLayout::Modern);
                ids.open_sign_editor
            }
            PromptPacket::OpenAnvil { .. }
            | PromptPacket::SetContainerSlot { .. }
            | PromptPacket::CloseContainer { .. } => {
                return Err(common::no_such_surface(GENERATION, packet))
            }
            other => return Err(common::serverbound_only(GENERATION, other)),
        };
        Ok(RawPacket::new(id, buf))
    }

    fn decode_serverbound(&self, protocol: i32, packet: &RawPacket) -> Result<Option<PromptPacket>> {
        if packet.id != packet_ids(protocol).update_sign {
            return Ok(None);
        }
        let mut data = packet.data.clone();
        Ok(Some(PromptPacket::UpdateSign {
            position: read_position(&mut data, PositionLayout::Modern)?,
            front_text: true,
            lines: read_sign_lines(&mut data, false)?,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::*;
    use quill_types::{BlockPos, TextComponent};

    #[test]
    fn test_sign_editor_id_per_protocol() {
        let packet = PromptPacket::OpenSignEditor {
            position: BlockPos::new(0, 0, 0),
        };
        let ids: Vec<i32> = (759..=762)
            .map(|p| V1_19Dialect.encode_clientbound(p, &packet).unwrap().id)
            .collect();
        assert_eq!(ids, vec![0x2E, 0x2F, 0x2D, 0x31]);
    }

    #[test]
    fn test_update_sign_per_protocol() {
        let pos = BlockPos::new(7, 0, 7);
        let raw = sign_update(0x2D, pos, PositionLayout::Modern, ["a", "b", "c", "d"]);
        assert!(V1_19Dialect.decode_serverbound(759, &raw).unwrap().is_some());
        assert!(V1_19Dialect.decode_serverbound(762, &raw).unwrap().is_none());
    }

    #[test]
    fn test_no_anvil() {
        assert!(!V1_19Dialect.supports(SurfaceKind::Anvil));
        let packet = PromptPacket::OpenAnvil {
            window_id: 1,
            title: TextComponent::plain("x"),
        };
        assert!(V1_19Dialect.encode_clientbound(760, &packet).is_err());
    }
}
