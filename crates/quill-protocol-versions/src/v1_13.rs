//! 1.13 through 1.13.2 (protocols 393 - 404).

use crate::common::{self, json_display, read_sign_lines};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use quill_nbt::NbtValue;
use quill_protocol_core::*;
use std::ops::RangeInclusive;

pub struct V1_13Dialect;

const GENERATION: &str = "v1_13";

// Clientbound
const BLOCK_CHANGE: i32 = 0x0B;
const CLOSE_WINDOW: i32 = 0x13;
const OPEN_WINDOW: i32 = 0x14;
const SET_SLOT: i32 = 0x17;
const OPEN_SIGN_EDITOR: i32 = 0x2C;

// Serverbound
const CLICK_WINDOW: i32 = 0x08;
const CLOSE_WINDOW_SB: i32 = 0x09;
const NAME_ITEM: i32 = 0x1C;
const UPDATE_SIGN: i32 = 0x26;

/// `minecraft:sign[rotation=0,waterlogged=false]`
const SIGN_STATE: i32 = 3077;
const PAPER: i32 = 586;

/// 1.13.2 switched slots to the present-flag layout.
const PRESENT_FLAG_SLOTS: i32 = 404;

fn item_id(item: SurfaceItem) -> i32 {
    match item {
        SurfaceItem::Paper => PAPER,
    }
}

/// 1.13 and 1.13.1 slots: i16 id (-1 for empty), i8 count, NBT. No damage field.
fn write_short_id_slot(buf: &mut BytesMut, item_id: i16, nbt: &NbtValue) {
    buf.put_i16(item_id);
    buf.put_i8(1);
    nbt.write_root_named("", buf);
}

impl ProtocolDialect for V1_13Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        393..=404
    }

    fn supports(&self, _kind: SurfaceKind) -> bool {
        true
    }

    fn encode_clientbound(&self, protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
        let mut buf = BytesMut::new();
        let id = match packet {
            PromptPacket::BlockUpdate { position, block } => {
                write_position(&mut buf, position, PositionLayout::Legacy);
                let state = match block {
                    SurfaceBlock::Sign => SIGN_STATE,
                    SurfaceBlock::Air => 0,
                };
                write_varint(&mut buf, state);
                BLOCK_CHANGE
            }
            PromptPacket::OpenSignEditor { position } => {
                write_position(&mut buf, position, PositionLayout::Legacy);
                OPEN_SIGN_EDITOR
            }
            PromptPacket::OpenAnvil { window_id, title } => {
                buf.put_u8(*window_id as u8);
                write_string(&mut buf, "minecraft:anvil");
                write_string(&mut buf, &title.to_json());
                buf.put_u8(0);
                OPEN_WINDOW
            }
            PromptPacket::SetContainerSlot {
                window_id,
                slot,
                item,
                ..
            } => {
                buf.put_i8(*window_id as i8);
                buf.put_i16(*slot);
                let legacy = protocol < PRESENT_FLAG_SLOTS;
                match item {
                    Some(named) => {
                        let nbt = json_display(&named.display_name);
                        if legacy {
                            write_short_id_slot(&mut buf, item_id(named.item) as i16, &nbt);
                        } else {
                            write_flattened_slot(&mut buf, item_id(named.item), 1, Some(&nbt));
                        }
                    }
                    None => write_empty_slot(&mut buf, legacy),
                }
                SET_SLOT
            }
            PromptPacket::CloseContainer { window_id } => {
                buf.put_u8(*window_id as u8);
                CLOSE_WINDOW
            }
            other => return Err(common::serverbound_only(GENERATION, other)),
        };
        Ok(RawPacket::new(id, buf))
    }

    fn decode_serverbound(&self, _protocol: i32, packet: &RawPacket) -> Result<Option<PromptPacket>> {
        let mut data = packet.data.clone();
        let decoded = match packet.id {
            CLICK_WINDOW => PromptPacket::ClickContainer {
                window_id: read_u8(&mut data)? as i32,
                slot: read_i16(&mut data)?,
            },
            CLOSE_WINDOW_SB => PromptPacket::CloseContainerRequest {
                window_id: read_u8(&mut data)? as i32,
            },
            NAME_ITEM => PromptPacket::RenameItem {
                name: read_string(&mut data, 32767)?,
            },
            UPDATE_SIGN => PromptPacket::UpdateSign {
                position: read_position(&mut data, PositionLayout::Legacy)?,
                front_text: true,
                lines: read_sign_lines(&mut data, false)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::*;
    use quill_types::{BlockPos, TextComponent};

    fn set_paper(protocol: i32) -> BytesMut {
        V1_13Dialect
            .encode_clientbound(
                protocol,
                &PromptPacket::SetContainerSlot {
                    window_id: 2,
                    state_id: 0,
                    slot: 0,
                    item: Some(NamedItem {
                        item: SurfaceItem::Paper,
                        display_name: TextComponent::item_name("Sword"),
                    }),
                },
            )
            .unwrap()
            .data
    }

    #[test]
    fn test_slot_layout_changes_in_1_13_2() {
        let old = set_paper(393);
        // window, slot, then i16 item id
        assert_eq!(&old[..5], &[2, 0, 0, 0x02, 0x4A]);

        let new = set_paper(404);
        // window, slot, present flag, varint item id
        assert_eq!(&new[..6], &[2, 0, 0, 1, 0xCA, 0x04]);
    }

    #[test]
    fn test_display_name_is_json() {
        let data = set_paper(404);
        let json = br#"{"text":"Sword","italic":false}"#;
        assert!(data.windows(json.len()).any(|w| w == json));
    }

    #[test]
    fn test_name_item_packet() {
        let mut data = BytesMut::new();
        write_string(&mut data, "Flaming Sword");
        assert_eq!(
            V1_13Dialect.decode_serverbound(404, &RawPacket::new(NAME_ITEM, data)).unwrap(),
            Some(PromptPacket::RenameItem { name: "Flaming Sword".into() })
        );
    }

    #[test]
    fn test_update_sign_legacy_position() {
        let pos = BlockPos::new(100, 0, -100);
        let raw = sign_update(UPDATE_SIGN, pos, PositionLayout::Legacy, ["1", "2", "3", "4"]);
        match V1_13Dialect.decode_serverbound(404, &raw).unwrap() {
            Some(PromptPacket::UpdateSign { position, lines, .. }) => {
                assert_eq!(position, pos);
                assert_eq!(lines.concat(), "1234");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
