//! 1.14 through 1.14.4 (protocols 477 - 498).
//!
//! First generation with the `x | z | y` position packing and registry-typed
//! Open Screen.

use crate::common::{self, json_display, read_sign_lines};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use quill_protocol_core::*;
use std::ops::RangeInclusive;

pub struct V1_14Dialect;

const GENERATION: &str = "v1_14";

// Clientbound
const BLOCK_CHANGE: i32 = 0x0B;
const CLOSE_WINDOW: i32 = 0x13;
const SET_SLOT: i32 = 0x16;
const OPEN_SCREEN: i32 = 0x2E;
const OPEN_SIGN_EDITOR: i32 = 0x2F;

// Serverbound
const CLICK_WINDOW: i32 = 0x09;
const CLOSE_WINDOW_SB: i32 = 0x0A;
const NAME_ITEM: i32 = 0x1E;
const UPDATE_SIGN: i32 = 0x29;

const ANVIL_MENU: i32 = 7;
/// `minecraft:oak_sign[rotation=0,waterlogged=false]`
const SIGN_STATE: i32 = 3382;
const PAPER: i32 = 665;

fn item_id(item: SurfaceItem) -> i32 {
    match item {
        SurfaceItem::Paper => PAPER,
    }
}

impl ProtocolDialect for V1_14Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        477..=498
    }

    fn supports(&self, _kind: SurfaceKind) -> bool {
        true
    }

    fn encode_clientbound(&self, _protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
        let mut buf = BytesMut::new();
        let id = match packet {
            PromptPacket::BlockUpdate { position, block } => {
                write_position(&mut buf, position, PositionLayout::Modern);
                let state = match block {
                    SurfaceBlock::Sign => SIGN_STATE,
                    SurfaceBlock::Air => 0,
                };
                write_varint(&mut buf, state);
                BLOCK_CHANGE
            }
            PromptPacket::OpenSignEditor { position } => {
                write_position(&mut buf, position, PositionLayout::Modern);
                OPEN_SIGN_EDITOR
            }
            PromptPacket::OpenAnvil { window_id, title } => {
                write_varint(&mut buf, *window_id);
                write_varint(&mut buf, ANVIL_MENU);
                write_string(&mut buf, &title.to_json());
                OPEN_SCREEN
            }
            PromptPacket::SetContainerSlot {
                window_id,
                slot,
                item,
                ..
            } => {
                buf.put_i8(*window_id as i8);
                buf.put_i16(*slot);
                match item {
                    Some(named) => write_flattened_slot(
                        &mut buf,
                        item_id(named.item),
                        1,
                        Some(&json_display(&named.display_name)),
                    ),
                    None => write_empty_slot(&mut buf, false),
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
                position: read_position(&mut data, PositionLayout::Modern)?,
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

    #[test]
    fn test_open_screen_uses_menu_type() {
        let raw = V1_14Dialect
            .encode_clientbound(
                498,
                &PromptPacket::OpenAnvil {
                    window_id: 9,
                    title: TextComponent::plain("Repair & Name"),
                },
            )
            .unwrap();
        assert_eq!(raw.id, OPEN_SCREEN);
        let mut data = raw.data;
        assert_eq!(read_varint(&mut data).unwrap(), 9);
        assert_eq!(read_varint(&mut data).unwrap(), ANVIL_MENU);
        assert_eq!(read_string(&mut data, 256).unwrap(), r#"{"text":"Repair & Name"}"#);
        assert!(data.is_empty());
    }

    #[test]
    fn test_sign_uses_modern_position() {
        let pos = BlockPos::new(12, 0, 34);
        let raw = V1_14Dialect
            .encode_clientbound(477, &PromptPacket::OpenSignEditor { position: pos })
            .unwrap();
        assert_eq!(raw.data.to_vec(), pos.encode().to_be_bytes().to_vec());

        let update = sign_update(UPDATE_SIGN, pos, PositionLayout::Modern, ["", "", "", "x"]);
        match V1_14Dialect.decode_serverbound(477, &update).unwrap() {
            Some(PromptPacket::UpdateSign { position, .. }) => assert_eq!(position, pos),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_close_request() {
        let raw = RawPacket::new(CLOSE_WINDOW_SB, BytesMut::from(&[5u8][..]));
        assert_eq!(
            V1_14Dialect.decode_serverbound(480, &raw).unwrap(),
            Some(PromptPacket::CloseContainerRequest { window_id: 5 })
        );
    }

    #[test]
    fn test_truncated_click_is_an_error() {
        let raw = RawPacket::new(CLICK_WINDOW, BytesMut::from(&[5u8][..]));
        assert!(V1_14Dialect.decode_serverbound(480, &raw).is_err());
    }
}
