//! 1.17 through 1.18.2 (protocols 755 - 758).

use crate::common::{self, json_display, read_sign_lines};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use quill_protocol_core::*;
use std::ops::RangeInclusive;

pub struct V1_17Dialect;

const GENERATION: &str = "v1_17";

// Clientbound
const BLOCK_CHANGE: i32 = 0x0C;
const CLOSE_WINDOW: i32 = 0x13;
const SET_SLOT: i32 = 0x16;
const OPEN_SCREEN: i32 = 0x2E;
const OPEN_SIGN_EDITOR: i32 = 0x2F;

// Serverbound
const CLICK_WINDOW: i32 = 0x08;
const CLOSE_WINDOW_SB: i32 = 0x09;
const NAME_ITEM: i32 = 0x20;
const UPDATE_SIGN: i32 = 0x2B;

const ANVIL_MENU: i32 = 7;
/// `minecraft:oak_sign[rotation=0,waterlogged=false]`
const SIGN_STATE: i32 = 3439;
const PAPER: i32 = 784;

/// 1.17.1 added the container state id to Set Slot and Click Window.
const STATE_ID_SINCE: i32 = 756;

fn item_id(item: SurfaceItem) -> i32 {
    match item {
        SurfaceItem::Paper => PAPER,
    }
}

impl ProtocolDialect for V1_17Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        755..=758
    }

    fn supports(&self, _kind: SurfaceKind) -> bool {
        true
    }

    fn encode_clientbound(&self, protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
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
                state_id,
                slot,
                item,
            } => {
                buf.put_i8(*window_id as i8);
                if protocol >= STATE_ID_SINCE {
                    write_varint(&mut buf, *state_id);
                }
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

    fn decode_serverbound(&self, protocol: i32, packet: &RawPacket) -> Result<Option<PromptPacket>> {
        let mut data = packet.data.clone();
        let decoded = match packet.id {
            CLICK_WINDOW => {
                let window_id = read_u8(&mut data)? as i32;
                if protocol >= STATE_ID_SINCE {
                    read_varint(&mut data)?;
                }
                PromptPacket::ClickContainer {
                    window_id,
                    slot: read_i16(&mut data)?,
                }
            }
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
