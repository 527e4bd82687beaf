//! 1.9 through 1.12.2 (protocols 107 - 340).
//!
//! Clientbound ids held still across this range; serverbound ids were
//! reshuffled twice during 1.12.

use crate::common::{self, decode_item_name_channel, legacy_display, read_sign_lines};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use quill_protocol_core::*;
use std::ops::RangeInclusive;

pub struct V1_9Dialect;

const GENERATION: &str = "v1_9";

// Clientbound
const BLOCK_CHANGE: i32 = 0x0B;
const CLOSE_WINDOW: i32 = 0x12;
const OPEN_WINDOW: i32 = 0x13;
const SET_SLOT: i32 = 0x16;
const OPEN_SIGN_EDITOR: i32 = 0x2A;

const SIGN_STATE: i32 = 63 << 4;
const PAPER: i16 = 339;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ServerboundIds {
    click_window: i32,
    close_window: i32,
    plugin_message: i32,
    update_sign: i32,
}

fn serverbound_ids(protocol: i32) -> ServerboundIds {
    match protocol {
        // 1.12 added Prepare Crafting Grid ahead of these...
        335 => ServerboundIds {
            click_window: 0x08,
            close_window: 0x09,
            plugin_message: 0x0A,
            update_sign: 0x1C,
        },
        // ...and 1.12.1 moved it further down.
        338..=340 => ServerboundIds {
            click_window: 0x07,
            close_window: 0x08,
            plugin_message: 0x09,
            update_sign: 0x1C,
        },
        _ => ServerboundIds {
            click_window: 0x07,
            close_window: 0x08,
            plugin_message: 0x09,
            update_sign: 0x19,
        },
    }
}

fn item_id(item: SurfaceItem) -> i16 {
    match item {
        SurfaceItem::Paper => PAPER,
    }
}

impl ProtocolDialect for V1_9Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        107..=340
    }

    fn supports(&self, _kind: SurfaceKind) -> bool {
        true
    }

    fn encode_clientbound(&self, _protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
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
                match item {
                    Some(named) => write_legacy_slot(
                        &mut buf,
                        item_id(named.item),
                        1,
                        Some(&legacy_display(&named.display_name)),
                    ),
                    None => write_empty_slot(&mut buf, true),
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
        let ids = serverbound_ids(protocol);
        let mut data = packet.data.clone();
        let decoded = match packet.id {
            id if id == ids.click_window => PromptPacket::ClickContainer {
                window_id: read_u8(&mut data)? as i32,
                slot: read_i16(&mut data)?,
            },
            id if id == ids.close_window => PromptPacket::CloseContainerRequest {
                window_id: read_u8(&mut data)? as i32,
            },
            id if id == ids.update_sign => PromptPacket::UpdateSign {
                position: read_position(&mut data, PositionLayout::Legacy)?,
                front_text: true,
                lines: read_sign_lines(&mut data, false)?,
            },
            id if id == ids.plugin_message => return decode_item_name_channel(&mut data),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}
