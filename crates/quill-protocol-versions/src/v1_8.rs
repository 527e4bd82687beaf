//! 1.8.x (protocol 47).

use crate::common::{self, decode_item_name_channel, legacy_display, read_sign_lines};
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use quill_protocol_core::*;
use std::ops::RangeInclusive;

pub struct V1_8Dialect;

const GENERATION: &str = "v1_8";

// Clientbound
const BLOCK_CHANGE: i32 = 0x23;
const OPEN_WINDOW: i32 = 0x2D;
const CLOSE_WINDOW: i32 = 0x2E;
const SET_SLOT: i32 = 0x2F;
const OPEN_SIGN_EDITOR: i32 = 0x36;

// Serverbound
const CLOSE_WINDOW_SB: i32 = 0x0D;
const CLICK_WINDOW: i32 = 0x0E;
const UPDATE_SIGN: i32 = 0x12;
const PLUGIN_MESSAGE: i32 = 0x17;

/// Block id 63 (standing sign) with meta 0, as `id << 4 | meta`.
const SIGN_STATE: i32 = 63 << 4;
const PAPER: i16 = 339;

fn item_id(item: SurfaceItem) -> i16 {
    match item {
        SurfaceItem::Paper => PAPER,
    }
}

impl ProtocolDialect for V1_8Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        47..=47
    }

    fn supports(&self, _kind: SurfaceKind) -> bool {
        true
    }

    fn encode_clientbound(&self, _protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
        let mut buf = BytesMut::new();
        let id = match packet {
            PromptPacket::BlockUpdate { position, block } => {
                write_position(&mut buf, position, PositionLayout::Legacy);
                write_varint(
                    &mut buf,
                    match block {
                        SurfaceBlock::Sign => SIGN_STATE,
                        SurfaceBlock::Air => 0,
                    },
                );
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
                buf.put_u8(0); // slot count, ignored for anvils
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
            UPDATE_SIGN => PromptPacket::UpdateSign {
                position: read_position(&mut data, PositionLayout::Legacy)?,
                front_text: true,
                lines: read_sign_lines(&mut data, true)?,
            },
            PLUGIN_MESSAGE => return decode_item_name_channel(&mut data),
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}
