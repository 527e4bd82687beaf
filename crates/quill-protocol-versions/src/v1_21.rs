//! 1.21.4 through 1.21.10 (protocols 769 - 773). Anvil prompts only.
//!
//! Text is NBT on the wire, window ids are VarInts and items carry data
//! components instead of a tag compound.

use crate::common;
use anyhow::Result;
use bytes::{BufMut, BytesMut};
use quill_nbt::NbtValue;
use quill_protocol_core::*;
use quill_types::TextComponent;
use std::ops::RangeInclusive;

pub struct V1_21Dialect;

const GENERATION: &str = "v1_21";

// Clientbound ids that held still across the range
const CLOSE_CONTAINER: i32 = 0x11;
const SET_CONTAINER_SLOT: i32 = 0x14;

const ANVIL_MENU: i32 = 8;
const PAPER: i32 = 980;
/// `minecraft:custom_name` data component.
const CUSTOM_NAME_COMPONENT: i32 = 5;

#[derive(Debug, Clone, Copy)]
struct PacketIds {
    open_screen: i32,
    click_container: i32,
    close_container: i32,
    rename_item: i32,
}

fn packet_ids(protocol: i32) -> PacketIds {
    match protocol {
        769 => PacketIds {
            open_screen: 0x35,
            click_container: 0x10,
            close_container: 0x11,
            rename_item: 0x2E,
        },
        770 => PacketIds {
            open_screen: 0x34,
            click_container: 0x10,
            close_container: 0x11,
            rename_item: 0x2E,
        },
        771 | 772 => PacketIds {
            open_screen: 0x34,
            click_container: 0x11,
            close_container: 0x12,
            rename_item: 0x2F,
        },
        _ => PacketIds {
            open_screen: 0x39,
            click_container: 0x11,
            close_container: 0x12,
            rename_item: 0x2F,
        },
    }
}

fn item_id(item: SurfaceItem) -> i32 {
    match item {
        SurfaceItem::Paper => PAPER,
    }
}

/// Text component as an NBT compound.
fn text_nbt(text: &TextComponent) -> NbtValue {
    let mut entries = vec![("text".to_string(), NbtValue::String(text.text.clone()))];
    if let Some(italic) = text.italic {
        entries.push(("italic".to_string(), NbtValue::Byte(italic as i8)));
    }
    if !text.extra.is_empty() {
        entries.push((
            "extra".to_string(),
            NbtValue::List(text.extra.iter().map(text_nbt).collect()),
        ));
    }
    NbtValue::Compound(entries)
}

/// A one-count stack whose only added component is a custom name.
fn write_named_slot(buf: &mut BytesMut, item: &NamedItem) {
    write_varint(buf, 1); // count
    write_varint(buf, item_id(item.item));
    write_varint(buf, 1); // components added
    write_varint(buf, 0); // components removed
    write_varint(buf, CUSTOM_NAME_COMPONENT);
    text_nbt(&item.display_name).write_root_network(buf);
}

impl ProtocolDialect for V1_21Dialect {
    fn generation(&self) -> &'static str {
        GENERATION
    }

    fn protocols(&self) -> RangeInclusive<i32> {
        769..=773
    }

    fn supports(&self, kind: SurfaceKind) -> bool {
        kind == SurfaceKind::Anvil
    }

    fn encode_clientbound(&self, protocol: i32, packet: &PromptPacket) -> Result<RawPacket> {
        let mut buf = BytesMut::new();
        let id = match packet {
            PromptPacket::OpenAnvil { window_id, title } => {
                write_varint(&mut buf, *window_id);
                write_varint(&mut buf, ANVIL_MENU);
                text_nbt(title).write_root_network(&mut buf);
                packet_ids(protocol).open_screen
            }
            PromptPacket::SetContainerSlot {
                window_id,
                state_id,
                slot,
                item,
            } => {
                write_varint(&mut buf, *window_id);
                write_varint(&mut buf, *state_id);
                buf.put_i16(*slot);
                match item {
                    Some(named) => write_named_slot(&mut buf, named),
                    None => write_varint(&mut buf, 0),
                }
                SET_CONTAINER_SLOT
            }
            PromptPacket::CloseContainer { window_id } => {
                write_varint(&mut buf, *window_id);
                CLOSE_CONTAINER
            }
            PromptPacket::BlockUpdate { .. } | PromptPacket::OpenSignEditor { .. } => {
                return Err(common::no_such_surface(GENERATION, packet))
            }
            other => return Err(common::serverbound_only(GENERATION, other)),
        };
        Ok(RawPacket::new(id, buf))
    }

    fn decode_serverbound(&self, protocol: i32, packet: &RawPacket) -> Result<Option<PromptPacket>> {
        let ids = packet_ids(protocol);
        let mut data = packet.data.clone();
        let decoded = match packet.id {
            id if id == ids.click_container => {
                let window_id = read_varint(&mut data)?;
                read_varint(&mut data)?; // state id
                PromptPacket::ClickContainer {
                    window_id,
                    slot: read_i16(&mut data)?,
                }
            }
            id if id == ids.close_container => PromptPacket::CloseContainerRequest {
                window_id: read_varint(&mut data)?,
            },
            id if id == ids.rename_item => PromptPacket::RenameItem {
                name: read_string(&mut data, 32767)?,
            },
            _ => return Ok(None),
        };
        Ok(Some(decoded))
    }
}
