use bytes::BytesMut;
use quill_types::{BlockPos, TextComponent};

/// A packet as it travels through a connection: id plus undecoded payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPacket {
    pub id: i32,
    pub data: BytesMut,
}

impl RawPacket {
    pub fn new(id: i32, data: BytesMut) -> Self {
        Self { id, data }
    }
}

/// The kind of client-side editor a surface opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    Anvil,
    Sign,
}

/// Blocks the prompt surfaces place or restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceBlock {
    Sign,
    Air,
}

/// Items placed into a fabricated container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceItem {
    Paper,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamedItem {
    pub item: SurfaceItem,
    pub display_name: TextComponent,
}

/// Version-independent view of every packet a prompt sends or inspects.
///
/// Dialects translate between this and the wire format of their generation.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptPacket {
    // Clientbound
    BlockUpdate {
        position: BlockPos,
        block: SurfaceBlock,
    },
    OpenSignEditor {
        position: BlockPos,
    },
    OpenAnvil {
        window_id: i32,
        title: TextComponent,
    },
    SetContainerSlot {
        window_id: i32,
        state_id: i32,
        slot: i16,
        item: Option<NamedItem>,
    },
    CloseContainer {
        window_id: i32,
    },

    // Serverbound
    ClickContainer {
        window_id: i32,
        slot: i16,
    },
    CloseContainerRequest {
        window_id: i32,
    },
    /// Anvil text edit. Arrives on the `MC|ItemName` plugin channel before
    /// 1.13 and as its own packet afterwards.
    RenameItem {
        name: String,
    },
    UpdateSign {
        position: BlockPos,
        front_text: bool,
        lines: [String; 4],
    },
}

impl PromptPacket {
    pub fn name(&self) -> &'static str {
        match self {
            PromptPacket::BlockUpdate { .. } => "BlockUpdate",
            PromptPacket::OpenSignEditor { .. } => "OpenSignEditor",
            PromptPacket::OpenAnvil { .. } => "OpenAnvil",
            PromptPacket::SetContainerSlot { .. } => "SetContainerSlot",
            PromptPacket::CloseContainer { .. } => "CloseContainer",
            PromptPacket::ClickContainer { .. } => "ClickContainer",
            PromptPacket::CloseContainerRequest { .. } => "CloseContainerRequest",
            PromptPacket::RenameItem { .. } => "RenameItem",
            PromptPacket::UpdateSign { .. } => "UpdateSign",
        }
    }
}
