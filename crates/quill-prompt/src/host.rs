//! What the engine needs from the server it runs inside.

use quill_protocol_core::{Pipeline, RawPacket};
use quill_types::{BlockPos, GameProfile};
use std::sync::Arc;
use uuid::Uuid;

/// One player's play-state connection.
pub trait PlayerConnection: Send + Sync {
    fn profile(&self) -> GameProfile;

    /// Block the player is standing in; the sign surface is placed in this
    /// column.
    fn block_position(&self) -> BlockPos;

    /// Allocate a container window id for this player.
    fn next_container_id(&self) -> i32;

    /// Queue a clientbound packet. Must not block.
    fn send(&self, packet: RawPacket) -> anyhow::Result<()>;

    fn pipeline(&self) -> &Pipeline;
}

/// Player to connection lookup.
pub trait ConnectionRegistry: Send + Sync {
    fn connection(&self, player: Uuid) -> Option<Arc<dyn PlayerConnection>>;
}

/// The simulation context.
pub trait Scheduler: Send + Sync {
    /// Run `task` on the simulation thread at the start of the next tick.
    /// Tasks run in submission order. Must not block.
    fn run_next_tick(&self, task: Box<dyn FnOnce() + Send>);
}
