use crate::LiveConnection;
use quill_prompt::{ConnectionRegistry, PlayerConnection};
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::warn;
use uuid::Uuid;

/// Every player currently in play, by uuid.
#[derive(Default)]
pub struct ConnectionHub {
    connections: RwLock<HashMap<Uuid, Arc<LiveConnection>>>,
}

impl ConnectionHub {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Arc<LiveConnection>>> {
        self.connections.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Arc<LiveConnection>>> {
        self.connections.write().unwrap_or_else(|p| p.into_inner())
    }

    pub fn insert(&self, connection: Arc<LiveConnection>) {
        if let Some(old) = self.write().insert(connection.uuid(), connection) {
            warn!(player = %old.uuid(), "Replaced existing connection for {}", old.name());
        }
    }

    pub fn remove(&self, player: Uuid) -> Option<Arc<LiveConnection>> {
        self.write().remove(&player)
    }

    pub fn get(&self, player: Uuid) -> Option<Arc<LiveConnection>> {
        self.read().get(&player).cloned()
    }

    pub fn players(&self) -> Vec<Uuid> {
        self.read().keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl ConnectionRegistry for ConnectionHub {
    fn connection(&self, player: Uuid) -> Option<Arc<dyn PlayerConnection>> {
        self.get(player).map(|c| c as Arc<dyn PlayerConnection>)
    }
}
