use crate::RawPacket;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use uuid::Uuid;

/// A stage of the inbound pipeline. Stages observe packets; every packet
/// reaches every stage in order.
pub trait InboundFilter: Send + Sync {
    fn inspect(&self, packet: &RawPacket);

    /// Identity of whoever installed this stage, if it is a temporary one.
    fn owner(&self) -> Option<Uuid> {
        None
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("no pipeline stage named {0:?}")]
    MissingAnchor(String),
    #[error("pipeline stage {0:?} already exists")]
    DuplicateName(String),
}

struct Stage {
    name: String,
    filter: Arc<dyn InboundFilter>,
}

/// Ordered, named inbound stages of one connection.
///
/// Stages are snapshotted before a packet runs through them, so a stage may
/// add or remove stages (including itself) while inspecting.
#[derive(Default)]
pub struct Pipeline {
    stages: RwLock<Vec<Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_last(&self, name: &str, filter: Arc<dyn InboundFilter>) -> Result<(), PipelineError> {
        let mut stages = self.write();
        if stages.iter().any(|s| s.name == name) {
            return Err(PipelineError::DuplicateName(name.to_string()));
        }
        stages.push(Stage {
            name: name.to_string(),
            filter,
        });
        Ok(())
    }

    pub fn add_before(
        &self,
        anchor: &str,
        name: &str,
        filter: Arc<dyn InboundFilter>,
    ) -> Result<(), PipelineError> {
        let mut stages = self.write();
        if stages.iter().any(|s| s.name == name) {
            return Err(PipelineError::DuplicateName(name.to_string()));
        }
        let index = stages
            .iter()
            .position(|s| s.name == anchor)
            .ok_or_else(|| PipelineError::MissingAnchor(anchor.to_string()))?;
        stages.insert(
            index,
            Stage {
                name: name.to_string(),
                filter,
            },
        );
        Ok(())
    }

    /// Remove the stage called `name` if `predicate` accepts it. Returns
    /// whether a stage was removed.
    pub fn remove_if(&self, name: &str, predicate: impl Fn(&dyn InboundFilter) -> bool) -> bool {
        let mut stages = self.write();
        match stages.iter().position(|s| s.name == name) {
            Some(index) if predicate(stages[index].filter.as_ref()) => {
                stages.remove(index);
                true
            }
            _ => false,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.read().iter().any(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.read().iter().map(|s| s.name.clone()).collect()
    }

    pub fn process(&self, packet: &RawPacket) {
        let snapshot: Vec<Arc<dyn InboundFilter>> =
            self.read().iter().map(|s| Arc::clone(&s.filter)).collect();
        for filter in snapshot {
            filter.inspect(packet);
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Vec<Stage>> {
        self.stages.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Vec<Stage>> {
        self.stages.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
