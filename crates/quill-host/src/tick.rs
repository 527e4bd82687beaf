use crate::{ConnectionHub, InboundPacket};
use quill_prompt::{PromptEngine, Scheduler};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

type Task = Box<dyn FnOnce() + Send>;
type PacketHandler = Box<dyn FnMut(InboundPacket) + Send>;

/// Senders the network side uses to reach the tick loop.
#[derive(Clone)]
pub struct HostLinks {
    pub inbound: mpsc::UnboundedSender<InboundPacket>,
    pub disconnects: mpsc::UnboundedSender<Uuid>,
}

/// [`Scheduler`] backed by the tick loop's task queue. Never blocks.
#[derive(Clone)]
pub struct TickScheduler {
    tasks: mpsc::UnboundedSender<Task>,
}

impl Scheduler for TickScheduler {
    fn run_next_tick(&self, task: Box<dyn FnOnce() + Send>) {
        if self.tasks.send(task).is_err() {
            debug!("Tick loop stopped, dropping scheduled task");
        }
    }
}

/// What one tick did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickReport {
    pub tasks: usize,
    pub packets: usize,
    pub disconnects: usize,
}

/// The simulation context. Scheduled tasks, prompt callbacks included, only
/// ever run here.
pub struct TickLoop {
    tick_duration: Duration,
    hub: Arc<ConnectionHub>,
    tasks: mpsc::UnboundedReceiver<Task>,
    inbound: mpsc::UnboundedReceiver<InboundPacket>,
    disconnects: mpsc::UnboundedReceiver<Uuid>,
    handler: PacketHandler,
    tick_count: u64,
}

impl TickLoop {
    pub fn new(tick_duration: Duration, hub: Arc<ConnectionHub>) -> (Self, TickScheduler, HostLinks) {
        let (task_tx, task_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (disconnect_tx, disconnect_rx) = mpsc::unbounded_channel();
        let tick_loop = Self {
            tick_duration,
            hub,
            tasks: task_rx,
            inbound: inbound_rx,
            disconnects: disconnect_rx,
            handler: Box::new(|packet: InboundPacket| {
                trace!(player = %packet.player, "Unhandled packet 0x{:02X}", packet.packet.id);
            }),
            tick_count: 0,
        };
        let links = HostLinks {
            inbound: inbound_tx,
            disconnects: disconnect_tx,
        };
        (tick_loop, TickScheduler { tasks: task_tx }, links)
    }

    /// Application handler for packets that reach the dispatch stage.
    pub fn on_packet(&mut self, handler: impl FnMut(InboundPacket) + Send + 'static) {
        self.handler = Box::new(handler);
    }

    /// Run one tick: scheduled tasks in submission order, then dispatched
    /// packets, then disconnects.
    pub fn tick_once(&mut self, engine: &PromptEngine) -> TickReport {
        let mut report = TickReport::default();

        // 1. Tasks queued before this tick. Anything they schedule waits for the next one.
        let mut tasks = Vec::new();
        while let Ok(task) = self.tasks.try_recv() {
            tasks.push(task);
        }
        report.tasks = tasks.len();
        for task in tasks {
            task();
        }

        // 2. Dispatched packets
        while let Ok(packet) = self.inbound.try_recv() {
            report.packets += 1;
            (self.handler)(packet);
        }

        // 3. Disconnects
        while let Ok(player) = self.disconnects.try_recv() {
            report.disconnects += 1;
            let name = self.hub.remove(player).map(|c| c.name().to_string());
            let closed = engine.on_disconnect(player);
            info!(
                player = %player,
                prompts = closed,
                "{} disconnected",
                name.as_deref().unwrap_or("unknown player")
            );
        }

        self.tick_count += 1;
        report
    }

    /// Tick at a fixed rate until `shutdown` flips to true, then close every
    /// open prompt.
    pub async fn run(mut self, engine: PromptEngine, mut shutdown: watch::Receiver<bool>) {
        info!(
            "Tick loop started ({} TPS)",
            1000 / self.tick_duration.as_millis().max(1)
        );

        loop {
            if *shutdown.borrow() {
                break;
            }
            let tick_start = Instant::now();
            self.tick_once(&engine);

            let elapsed = tick_start.elapsed();
            if elapsed < self.tick_duration {
                tokio::select! {
                    _ = tokio::time::sleep(self.tick_duration - elapsed) => {}
                    changed = shutdown.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                }
            } else if self.tick_count % 100 == 0 {
                // Only warn occasionally to avoid log spam
                warn!(
                    "Tick {} took {:?} (over {:?} budget)",
                    self.tick_count, elapsed, self.tick_duration
                );
            }
        }

        let players: Vec<Uuid> = self.hub.players();
        let closed: usize = players.iter().map(|p| engine.close_player(*p)).sum();
        info!(prompts = closed, "Tick loop stopped");
    }
}
