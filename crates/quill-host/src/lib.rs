pub mod config;
pub mod connection;
pub mod hub;
pub mod logging;
pub mod tick;

pub use config::HostConfig;
pub use connection::{spawn_play, InboundPacket, LiveConnection};
pub use hub::ConnectionHub;
pub use logging::init_logging;
pub use tick::{HostLinks, TickLoop, TickReport, TickScheduler};
