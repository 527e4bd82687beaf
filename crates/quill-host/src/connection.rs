use crate::config::HostConfig;
use crate::tick::HostLinks;
use anyhow::Result;
use quill_prompt::PlayerConnection;
use quill_protocol_core::{Connection, InboundFilter, Pipeline, RawPacket};
use quill_types::{BlockPos, GameProfile};
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, RwLock};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};
use uuid::Uuid;

/// Container ids cycle through 1..=100 like the vanilla counter; 0 is the
/// player inventory.
const MAX_CONTAINER_ID: i32 = 100;

/// A packet that made it through the pipeline to the dispatch stage.
#[derive(Debug, Clone)]
pub struct InboundPacket {
    pub player: Uuid,
    pub packet: RawPacket,
}

/// Last pipeline stage: hands packets to the tick loop.
struct DispatchStage {
    player: Uuid,
    inbound: mpsc::UnboundedSender<InboundPacket>,
}

impl InboundFilter for DispatchStage {
    fn inspect(&self, packet: &RawPacket) {
        let forwarded = InboundPacket {
            player: self.player,
            packet: packet.clone(),
        };
        if self.inbound.send(forwarded).is_err() {
            trace!(player = %self.player, "Tick loop gone, dropping packet 0x{:02X}", packet.id);
        }
    }
}

/// A player's play-state connection as seen by the simulation.
pub struct LiveConnection {
    profile: GameProfile,
    position: RwLock<BlockPos>,
    container_counter: AtomicI32,
    outbound: mpsc::UnboundedSender<RawPacket>,
    pipeline: Pipeline,
}

impl LiveConnection {
    /// Starts at the vanilla default spawn, `(0, 64, 0)`.
    pub fn new(
        profile: GameProfile,
        outbound: mpsc::UnboundedSender<RawPacket>,
        dispatch_stage: &str,
        inbound: mpsc::UnboundedSender<InboundPacket>,
    ) -> Result<Self> {
        let pipeline = Pipeline::new();
        pipeline.add_last(
            dispatch_stage,
            Arc::new(DispatchStage {
                player: profile.uuid,
                inbound,
            }),
        )?;
        Ok(Self {
            profile,
            position: RwLock::new(BlockPos::new(0, 64, 0)),
            container_counter: AtomicI32::new(0),
            outbound,
            pipeline,
        })
    }

    pub fn uuid(&self) -> Uuid {
        self.profile.uuid
    }

    pub fn name(&self) -> &str {
        &self.profile.name
    }

    /// Movement is not decoded here; whoever tracks it keeps this current.
    pub fn set_position(&self, position: BlockPos) {
        *self.position.write().unwrap_or_else(|p| p.into_inner()) = position;
    }
}

impl PlayerConnection for LiveConnection {
    fn profile(&self) -> GameProfile {
        self.profile.clone()
    }

    fn block_position(&self) -> BlockPos {
        *self.position.read().unwrap_or_else(|p| p.into_inner())
    }

    fn next_container_id(&self) -> i32 {
        let previous = self
            .container_counter
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |id| Some(id % MAX_CONTAINER_ID + 1))
            .unwrap_or_else(|id| id);
        previous % MAX_CONTAINER_ID + 1
    }

    fn send(&self, packet: RawPacket) -> Result<()> {
        self.outbound
            .send(packet)
            .map_err(|_| anyhow::anyhow!("connection to {} is closed", self.profile.name))
    }

    fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

/// Sends the player's uuid on the disconnect channel when dropped, so the
/// tick loop hears about the hangup however the reader task ends.
struct DisconnectNotice {
    player: Uuid,
    disconnects: mpsc::UnboundedSender<Uuid>,
}

impl Drop for DisconnectNotice {
    fn drop(&mut self) {
        let _ = self.disconnects.send(self.player);
    }
}

/// Split `stream` into a reader task that runs every packet through the
/// connection's pipeline and a writer task that drains the outbound queue.
/// When the reader stops, the player's uuid is sent on `links.disconnects`.
pub fn spawn_play(
    stream: TcpStream,
    profile: GameProfile,
    config: &HostConfig,
    links: HostLinks,
) -> Result<Arc<LiveConnection>> {
    let peer = stream.peer_addr()?;
    let mut conn = Connection::new(stream);
    if let Some(threshold) = config.compression_threshold {
        conn.enable_compression(threshold);
    }

    // Channel: simulation -> writer task
    let (out_tx, mut out_rx) = mpsc::unbounded_channel::<RawPacket>();
    let live = Arc::new(LiveConnection::new(
        profile,
        out_tx,
        &config.prompt.dispatch_stage,
        links.inbound.clone(),
    )?);
    live.set_position(config.spawn);
    info!(player = %live.uuid(), "{} ({}) entered play", live.name(), peer);

    let (mut reader, mut writer) = conn.into_split();

    let writer_name = live.name().to_string();
    let writer_handle = tokio::spawn(async move {
        while let Some(packet) = out_rx.recv().await {
            if let Err(e) = writer.write_packet(&packet).await {
                debug!("Writer error for {}: {}", writer_name, e);
                break;
            }
        }
    });

    let reader_live = Arc::clone(&live);
    let notice = DisconnectNotice {
        player: live.uuid(),
        disconnects: links.disconnects,
    };
    tokio::spawn(async move {
        let _notice = notice;
        loop {
            match reader.read_packet().await {
                Ok(packet) => reader_live.pipeline.process(&packet),
                Err(e) => {
                    debug!("Reader error for {}: {}", reader_live.name(), e);
                    break;
                }
            }
        }
        // Reader finished = client disconnected.
        writer_handle.abort();
    });

    Ok(live)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;
    use quill_protocol_core::{decode_frame, encode_frame};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::time::timeout;

    const WAIT: Duration = Duration::from_secs(5);

    async fn loopback() -> (TcpStream, TcpStream) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        (client, server)
    }

    async fn read_frame(client: &mut TcpStream, buf: &mut BytesMut, threshold: Option<i32>) -> RawPacket {
        loop {
            if let Some(packet) = decode_frame(buf, threshold).unwrap() {
                return packet;
            }
            let mut tmp = [0u8; 1024];
            let n = timeout(WAIT, client.read(&mut tmp)).await.unwrap().unwrap();
            assert!(n > 0, "server hung up");
            buf.extend_from_slice(&tmp[..n]);
        }
    }

    fn config(compression_threshold: Option<i32>) -> HostConfig {
        HostConfig {
            compression_threshold,
            ..HostConfig::default()
        }
    }

    fn links() -> (
        HostLinks,
        mpsc::UnboundedReceiver<InboundPacket>,
        mpsc::UnboundedReceiver<Uuid>,
    ) {
        let (inbound, inbound_rx) = mpsc::unbounded_channel();
        let (disconnects, disconnects_rx) = mpsc::unbounded_channel();
        (HostLinks { inbound, disconnects }, inbound_rx, disconnects_rx)
    }

    #[tokio::test]
    async fn test_client_packet_reaches_dispatch() {
        let (mut client, server) = loopback().await;
        let (links, mut inbound_rx, _disconnects_rx) = links();
        let profile = GameProfile::new(Uuid::new_v4(), "Alex");
        let live = spawn_play(server, profile.clone(), &config(None), links).unwrap();
        assert_eq!(live.pipeline().names(), vec!["packet_handler"]);

        let packet = RawPacket::new(0x1C, BytesMut::from(&b"\x05Hello"[..]));
        client.write_all(&encode_frame(&packet, None).unwrap()).await.unwrap();

        let received = timeout(WAIT, inbound_rx.recv()).await.unwrap().unwrap();
        assert_eq!(received.player, profile.uuid);
        assert_eq!(received.packet, packet);
    }

    #[tokio::test]
    async fn test_send_reaches_client_compressed() {
        let (mut client, server) = loopback().await;
        let (links, _inbound_rx, _disconnects_rx) = links();
        let live = spawn_play(server, GameProfile::new(Uuid::new_v4(), "Alex"), &config(Some(64)), links).unwrap();

        let small = RawPacket::new(0x13, BytesMut::from(&[7u8][..]));
        let large = RawPacket::new(0x14, BytesMut::from(&[0xABu8; 300][..]));
        live.send(small.clone()).unwrap();
        live.send(large.clone()).unwrap();

        let mut buf = BytesMut::new();
        assert_eq!(read_frame(&mut client, &mut buf, Some(64)).await, small);
        assert_eq!(read_frame(&mut client, &mut buf, Some(64)).await, large);
    }

    #[tokio::test]
    async fn test_hangup_notifies_disconnect() {
        let (client, server) = loopback().await;
        let (links, _inbound_rx, mut disconnects_rx) = links();
        let uuid = Uuid::new_v4();
        spawn_play(server, GameProfile::new(uuid, "Alex"), &config(None), links).unwrap();

        drop(client);
        let gone = timeout(WAIT, disconnects_rx.recv()).await.unwrap().unwrap();
        assert_eq!(gone, uuid);
    }

    #[tokio::test]
    async fn test_bad_compressed_frame_notifies_disconnect() {
        let (mut client, server) = loopback().await;
        let (links, mut inbound_rx, mut disconnects_rx) = links();
        let uuid = Uuid::new_v4();
        spawn_play(server, GameProfile::new(uuid, "Alex"), &config(Some(256)), links).unwrap();

        // Data length of -1 inside an otherwise well-formed frame.
        client.write_all(&[0x05, 0xFF, 0xFF, 0xFF, 0xFF, 0x0F]).await.unwrap();

        let gone = timeout(WAIT, disconnects_rx.recv()).await.unwrap().unwrap();
        assert_eq!(gone, uuid);
        assert!(inbound_rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_starts_at_configured_spawn() {
        let (_client, server) = loopback().await;
        let (links, _inbound_rx, _disconnects_rx) = links();
        let config = HostConfig {
            spawn: BlockPos::new(120, 72, -45),
            ..HostConfig::default()
        };
        let live = spawn_play(server, GameProfile::new(Uuid::new_v4(), "Alex"), &config, links).unwrap();
        assert_eq!(live.block_position(), BlockPos::new(120, 72, -45));
    }

    #[test]
    fn test_container_ids_cycle() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (in_tx, _in_rx) = mpsc::unbounded_channel();
        let live = LiveConnection::new(GameProfile::new(Uuid::new_v4(), "Alex"), out_tx, "packet_handler", in_tx)
            .unwrap();
        let ids: Vec<i32> = (0..101).map(|_| live.next_container_id()).collect();
        assert_eq!(ids[0], 1);
        assert_eq!(ids[99], 100);
        assert_eq!(ids[100], 1);
    }

    #[test]
    fn test_send_after_writer_gone() {
        let (out_tx, out_rx) = mpsc::unbounded_channel();
        let (in_tx, _in_rx) = mpsc::unbounded_channel();
        let live = LiveConnection::new(GameProfile::new(Uuid::new_v4(), "Alex"), out_tx, "packet_handler", in_tx)
            .unwrap();
        drop(out_rx);
        assert!(live.send(RawPacket::new(0x00, BytesMut::new())).is_err());
    }

    #[test]
    fn test_position_update() {
        let (out_tx, _out_rx) = mpsc::unbounded_channel();
        let (in_tx, _in_rx) = mpsc::unbounded_channel();
        let live = LiveConnection::new(GameProfile::new(Uuid::new_v4(), "Alex"), out_tx, "packet_handler", in_tx)
            .unwrap();
        live.set_position(BlockPos::new(-3, 80, 12));
        assert_eq!(live.block_position(), BlockPos::new(-3, 80, 12));
    }
}
