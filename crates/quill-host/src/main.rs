use quill_host::{init_logging, spawn_play, ConnectionHub, HostConfig, HostLinks, TickLoop};
use quill_prompt::{ConnectionRegistry, PromptEngine, PromptKind};
use quill_types::GameProfile;
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    info!("Starting quill host...");

    let config = Arc::new(HostConfig::load(Path::new("config/host.toml"))?);
    info!(
        "Config loaded: bind={}:{}, server_version={}, tick={}ms",
        config.bind, config.port, config.prompt.server_version, config.tick_millis
    );

    let hub = Arc::new(ConnectionHub::new());
    let (tick_loop, scheduler, links) = TickLoop::new(config.tick_duration(), Arc::clone(&hub));
    let engine = PromptEngine::with_defaults(
        config.prompt.clone(),
        Arc::clone(&hub) as Arc<dyn ConnectionRegistry>,
        Arc::new(scheduler),
    );
    // Fail at startup rather than on the first prompt.
    let adapter = engine.adapter()?;
    info!("Prompt generation {} (protocol {})", adapter.generation(), adapter.protocol().0);

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    // Graceful shutdown channel
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Received shutdown signal");
        let _ = shutdown_tx.send(true);
    });

    tokio::select! {
        _ = tick_loop.run(engine.clone(), shutdown_rx) => {
            info!("Host shut down cleanly");
        }
        _ = accept_loop(listener, config, hub, links, engine) => {
            error!("Accept loop exited unexpectedly");
        }
    }

    Ok(())
}

/// Connections arrive already in play state; each gets a throwaway profile
/// and is greeted with a prompt.
async fn accept_loop(
    listener: TcpListener,
    config: Arc<HostConfig>,
    hub: Arc<ConnectionHub>,
    links: HostLinks,
    engine: PromptEngine,
) {
    let mut joined: u64 = 0;
    loop {
        match listener.accept().await {
            Ok((socket, peer)) => {
                joined += 1;
                let profile = GameProfile::new(Uuid::new_v4(), format!("player{}", joined));
                match spawn_play(socket, profile, &config, links.clone()) {
                    Ok(live) => {
                        let player = live.uuid();
                        hub.insert(live);
                        greet(&engine, player);
                    }
                    Err(e) => warn!("Failed to start connection from {}: {}", peer, e),
                }
            }
            Err(e) => {
                error!("Failed to accept connection: {}", e);
            }
        }
    }
}

fn greet(engine: &PromptEngine, player: Uuid) {
    let kind = match engine.adapter() {
        Ok(adapter) if adapter.supports(PromptKind::Rename) => PromptKind::Rename,
        Ok(_) => PromptKind::MultiLineText,
        Err(e) => {
            error!("No prompt adapter: {}", e);
            return;
        }
    };
    let opened = engine.open_prompt(player, kind, "", move |result| {
        info!(player = %player, "Player answered: {:?}", result.text());
    });
    if let Err(e) = opened {
        warn!(player = %player, "Could not greet player: {}", e);
    }
}
