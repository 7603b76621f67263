//! AI Warden - Entry Point
//!
//! Offline demo of the overseer pipeline: synthetic players generate
//! events and activity against the scripted mock overseer, and decided
//! actions are replayed through a logging executor. Run against the real
//! endpoint by setting OPENAI_API_KEY and passing --live.

use ai_warden::actions::{ActionExecutor, PendingAction};
use ai_warden::core::config::WardenConfig;
use ai_warden::core::error::Result;
use ai_warden::core::types::{now_millis, BlockPos, PlayerId};
use ai_warden::events::{EventKind, GameEvent};
use ai_warden::overseer::{MockChatClient, OpenAiChatClient, OverseerChat};
use ai_warden::runtime::{PositionSource, Session};
use ai_warden::stats::ActivityMetric;

use ahash::AHashMap;
use clap::Parser;
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(about = "AI overseer bridge demo")]
struct Args {
    /// Number of synthetic players
    #[arg(long, default_value_t = 3)]
    players: usize,

    /// How many simulation ticks to run
    #[arg(long, default_value_t = 30)]
    ticks: u32,

    /// Milliseconds between simulation ticks
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,

    /// Talk to the real overseer instead of the scripted mock
    /// (requires OPENAI_API_KEY)
    #[arg(long)]
    live: bool,
}

/// Fixed player roster standing in for the live player list
struct DemoWorld {
    players: Vec<PlayerId>,
}

impl PositionSource for DemoWorld {
    fn player_positions(&self) -> AHashMap<PlayerId, BlockPos> {
        self.players
            .iter()
            .enumerate()
            .map(|(i, &pid)| (pid, BlockPos::new(i as i32 * 10, 64, 0)))
            .collect()
    }
}

/// Prints replayed actions instead of applying them to a world
struct LoggingExecutor;

impl ActionExecutor for LoggingExecutor {
    fn execute(&mut self, action: PendingAction) -> Result<()> {
        match &action {
            PendingAction::SendMessage { message_body } => {
                tracing::info!(message = %message_body, "overseer says");
            }
            other => {
                tracing::info!(action = other.kind(), "overseer action replayed");
            }
        }
        Ok(())
    }
}

fn scripted_mock() -> MockChatClient {
    MockChatClient::with_replies([
        r#"{"actions":[{"type":"SendMessage","messageBody":"I am watching this world now."}]}"#,
        r#"{"actions":[]}"#,
        r#"{"actions":[{"type":"SpawnBlock","blockType":"GOLD_BLOCK","pos":{"x":0,"y":64,"z":0}},{"type":"SendMessage","messageBody":"A gift for the diligent miner."}]}"#,
    ])
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "ai_warden=debug".into()),
        )
        .init();

    let args = Args::parse();

    // Accelerated cadences so the demo shows a full dispatch/ping/replay
    // cycle in seconds rather than minutes.
    let cfg = WardenConfig {
        active_dispatch_interval: Duration::from_secs(3),
        idle_dispatch_interval: Duration::from_secs(12),
        ping_interval: Duration::from_secs(2),
        cleanup_interval: Duration::from_secs(6),
        ..WardenConfig::default()
    };

    let client: Arc<dyn OverseerChat> = if args.live {
        Arc::new(OpenAiChatClient::from_env(&cfg)?)
    } else {
        tracing::info!("using scripted mock overseer (pass --live for the real one)");
        Arc::new(scripted_mock())
    };

    let world = Arc::new(DemoWorld {
        players: (0..args.players).map(|_| PlayerId::new()).collect(),
    });

    let session = Session::new(cfg, client, Arc::clone(&world) as Arc<dyn PositionSource>)?;
    session.start().await?;

    let mut executor = LoggingExecutor;
    let mut rng = rand::thread_rng();

    for tick in 0..args.ticks {
        if let Some(&pid) = world.players.as_slice().choose(&mut rng) {
            synthesize_activity(&session, pid, tick, &mut rng)?;
        }

        // The per-tick boundary: bounded action replay on "the simulation
        // thread".
        let executed = session.replay_into(&mut executor)?;
        if executed > 0 {
            tracing::debug!(tick, executed, "tick replayed actions");
        }

        tokio::time::sleep(Duration::from_millis(args.tick_ms)).await;
    }

    session.stop()?;
    Ok(())
}

/// Roll one synthetic player occurrence per tick
fn synthesize_activity(
    session: &Session,
    pid: PlayerId,
    tick: u32,
    rng: &mut impl Rng,
) -> Result<()> {
    let pos = BlockPos::new(rng.gen_range(-20..20), 64, rng.gen_range(-20..20));

    match rng.gen_range(0..10) {
        0 => session.record(GameEvent::new(
            pid,
            pos,
            EventKind::ChatPosted {
                message: format!("hello from tick {tick}"),
            },
        ))?,
        1 => session.record(GameEvent::new(
            pid,
            pos,
            EventKind::PlayerDamaged {
                amount: rng.gen_range(1.0..6.0),
                source: "fall".into(),
            },
        ))?,
        2..=5 => {
            session.record(GameEvent::new(pid, pos, EventKind::BlockBroken))?;
            session.observe(pid, ActivityMetric::Mining, now_millis())?;
        }
        _ => {
            session.record(GameEvent::new(pid, pos, EventKind::BlockPlaced))?;
            session.observe(pid, ActivityMetric::Building, now_millis())?;
        }
    }

    Ok(())
}
