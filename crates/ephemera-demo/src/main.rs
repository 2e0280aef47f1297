mod console;

use std::path::Path;

use ephemera_media::{prepare_upload, EncodeConfig, JpegEncoder, UploadFile};
use ephemera_playback::{
    run_session, ChannelScheduler, PlaybackConfig, PlaybackEngine, TokioClock,
};
use ephemera_store::{Durability, PersistOutcome, StoreConfig, StoryStore};
use ephemera_types::{Clock, SystemClock};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::console::{parse_input, ConsoleObserver};

/// Uploads any image paths given on the command line, lists the live
/// stories, then plays them. Type `n`, `p`, `pause`, `resume` or `q`
/// followed by enter to steer the viewer.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "ephemera_demo=debug,ephemera_store=info,ephemera_playback=info".into()
            }),
        )
        .init();

    // Config
    let store_config = StoreConfig::from_env();
    let playback_config = PlaybackConfig::from_env();
    info!(
        "Story DB: {} (key {:?})",
        store_config.db_path.display(),
        store_config.storage_key
    );

    let mut store = StoryStore::open(&store_config, SystemClock);

    let encode_config = EncodeConfig::default();
    for path in std::env::args().skip(1) {
        let file = match read_upload(Path::new(&path)) {
            Ok(file) => file,
            Err(e) => {
                warn!("Skipping {}: {}", path, e);
                continue;
            }
        };
        match prepare_upload(&file, &JpegEncoder, &encode_config) {
            Ok(image) => {
                store.create(image);
                if store.last_persist() == Some(PersistOutcome::Dropped) {
                    println!("Storage limit exceeded. Please try a smaller image.");
                } else {
                    println!("Added story from {}", path);
                }
            }
            Err(e) => println!("{}: {}", path, e),
        }
    }

    if let Some(medium) = store.active_medium() {
        if medium.durability == Durability::Session {
            println!("Using session storage (stories will be lost when the program exits)");
        }
    }

    let now = SystemClock.now();
    let stories = store.prune_expired().to_vec();
    if stories.is_empty() {
        println!("No stories yet. Pass image files as arguments to add some.");
        return Ok(());
    }
    for (i, story) in stories.iter().enumerate() {
        println!(
            "{:>2}. {}  posted {}  {} left",
            i + 1,
            story.id,
            story.created_at.with_timezone(&chrono::Local).format("%H:%M"),
            story.remaining_label(now)
        );
    }

    let (scheduler, ticks) = ChannelScheduler::new();
    let total = stories.len();
    let engine =
        PlaybackEngine::new(stories, 0, playback_config, TokioClock::new(), scheduler);

    let (tx, commands) = mpsc::channel(16);
    let input = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match parse_input(&line) {
                Some(command) => {
                    if tx.send(command).await.is_err() {
                        return;
                    }
                }
                None => println!("commands: n, p, pause, resume, q"),
            }
        }
        // Stdin closed: keep the sender alive so playback runs to the end
        std::future::pending::<()>().await;
    });

    let reason = run_session(engine, ticks, commands, &ConsoleObserver { total }).await;
    input.abort();
    info!("Viewer session ended: {:?}", reason);

    Ok(())
}

fn read_upload(path: &Path) -> std::io::Result<UploadFile> {
    let bytes = std::fs::read(path)?;
    let mime = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    };
    Ok(UploadFile {
        name: path.display().to_string(),
        mime: mime.to_string(),
        bytes,
    })
}
