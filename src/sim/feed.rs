//! Periodic scene-state feed
//!
//! Publishes the full list of entity names on a fixed period until shutdown
//! is requested or the receiving side goes away.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::shutdown::Shutdown;
use crate::scene::snapshot::SceneSnapshot;

pub fn spawn_scene_feed(
    names: Vec<String>,
    period: Duration,
    tx: mpsc::Sender<SceneSnapshot>,
    mut shutdown: Shutdown,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            tokio::select! {
                _ = shutdown.requested() => break,
                _ = ticker.tick() => {
                    if tx.send(SceneSnapshot::new(names.clone())).await.is_err() {
                        break;
                    }
                }
            }
        }
        tracing::debug!("scene feed stopped");
    })
}
