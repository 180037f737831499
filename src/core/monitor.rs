use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::Notify;

use crate::core::diff::{PeerChanges, StateDiff, TransitionEvent};
use crate::core::names::PeerDirectory;
use crate::core::peer::{self, Snapshot};
use crate::logging::TransitionLog;
use crate::net::{NotificationThrottle, PeerSource};
use crate::protocol;
use crate::render;
use crate::storage::StateStore;

/// Ties the pipeline together: sample, classify, diff, persist, log,
/// notify, render. Owns all cross-tick state.
pub struct WgMonitor {
    source: Box<dyn PeerSource>,
    names: PeerDirectory,
    store: StateStore,
    log: TransitionLog,
    throttle: Option<NotificationThrottle>,
    interval: Duration,
    wall: bool,
    previous: BTreeSet<String>,
    snapshot: Snapshot,
}

impl WgMonitor {
    pub fn new(
        source: Box<dyn PeerSource>,
        names: PeerDirectory,
        store: StateStore,
        log: TransitionLog,
        throttle: Option<NotificationThrottle>,
        interval: Duration,
        wall: bool,
    ) -> Self {
        Self {
            source,
            names,
            store,
            log,
            throttle,
            interval,
            wall,
            previous: BTreeSet::new(),
            snapshot: Snapshot::new(),
        }
    }

    /// One sample-reconcile pass. Returns the transitions it recorded so
    /// the caller can render them.
    ///
    /// A tick that fails before its transitions reach the durable log
    /// leaves the previous connected set in place, so the same transitions
    /// are redetected on the next tick instead of being lost.
    pub async fn tick(&mut self) -> Result<Vec<TransitionEvent>> {
        let raw = self.source.sample().await.context("sampling peer report")?;
        let snapshot =
            protocol::parse_report(&raw, &self.names).context("parsing peer report")?;
        let current = peer::connected_names(&snapshot);

        let mut events = Vec::new();
        if current != self.previous {
            if let Err(err) = self.store.save(&snapshot) {
                tracing::error!("snapshot save failed, previous file kept: {err}");
            }
            let diff = StateDiff::between(&self.previous, &current);
            let changes = PeerChanges::collect(&diff, &snapshot);
            events = self
                .log
                .record(&changes)
                .context("recording transitions")?;
            if let Some(throttle) = self.throttle.as_mut() {
                throttle.maybe_send(&events).await;
            }
            if self.wall {
                broadcast_connected(&events);
            }
        }
        self.previous = current;
        self.snapshot = snapshot;
        Ok(events)
    }

    /// Runs until `shutdown` is signalled. A tick failure is reported and
    /// the loop keeps going; the view then shows the last good state.
    pub async fn run(&mut self, shutdown: Arc<Notify>) {
        loop {
            let events = match self.tick().await {
                Ok(events) => events,
                Err(err) => {
                    tracing::error!("tick failed: {err:#}");
                    Vec::new()
                }
            };
            if let Err(err) = render::draw(&self.snapshot, &events) {
                tracing::warn!("status view render failed: {err}");
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown.notified() => {
                    tracing::info!("shutdown requested, stopping monitor");
                    return;
                }
            }
        }
    }
}

/// Best-effort `wall(1)` broadcast of the newly connected lines; the
/// monitor never waits on it.
fn broadcast_connected(events: &[TransitionEvent]) {
    let lines: Vec<String> = events
        .iter()
        .filter(|event| event.connected)
        .map(ToString::to_string)
        .collect();
    if lines.is_empty() {
        return;
    }
    let message = format!("[wg-monitor] Updated peers:\n{}", lines.join("\n"));
    if let Err(err) = tokio::process::Command::new("wall").arg(message).spawn() {
        tracing::warn!("wall broadcast failed: {err}");
    }
}
