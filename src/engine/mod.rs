mod arena;
mod forces;

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::Vec3;
use log::{debug, info};

use crate::error::LayoutError;
use crate::types::{PositionSnapshot, SimConfig, SimLink, SimNode};

use arena::SimArena;

const STEP_INTERVAL: Duration = Duration::from_millis(16);
const STEPS_PER_TICK: u64 = 2;

/// Node as shipped across the simulation boundary. The hint only seeds ids
/// the engine has never simulated; it is ignored for surviving ids.
pub(crate) struct SeededNode {
    pub(crate) node: SimNode,
    pub(crate) hint: Option<Vec3>,
}

/// The one inbound message kind: a full replacement graph.
pub(crate) struct EngineUpdate {
    pub(crate) nodes: Vec<SeededNode>,
    pub(crate) links: Vec<SimLink>,
    pub(crate) config: SimConfig,
}

/// The one outbound message kind: a complete position snapshot.
pub(crate) struct TickMessage {
    pub(crate) token: u64,
    pub(crate) positions: PositionSnapshot,
    pub(crate) kinetic_energy: f32,
}

/// Owning handle to one background simulation worker. Dropping the update
/// sender is the stop request; there is no third message kind.
pub(crate) struct EngineHandle {
    token: u64,
    updates: Option<Sender<EngineUpdate>>,
    ticks: Receiver<TickMessage>,
    worker: Option<JoinHandle<()>>,
}

impl EngineHandle {
    pub(crate) fn spawn(token: u64) -> Result<Self, LayoutError> {
        let (update_tx, update_rx) = mpsc::channel();
        let (tick_tx, tick_rx) = mpsc::channel();

        let worker = thread::Builder::new()
            .name(format!("layout-sim-{token}"))
            .spawn(move || run_simulation(token, update_rx, tick_tx))
            .map_err(LayoutError::WorkerUnavailable)?;

        Ok(Self {
            token,
            updates: Some(update_tx),
            ticks: tick_rx,
            worker: Some(worker),
        })
    }

    pub(crate) fn token(&self) -> u64 {
        self.token
    }

    pub(crate) fn send_update(&self, update: EngineUpdate) {
        // a worker that already exited simply loses the update
        if let Some(updates) = &self.updates {
            let _ = updates.send(update);
        }
    }

    /// Drains the tick channel down to the most recent snapshot; a render
    /// side that falls behind never replays stale ticks.
    pub(crate) fn try_latest_tick(&self) -> Option<TickMessage> {
        let mut latest = None;
        while let Ok(tick) = self.ticks.try_recv() {
            latest = Some(tick);
        }
        latest
    }

    /// Requests termination and waits for the worker to exit. Idempotent.
    pub(crate) fn stop(&mut self) {
        self.updates = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

impl Drop for EngineHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Coalesces every queued update down to the latest; intermediate updates
/// are superseded, not replayed. Err means the handle side disconnected.
fn drain_latest(updates: &Receiver<EngineUpdate>) -> Result<Option<EngineUpdate>, ()> {
    let mut latest = None;
    loop {
        match updates.try_recv() {
            Ok(update) => latest = Some(update),
            Err(TryRecvError::Empty) => return Ok(latest),
            Err(TryRecvError::Disconnected) => return Err(()),
        }
    }
}

/// Applies one update to the arena. When the update leaves the arena empty,
/// an empty snapshot goes out immediately so removed nodes disappear
/// downstream instead of lingering as the last populated tick. Err means the
/// tick receiver is gone.
fn ingest_update(
    arena: &mut SimArena,
    token: u64,
    update: EngineUpdate,
    ticks: &Sender<TickMessage>,
) -> Result<(), ()> {
    debug!(
        "layout worker {token} applying update ({} nodes, {} links)",
        update.nodes.len(),
        update.links.len()
    );
    arena.apply_update(update);

    if arena.is_empty() {
        let tick = TickMessage {
            token,
            positions: PositionSnapshot::new(),
            kinetic_energy: 0.0,
        };
        return ticks.send(tick).map_err(|_| ());
    }
    Ok(())
}

fn run_simulation(token: u64, updates: Receiver<EngineUpdate>, ticks: Sender<TickMessage>) {
    info!("layout worker {token} started");
    let mut arena = SimArena::default();
    let mut step = 0u64;

    'running: loop {
        let step_started = Instant::now();

        match drain_latest(&updates) {
            Ok(Some(update)) => {
                if ingest_update(&mut arena, token, update, &ticks).is_err() {
                    break 'running;
                }
            }
            Ok(None) => {}
            Err(()) => break 'running,
        }

        if arena.is_empty() {
            // nothing to integrate; block until the next update or teardown
            match updates.recv() {
                Ok(update) => {
                    if ingest_update(&mut arena, token, update, &ticks).is_err() {
                        break 'running;
                    }
                }
                Err(_) => break 'running,
            }
            if arena.is_empty() {
                continue;
            }
            // woke with work; integrate through the timed path below so the
            // step interval stays uniform
        }

        let kinetic_energy = forces::step_forces(&mut arena);
        step += 1;
        if step % STEPS_PER_TICK == 0 {
            let tick = TickMessage {
                token,
                positions: arena.snapshot(),
                kinetic_energy,
            };
            if ticks.send(tick).is_err() {
                break 'running;
            }
        }

        if let Some(remaining) = STEP_INTERVAL.checked_sub(step_started.elapsed()) {
            thread::sleep(remaining);
        }
    }

    info!("layout worker {token} stopped");
}
