use std::collections::HashMap;
use std::time::Instant;

use crate::coordinator::UpdateCoordinator;
use crate::engine::EngineHandle;
use crate::error::LayoutError;
use crate::interpolate::PositionInterpolator;
use crate::types::{NamespaceZone, PositionSnapshot, SimConfig, SimLink, SimNode};
use crate::zones::ZoneTracker;

/// Owning facade over the layout pipeline for one graph view: background
/// simulation worker, update coordinator, position smoother and zone
/// tracker. The rendering layer calls `advance_frame` once per frame and
/// reads positions and zones imperatively.
pub struct LayoutView {
    engine: Option<EngineHandle>,
    next_token: u64,
    coordinator: UpdateCoordinator,
    interpolator: PositionInterpolator,
    zone_tracker: ZoneTracker,
    live_nodes: HashMap<String, SimNode>,
    raw: PositionSnapshot,
    namespace_projection: bool,
    kinetic_energy: f32,
    ready: bool,
}

impl LayoutView {
    /// Spawns the background worker. Failing to obtain one is the single
    /// fatal layout error; callers fall back to a static layout.
    pub fn new() -> Result<Self, LayoutError> {
        let engine = EngineHandle::spawn(1)?;
        Ok(Self {
            engine: Some(engine),
            next_token: 2,
            coordinator: UpdateCoordinator::default(),
            interpolator: PositionInterpolator::default(),
            zone_tracker: ZoneTracker::default(),
            live_nodes: HashMap::new(),
            raw: PositionSnapshot::new(),
            namespace_projection: false,
            kinetic_energy: 0.0,
            ready: false,
        })
    }

    /// Feeds the latest filtered graph in. Redundant calls are absorbed by
    /// the coordinator's fingerprint and never reach the worker.
    pub fn set_graph(&mut self, nodes: &[SimNode], links: &[SimLink], config: &SimConfig) {
        let was_empty = self.live_nodes.is_empty();
        self.live_nodes = nodes
            .iter()
            .filter(|node| !node.id.is_empty())
            .map(|node| (node.id.clone(), node.clone()))
            .collect();
        self.namespace_projection = config.namespace_projection;

        if nodes.is_empty() {
            // nothing to simulate, so there is nothing to wait for
            self.ready = true;
        } else if was_empty {
            // readiness earned by an empty graph says nothing about this
            // one; wait for its first snapshot
            self.ready = false;
        }

        let update = self
            .coordinator
            .prepare(nodes, links, config, self.interpolator.positions());
        if let (Some(update), Some(engine)) = (update, &self.engine) {
            engine.send_update(update);
        }
    }

    /// Per-frame pump: folds the latest tick (if any) into the smoother and
    /// refreshes zones. `dt_seconds` is the elapsed frame time.
    pub fn advance_frame(&mut self, dt_seconds: f32) {
        if let Some(engine) = &self.engine
            && let Some(tick) = engine.try_latest_tick()
            // a tick from a torn-down instance must not resurrect its state
            && tick.token == engine.token()
        {
            if !tick.positions.is_empty() {
                self.ready = true;
            }
            self.kinetic_energy = tick.kinetic_energy;
            self.raw = tick.positions.clone();
            self.interpolator.retarget(tick.positions);
        }

        self.interpolator.sample(dt_seconds);
        self.zone_tracker.refresh(
            self.interpolator.positions(),
            &self.live_nodes,
            self.namespace_projection,
            Instant::now(),
        );
    }

    /// Latest raw snapshot exactly as the worker produced it.
    pub fn raw_positions(&self) -> &PositionSnapshot {
        &self.raw
    }

    /// Frame-smoothed positions, the set the scene should render from.
    pub fn smoothed_positions(&self) -> &PositionSnapshot {
        self.interpolator.positions()
    }

    pub fn zones(&self) -> &[NamespaceZone] {
        self.zone_tracker.zones()
    }

    /// True once the first non-empty snapshot arrived, or immediately for an
    /// empty input set.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Total kinetic energy reported with the latest tick. Readiness only
    /// means "one snapshot arrived"; callers wanting a visually settled
    /// layout can watch this approach zero instead.
    pub fn kinetic_energy(&self) -> f32 {
        self.kinetic_energy
    }

    /// Synchronously terminates the background worker. Safe to call any
    /// number of times, including on a view that never simulated anything.
    pub fn stop(&mut self) {
        if let Some(mut engine) = self.engine.take() {
            engine.stop();
        }
    }

    /// Tears the current worker down and starts a fresh instance under a new
    /// token. Smoothed positions survive and re-seed the new worker through
    /// the coordinator's hints, so the scene does not visually reset.
    pub fn restart(&mut self) -> Result<(), LayoutError> {
        self.stop();
        let engine = EngineHandle::spawn(self.next_token)?;
        self.next_token += 1;
        self.engine = Some(engine);
        self.coordinator.reset();
        self.raw.clear();
        self.zone_tracker.clear();
        self.ready = false;
        Ok(())
    }
}

impl Drop for LayoutView {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn readiness_resets_when_an_empty_graph_becomes_populated() {
        let mut view = LayoutView::new().expect("spawn layout view");
        view.set_graph(&[], &[], &SimConfig::default());
        assert!(view.is_ready());

        let nodes = vec![SimNode {
            id: "a".to_owned(),
            kind: "pod".to_owned(),
            namespace: None,
        }];
        view.set_graph(&nodes, &[], &SimConfig::default());
        assert!(
            !view.is_ready(),
            "readiness carried over from the empty graph"
        );

        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline && !view.is_ready() {
            view.advance_frame(0.016);
            thread::sleep(Duration::from_millis(16));
        }
        assert!(view.is_ready(), "first snapshot never arrived");
        view.stop();
    }

    #[test]
    fn empty_input_is_ready_without_a_tick() {
        let mut view = LayoutView::new().expect("spawn layout view");
        assert!(!view.is_ready());

        view.set_graph(&[], &[], &SimConfig::default());
        assert!(view.is_ready());
        assert!(view.raw_positions().is_empty());
        view.stop();
    }

    #[test]
    fn stop_is_idempotent() {
        let mut view = LayoutView::new().expect("spawn layout view");
        view.stop();
        view.stop();
        // frames after teardown are inert, not an error
        view.advance_frame(0.016);
    }

    #[test]
    fn restart_issues_a_new_token_and_clears_readiness() {
        let mut view = LayoutView::new().expect("spawn layout view");
        view.set_graph(&[], &[], &SimConfig::default());
        assert!(view.is_ready());

        view.restart().expect("respawn layout worker");
        assert!(!view.is_ready());
        view.stop();
    }
}
