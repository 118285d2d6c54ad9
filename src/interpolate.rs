use std::collections::hash_map::Entry;

use crate::types::PositionSnapshot;

/// Exponential decay rate per second. Higher settles faster; the blend
/// factor below keeps motion frame-rate independent either way.
const DECAY_RATE: f32 = 9.0;

/// Render-side smoothing of the engine's coarse tick snapshots into
/// frame-accurate positions. Holds no simulation truth; the rendering layer
/// reads `positions` imperatively every frame instead of going through any
/// reactive machinery.
#[derive(Default)]
pub(crate) struct PositionInterpolator {
    current: PositionSnapshot,
    targets: PositionSnapshot,
}

impl PositionInterpolator {
    /// Installs the latest snapshot as the blend target. Ids absent from it
    /// are dropped immediately so stale resources never linger on screen.
    pub(crate) fn retarget(&mut self, snapshot: PositionSnapshot) {
        self.current.retain(|id, _| snapshot.contains_key(id));
        self.targets = snapshot;
    }

    /// Advances every tracked position toward its target. Ids seen for the
    /// first time snap straight to the target, never sliding in from an
    /// arbitrary prior value.
    pub(crate) fn sample(&mut self, dt_seconds: f32) {
        let blend = 1.0 - (-DECAY_RATE * dt_seconds.max(0.0)).exp();
        for (id, target) in &self.targets {
            match self.current.entry(id.clone()) {
                Entry::Occupied(mut entry) => {
                    let value = entry.get_mut();
                    *value += (*target - *value) * blend;
                }
                Entry::Vacant(entry) => {
                    entry.insert(*target);
                }
            }
        }
    }

    pub(crate) fn positions(&self) -> &PositionSnapshot {
        &self.current
    }
}
