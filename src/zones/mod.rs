mod hull;

use std::collections::HashMap;
use std::f32::consts::TAU;
use std::time::{Duration, Instant};

use glam::{Vec2, vec2};
use log::debug;

use crate::types::{NamespaceZone, PositionSnapshot, SimNode};
use crate::util::stable_unit;

/// Label of the synthetic group holding resources without a namespace.
pub const CLUSTER_SCOPED_LABEL: &str = "cluster-scoped";

/// Below this many ground-plane points a hull degenerates visually, so the
/// point set is padded with a synthetic ring first.
const MIN_HULL_POINTS: usize = 5;
const REFRESH_INTERVAL: Duration = Duration::from_millis(450);
/// Bounding-box extents are rounded to this grid before comparison, so
/// residual jitter does not re-emit zones every cadence tick.
const SIGNATURE_CELL: f32 = 4.0;

#[derive(Debug, PartialEq, Eq)]
struct GroupSignature {
    count: usize,
    bounds: [i32; 4],
}

/// Derives one boundary polygon per namespace group from interpolated
/// positions, on a wall-clock cadence independent of both the simulation
/// tick rate and the render rate.
#[derive(Default)]
pub(crate) struct ZoneTracker {
    zones: Vec<NamespaceZone>,
    signatures: HashMap<String, GroupSignature>,
    last_refresh: Option<Instant>,
}

impl ZoneTracker {
    pub(crate) fn zones(&self) -> &[NamespaceZone] {
        &self.zones
    }

    pub(crate) fn clear(&mut self) {
        self.zones.clear();
        self.signatures.clear();
        self.last_refresh = None;
    }

    pub(crate) fn refresh(
        &mut self,
        positions: &PositionSnapshot,
        nodes: &HashMap<String, SimNode>,
        enabled: bool,
        now: Instant,
    ) {
        if !enabled {
            if !self.zones.is_empty() {
                self.clear();
            }
            return;
        }
        if self
            .last_refresh
            .is_some_and(|at| now.duration_since(at) < REFRESH_INTERVAL)
        {
            return;
        }
        self.last_refresh = Some(now);

        let mut groups: HashMap<&str, Vec<Vec2>> = HashMap::new();
        for (id, position) in positions {
            let Some(node) = nodes.get(id) else {
                continue;
            };
            let label = node.namespace.as_deref().unwrap_or(CLUSTER_SCOPED_LABEL);
            groups
                .entry(label)
                .or_default()
                .push(vec2(position.x, position.z));
        }

        // groups that lost every member disappear outright
        self.signatures
            .retain(|label, _| groups.contains_key(label.as_str()));
        self.zones
            .retain(|zone| groups.contains_key(zone.label.as_str()));

        for (label, points) in groups {
            let signature = signature_of(&points);
            if self
                .signatures
                .get(label)
                .is_some_and(|previous| *previous == signature)
            {
                continue;
            }

            debug!("rebuilding zone for {label} ({} members)", points.len());
            let zone = build_zone(label, points);
            match self.zones.iter_mut().find(|existing| existing.label == label) {
                Some(slot) => *slot = zone,
                None => self.zones.push(zone),
            }
            self.signatures.insert(label.to_owned(), signature);
        }
    }
}

fn signature_of(points: &[Vec2]) -> GroupSignature {
    let mut min = vec2(f32::MAX, f32::MAX);
    let mut max = vec2(f32::MIN, f32::MIN);
    for point in points {
        min = min.min(*point);
        max = max.max(*point);
    }

    GroupSignature {
        count: points.len(),
        bounds: [
            (min.x / SIGNATURE_CELL).round() as i32,
            (min.y / SIGNATURE_CELL).round() as i32,
            (max.x / SIGNATURE_CELL).round() as i32,
            (max.y / SIGNATURE_CELL).round() as i32,
        ],
    }
}

fn build_zone(label: &str, mut points: Vec<Vec2>) -> NamespaceZone {
    // label placement uses the centroid of the real members only
    let centroid = points.iter().copied().sum::<Vec2>() / points.len() as f32;
    pad_point_set(&mut points, centroid);

    NamespaceZone {
        label: label.to_owned(),
        centroid,
        hull: hull::convex_hull(&points),
        color_seed: stable_unit(label),
    }
}

/// Rings synthetic points past the farthest member so even a one-node group
/// gets a visible, non-degenerate polygon.
fn pad_point_set(points: &mut Vec<Vec2>, centroid: Vec2) {
    if points.len() >= MIN_HULL_POINTS {
        return;
    }

    let mut max_distance = 0.0f32;
    for point in points.iter() {
        max_distance = max_distance.max(point.distance(centroid));
    }
    let radius = max_distance * 1.5 + 26.0;

    for slot in 0..MIN_HULL_POINTS {
        let angle = (slot as f32 / MIN_HULL_POINTS as f32) * TAU + 0.35;
        points.push(centroid + vec2(angle.cos(), angle.sin()) * radius);
    }
}
