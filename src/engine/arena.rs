use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::{Vec3, vec3};
use log::warn;

use crate::types::{LinkKind, SimConfig};
use crate::util::{stable_hash, stable_triple, stable_unit};

use super::{EngineUpdate, SeededNode};

/// Single-owner store of all simulation state. Lives on the worker thread;
/// everything outside the engine only ever sees copied snapshots.
#[derive(Default)]
pub(super) struct SimArena {
    pub(super) ids: Vec<String>,
    pub(super) bodies: Vec<Body>,
    pub(super) group_of: Vec<Option<usize>>,
    pub(super) groups: Vec<String>,
    pub(super) links: Vec<(usize, usize, LinkKind)>,
    pub(super) config: SimConfig,
    pub(super) forces: Vec<Vec3>,
    pub(super) group_centroids: Vec<(Vec3, usize)>,
}

pub(super) struct Body {
    pub(super) position: Vec3,
    pub(super) velocity: Vec3,
}

impl SimArena {
    pub(super) fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub(super) fn snapshot(&self) -> crate::types::PositionSnapshot {
        self.ids
            .iter()
            .cloned()
            .zip(self.bodies.iter().map(|body| body.position))
            .collect()
    }

    /// Applies one diffed graph update. Surviving ids keep their position and
    /// velocity untouched; brand-new ids are seeded; removed ids are freed.
    pub(super) fn apply_update(&mut self, update: EngineUpdate) {
        let EngineUpdate {
            nodes,
            links,
            config,
        } = update;

        // Validate individually; one malformed record never rejects the rest.
        // The last occurrence of a duplicated id wins.
        let mut accepted: Vec<SeededNode> = Vec::with_capacity(nodes.len());
        let mut slot_of: HashMap<String, usize> = HashMap::with_capacity(nodes.len());
        for seeded in nodes {
            if seeded.node.id.is_empty() {
                warn!("dropping node without id (kind {:?})", seeded.node.kind);
                continue;
            }
            if seeded.hint.is_some_and(|hint| !hint.is_finite()) {
                warn!(
                    "dropping node {} with non-finite position hint",
                    seeded.node.id
                );
                continue;
            }
            match slot_of.get(&seeded.node.id) {
                Some(&slot) => accepted[slot] = seeded,
                None => {
                    slot_of.insert(seeded.node.id.clone(), accepted.len());
                    accepted.push(seeded);
                }
            }
        }

        let mut prior: HashMap<String, Body> = self
            .ids
            .drain(..)
            .zip(self.bodies.drain(..))
            .collect();

        let mut groups = Vec::new();
        let mut group_index: HashMap<String, usize> = HashMap::new();
        for seeded in &accepted {
            if let Some(namespace) = &seeded.node.namespace
                && !group_index.contains_key(namespace)
            {
                group_index.insert(namespace.clone(), groups.len());
                groups.push(namespace.clone());
            }
        }

        // Running centroids of retained members so newcomers spawn inside
        // their group instead of sliding in from elsewhere.
        let mut centroids = vec![(Vec3::ZERO, 0usize); groups.len()];
        let mut cluster_centroid = (Vec3::ZERO, 0usize);
        for seeded in &accepted {
            let Some(body) = prior.get(&seeded.node.id) else {
                continue;
            };
            match seeded
                .node
                .namespace
                .as_ref()
                .and_then(|namespace| group_index.get(namespace))
            {
                Some(&group) => {
                    centroids[group].0 += body.position;
                    centroids[group].1 += 1;
                }
                None => {
                    cluster_centroid.0 += body.position;
                    cluster_centroid.1 += 1;
                }
            }
        }

        self.group_of.clear();
        for SeededNode { node, hint } in accepted {
            let group = node
                .namespace
                .as_ref()
                .and_then(|namespace| group_index.get(namespace))
                .copied();

            let body = match prior.remove(&node.id) {
                Some(body) => body,
                None => {
                    let position = match hint {
                        Some(hint) => hint,
                        None => seed_position(&node.id, group, &groups, &config, &centroids, &cluster_centroid),
                    };
                    match group {
                        Some(group) => {
                            centroids[group].0 += position;
                            centroids[group].1 += 1;
                        }
                        None => {
                            cluster_centroid.0 += position;
                            cluster_centroid.1 += 1;
                        }
                    }
                    Body {
                        position,
                        velocity: Vec3::ZERO,
                    }
                }
            };

            self.group_of.push(group);
            self.ids.push(node.id);
            self.bodies.push(body);
        }
        // prior now only holds removed ids; their state drops here

        let index_by_id: HashMap<&str, usize> = self
            .ids
            .iter()
            .enumerate()
            .map(|(index, id)| (id.as_str(), index))
            .collect();

        let mut resolved = Vec::with_capacity(links.len());
        for link in &links {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(link.source.as_str()),
                index_by_id.get(link.target.as_str()),
            ) else {
                continue;
            };
            if source == target {
                continue;
            }
            resolved.push((source.min(target), source.max(target), link.kind));
        }
        resolved.sort_unstable();
        resolved.dedup();

        self.links = resolved;
        self.groups = groups;
        self.config = config;
    }
}

fn seed_position(
    id: &str,
    group: Option<usize>,
    groups: &[String],
    config: &SimConfig,
    centroids: &[(Vec3, usize)],
    cluster_centroid: &(Vec3, usize),
) -> Vec3 {
    let (jitter_x, jitter_y, jitter_z) = stable_triple(id);
    let jitter = vec3(jitter_x * 16.0, jitter_y * 6.0, jitter_z * 16.0);

    match group {
        Some(group) if centroids[group].1 > 0 => {
            centroids[group].0 / centroids[group].1 as f32 + jitter
        }
        Some(group) => namespace_anchor(&groups[group], config) + jitter,
        None if cluster_centroid.1 > 0 => {
            cluster_centroid.0 / cluster_centroid.1 as f32 + jitter
        }
        None => cluster_anchor(id, config) + jitter,
    }
}

/// Deterministic ring slot for a namespace with no simulated members yet,
/// derived from its position in the configured namespace ordering.
fn namespace_anchor(namespace: &str, config: &SimConfig) -> Vec3 {
    let count = config.namespaces.len().max(1);
    let index = config
        .namespaces
        .iter()
        .position(|candidate| candidate == namespace)
        .unwrap_or_else(|| (stable_hash(namespace) % count as u64) as usize);

    let angle = (index as f32 / count as f32) * TAU;
    let members = config
        .namespace_sizes
        .get(namespace)
        .copied()
        .unwrap_or(1)
        .max(1);
    let radius = 180.0 + (members as f32).sqrt() * 24.0;
    vec3(angle.cos() * radius, 0.0, angle.sin() * radius)
}

/// Cluster-scoped resources share a reserved ring close to the origin.
fn cluster_anchor(id: &str, config: &SimConfig) -> Vec3 {
    let angle = stable_unit(id) * TAU;
    let radius = 40.0 + (config.cluster_scoped_count as f32).sqrt() * 8.0;
    vec3(angle.cos() * radius, 0.0, angle.sin() * radius)
}
