use std::collections::HashSet;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use log::debug;

use crate::engine::{EngineUpdate, SeededNode};
use crate::types::{PositionSnapshot, SimConfig, SimLink, SimNode};

/// Translates arbitrary-rate upstream graph changes into the minimal set of
/// engine updates. A fingerprint over the forwarded state suppresses
/// repeats, so identical input never restarts the simulation.
#[derive(Default)]
pub(crate) struct UpdateCoordinator {
    last_fingerprint: Option<u64>,
    forwarded_ids: HashSet<String>,
}

impl UpdateCoordinator {
    /// Forgets everything previously forwarded. Called when a fresh engine
    /// instance starts so the next update re-seeds it, hints included.
    pub(crate) fn reset(&mut self) {
        self.last_fingerprint = None;
        self.forwarded_ids.clear();
    }

    /// Returns the update to forward, or None when the input matches the
    /// previously forwarded state. `hints` is the smoother's current output;
    /// a hint is attached only to ids the engine has never seen.
    pub(crate) fn prepare(
        &mut self,
        nodes: &[SimNode],
        links: &[SimLink],
        config: &SimConfig,
        hints: &PositionSnapshot,
    ) -> Option<EngineUpdate> {
        let fingerprint = fingerprint(nodes, links, config);
        if self.last_fingerprint == Some(fingerprint) {
            debug!("suppressing redundant layout update ({fingerprint:#018x})");
            return None;
        }
        self.last_fingerprint = Some(fingerprint);

        let seeded = nodes
            .iter()
            .map(|node| SeededNode {
                node: node.clone(),
                hint: if self.forwarded_ids.contains(&node.id) {
                    None
                } else {
                    hints.get(&node.id).copied()
                },
            })
            .collect::<Vec<_>>();

        self.forwarded_ids = nodes.iter().map(|node| node.id.clone()).collect();

        debug!(
            "forwarding layout update: {} nodes, {} links",
            nodes.len(),
            links.len()
        );
        Some(EngineUpdate {
            nodes: seeded,
            links: links.to_vec(),
            config: config.clone(),
        })
    }
}

/// Cheap equality proxy: sorted ids, canonical link pairs, config fields.
/// Collisions are theoretically possible and accepted.
fn fingerprint(nodes: &[SimNode], links: &[SimLink], config: &SimConfig) -> u64 {
    let mut ids = nodes.iter().map(|node| node.id.as_str()).collect::<Vec<_>>();
    ids.sort_unstable();

    let mut pairs = links
        .iter()
        .map(|link| {
            let (low, high) = if link.source <= link.target {
                (link.source.as_str(), link.target.as_str())
            } else {
                (link.target.as_str(), link.source.as_str())
            };
            (low, high, link.kind)
        })
        .collect::<Vec<_>>();
    pairs.sort_unstable();
    pairs.dedup();

    let mut sizes = config
        .namespace_sizes
        .iter()
        .map(|(namespace, count)| (namespace.as_str(), *count))
        .collect::<Vec<_>>();
    sizes.sort_unstable();

    let mut hasher = DefaultHasher::new();
    ids.hash(&mut hasher);
    pairs.hash(&mut hasher);
    config.namespace_projection.hash(&mut hasher);
    config.namespaces.hash(&mut hasher);
    sizes.hash(&mut hasher);
    config.cluster_scoped_count.hash(&mut hasher);
    hasher.finish()
}
