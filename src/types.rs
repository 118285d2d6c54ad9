use std::collections::HashMap;

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// One simulated resource. Identity is the id; kind and namespace only
/// influence force parameters and grouping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimNode {
    pub id: String,
    pub kind: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Typed relation between two nodes. Links whose endpoints are not both live
/// are ignored by the simulation, never rejected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimLink {
    pub source: String,
    pub target: String,
    pub kind: LinkKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkKind {
    Ownership,
    Network,
    Config,
    Storage,
}

impl LinkKind {
    /// Distance the spring relaxes toward. Ownership edges pull tightest so
    /// owner and owned resources read as one cluster.
    pub(crate) fn rest_length(self) -> f32 {
        match self {
            Self::Ownership => 70.0,
            Self::Config => 110.0,
            Self::Storage => 120.0,
            Self::Network => 170.0,
        }
    }

    pub(crate) fn stiffness(self) -> f32 {
        match self {
            Self::Ownership => 0.09,
            Self::Config => 0.05,
            Self::Storage => 0.045,
            Self::Network => 0.028,
        }
    }
}

/// Layout-relevant slice of the viewer configuration. `namespaces` is kept
/// sorted and unique by the upstream store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SimConfig {
    pub namespace_projection: bool,
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub namespace_sizes: HashMap<String, usize>,
    #[serde(default)]
    pub cluster_scoped_count: usize,
}

/// Complete id -> position mapping at one tick, one entry per live node.
pub type PositionSnapshot = HashMap<String, Vec3>;

/// Ground-plane boundary polygon for one namespace group, for overlay
/// rendering. Hull vertices and the centroid are (x, z) pairs.
#[derive(Clone, Debug, Serialize)]
pub struct NamespaceZone {
    pub label: String,
    pub centroid: Vec2,
    pub hull: Vec<Vec2>,
    pub color_seed: f32,
}
