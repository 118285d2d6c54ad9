//! Layout subsystem for a live 3D infrastructure graph viewer.
//!
//! A background force simulation assigns every visible resource a position;
//! an update coordinator diffs upstream graph changes and suppresses
//! redundant restarts; a render-side interpolator smooths the simulation's
//! coarse snapshots; and a zone tracker derives namespace boundary polygons
//! for overlay rendering. The rendering layer itself is a consumer of this
//! crate, not part of it.

mod coordinator;
mod engine;
mod error;
mod interpolate;
mod types;
mod util;
mod view;
mod zones;

pub use error::LayoutError;
pub use types::{LinkKind, NamespaceZone, PositionSnapshot, SimConfig, SimLink, SimNode};
pub use view::LayoutView;
pub use zones::CLUSTER_SCOPED_LABEL;
