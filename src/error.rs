use thiserror::Error;

/// Failures that make the layout subsystem unavailable. Per-record problems
/// (malformed nodes, dangling links) are handled inline and never surface
/// here.
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("layout worker unavailable: {0}")]
    WorkerUnavailable(#[source] std::io::Error),
}
