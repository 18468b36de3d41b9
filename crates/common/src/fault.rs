/// Per-entity failure classes. None of them aborts a frame; the frame
/// driver counts them in its statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Fault {
    /// Stale or unknown entity handle; lookups return `None`.
    #[error("invalid or stale entity handle")]
    InvalidHandle,
    /// NaN or infinite physics values; the body is disabled.
    #[error("degenerate physics state")]
    DegenerateState,
    /// Render or audio submission rejected; the frame proceeds with partial output.
    #[error("backend submission queue saturated")]
    BackendSaturated,
    /// Asset handle not resident at draw time; the item is skipped.
    #[error("resource missing at draw time")]
    ResourceMissing,
}
