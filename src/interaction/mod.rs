pub mod drag;
pub mod snap;

pub use drag::{DragController, DragMode, FinishedGesture, HitRegion, MoveOutcome};
pub use snap::{snap_delta, snap_unit};
