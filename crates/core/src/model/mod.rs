pub mod lane;
pub mod stop;

pub use lane::{DraftLane, LanePatch, LaneStyle};
pub use stop::{DraftStop, StopIdGenerator};

/// Which draft array an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DraftKind {
    Lanes,
    Stops,
}
