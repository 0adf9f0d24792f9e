use serde::{Deserialize, Serialize};

/// Semantic color tokens resolved by the renderer's active theme.
///
/// Lanes carry their own hex color; tokens cover everything else the
/// overlay draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThemeToken {
    Background,
    Grid,

    PersistedLane,
    DraftLane,
    InactiveLane,

    LaneStart,
    LaneEnd,
    LanePoint,
    SelectionHighlight,

    Stop,
    DraftStop,
    RepositionStop,

    Cursor,
    TextPrimary,
    TextMuted,
}
