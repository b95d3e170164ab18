pub mod positioner;
pub mod tall;

pub use positioner::{
    select_anchor, Anchor, AnchorCandidate, ConstraintAdjustment, Gravity, PositionerEngine,
    PositionerRequest,
};
pub use tall::{PositionStrategy, TallPopup};
