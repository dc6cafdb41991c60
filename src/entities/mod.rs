pub mod motion;
pub mod player;

// Re-export commonly used items
pub use motion::{Actor, MotionState, STEP_DURATION};
pub use player::Player;
