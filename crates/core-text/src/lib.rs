//! Text measurement for the lyric capsule.
//!
//! All layout happens in weight units (see [`weight`]): wide CJK glyphs weigh
//! 2, everything else weighs 1. [`window`] cuts weight-addressed slices out of
//! a line and [`shift`] decides how far each scroll step moves.

pub mod normalize;
pub mod shift;
pub mod weight;
pub mod window;

pub use normalize::normalize_lyric;
pub use shift::{Script, ShiftPlanner};
pub use weight::{char_weight, is_wide, total_weight};
pub use window::extract_by_weight;
