//! Vector helpers layered on top of `glam`.

use glam::Vec3;

use crate::config::DEGENERATE_LENGTH;

/// Splits a vector into its unit direction and length.
///
/// Returns `None` for vectors too short to normalise, which force laws treat
/// as "no force this frame".
pub fn direction_and_length(v: Vec3) -> Option<(Vec3, f32)> {
    let length = v.length();
    if length <= DEGENERATE_LENGTH || !length.is_finite() {
        return None;
    }
    Some((v / length, length))
}

/// Whether `value` lies in `[min, min + extent]`, both ends included.
pub fn within_extent(value: f32, min: f32, extent: f32) -> bool {
    value >= min && value <= min + extent
}
