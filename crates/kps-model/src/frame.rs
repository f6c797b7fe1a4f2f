//! Kite reference frame.

use crate::error::ModelResult;
use kps_core::{Vec3, try_normalize};

/// Orthonormal kite frame.
///
/// `e_y` points from the right wing tip to the left one, `e_z` from the apex
/// towards the middle of the tips, `e_x = e_y × e_z` towards the leading edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KiteFrame {
    pub e_x: Vec3,
    pub e_y: Vec3,
    pub e_z: Vec3,
}

impl KiteFrame {
    pub fn from_points(apex: &Vec3, tip_left: &Vec3, tip_right: &Vec3) -> ModelResult<Self> {
        let e_y = try_normalize(&(tip_left - tip_right), "kite frame e_y")?;
        let down = 0.5 * (tip_left + tip_right) - apex;
        // Gram-Schmidt keeps the frame orthonormal for asymmetric shapes
        let e_z = try_normalize(&(down - down.dot(&e_y) * e_y), "kite frame e_z")?;
        let e_x = e_y.cross(&e_z);
        Ok(Self { e_x, e_y, e_z })
    }

    /// Frame of a kite whose apex points along `radial` with the tips level.
    pub fn upright(radial: &Vec3) -> ModelResult<Self> {
        let e_z = -try_normalize(radial, "radial direction")?;
        let e_y = try_normalize(&e_z.cross(&Vec3::z()), "kite frame e_y")
            .or_else(|_| try_normalize(&Vec3::x().cross(&e_z), "kite frame e_y"))?;
        let e_x = e_y.cross(&e_z);
        Ok(Self { e_x, e_y, e_z })
    }
}
