// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Spatial placement of host objects.
//!
//! The runtime core never does geometry itself. It only needs enough of a
//! transform to park pooled objects at a neutral pose and to place them again
//! when they are rented out.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Sub};

/// A 3-dimensional vector with `f32` components.
#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    /// The x component of the vector.
    pub x: f32,
    /// The y component of the vector.
    pub y: f32,
    /// The z component of the vector.
    pub z: f32,
}

impl Vec3 {
    /// A vector with all components set to `0.0`.
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);
    /// A vector with all components set to `1.0`.
    pub const ONE: Self = Self::new(1.0, 1.0, 1.0);

    /// Creates a new `Vec3` with the specified components.
    #[inline]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl Add for Vec3 {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

/// A rotation quaternion, stored as `(x, y, z, w)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quat {
    /// The x component of the vector part.
    pub x: f32,
    /// The y component of the vector part.
    pub y: f32,
    /// The z component of the vector part.
    pub z: f32,
    /// The scalar part.
    pub w: f32,
}

impl Quat {
    /// The identity rotation.
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        z: 0.0,
        w: 1.0,
    };

    /// Creates a rotation of `angle` radians around a normalized `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Self {
        let (s, c) = (angle * 0.5).sin_cos();
        Self {
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
            w: c,
        }
    }
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Opaque identifier of a host-side parent node (scene root, container, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParentId(pub u64);

/// Where an object sits and what it hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// Position, in world or parent space depending on `world_space`.
    pub position: Vec3,
    /// Rotation, in world or parent space depending on `world_space`.
    pub rotation: Quat,
    /// The node this object is attached to, if any.
    pub parent: Option<ParentId>,
    /// Whether `position` and `rotation` are expressed in world space.
    pub world_space: bool,
}

impl Pose {
    /// Origin, identity rotation, detached, world space.
    pub const NEUTRAL: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        parent: None,
        world_space: true,
    };

    /// Resets this pose to [`Pose::NEUTRAL`].
    pub fn reset(&mut self) {
        *self = Self::NEUTRAL;
    }

    /// Returns `true` if this pose equals [`Pose::NEUTRAL`].
    pub fn is_neutral(&self) -> bool {
        *self == Self::NEUTRAL
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pose_is_neutral() {
        assert!(Pose::default().is_neutral());
    }

    #[test]
    fn test_reset_restores_neutral() {
        let mut pose = Pose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), 1.0),
            parent: Some(ParentId(7)),
            world_space: false,
        };
        assert!(!pose.is_neutral());
        pose.reset();
        assert!(pose.is_neutral());
    }

    #[test]
    fn test_vec3_arithmetic() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        assert_eq!(a + Vec3::ONE, Vec3::new(2.0, 3.0, 4.0));
        assert_eq!(a - a, Vec3::ZERO);
    }

    #[test]
    fn test_zero_angle_is_identity() {
        let q = Quat::from_axis_angle(Vec3::new(1.0, 0.0, 0.0), 0.0);
        assert_eq!(q, Quat::IDENTITY);
    }
}
