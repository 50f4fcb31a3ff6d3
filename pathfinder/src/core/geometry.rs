// world_pathfinder/pathfinder/src/core/geometry.rs
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const fn new(x: f32, y: f32) -> Self { Vec2 { x, y } }
    pub const fn zero() -> Self { Vec2 { x: 0.0, y: 0.0 } }

    pub fn dot(self, other: Vec2) -> f32 {
        self.x * other.x + self.y * other.y
    }

    /// Z component of the 3D cross product. Positive when `other` lies counter-clockwise of `self`.
    pub fn cross(self, other: Vec2) -> f32 {
        self.x * other.y - self.y * other.x
    }

    pub fn length_squared(self) -> f32 { self.dot(self) }
    pub fn length(self) -> f32 { self.length_squared().sqrt() }

    pub fn distance(self, other: Vec2) -> f32 { (self - other).length() }
    pub fn distance_squared(self, other: Vec2) -> f32 { (self - other).length_squared() }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x + rhs.x, self.y + rhs.y) }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 { Vec2::new(self.x - rhs.x, self.y - rhs.y) }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 { Vec2::new(self.x * rhs, self.y * rhs) }
}

/// Position or direction. World space uses x/y as the ground plane and z as elevation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const fn new(x: f32, y: f32, z: f32) -> Self { Vec3 { x, y, z } }
    pub const fn zero() -> Self { Vec3 { x: 0.0, y: 0.0, z: 0.0 } }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length_squared(self) -> f32 { self.dot(self) }
    pub fn length(self) -> f32 { self.length_squared().sqrt() }

    pub fn distance(self, other: Vec3) -> f32 { (self - other).length() }
    pub fn distance_squared(self, other: Vec3) -> f32 { (self - other).length_squared() }

    /// Unit vector in the same direction, or `None` for a (near) zero vector.
    pub fn normalized(self) -> Option<Vec3> {
        let len = self.length();
        if len <= f32::EPSILON {
            None
        } else {
            Some(self * (1.0 / len))
        }
    }

    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Projection onto the world ground plane.
    pub fn xy(self) -> Vec2 { Vec2::new(self.x, self.y) }

    /// Projection onto the ground plane of building model space (y up).
    pub fn xz(self) -> Vec2 { Vec2::new(self.x, self.z) }

    /// Exchanges the y and z axes; converts between world-oriented and model-oriented frames.
    pub fn swap_yz(self) -> Vec3 { Vec3::new(self.x, self.z, self.y) }

    pub fn approx_eq(self, other: Vec3, epsilon: f32) -> bool {
        (self.x - other.x).abs() <= epsilon
            && (self.y - other.y).abs() <= epsilon
            && (self.z - other.z).abs() <= epsilon
    }

    pub fn min(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(self, other: Vec3) -> Vec3 {
        Vec3::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn to_array(self) -> [f32; 3] { [self.x, self.y, self.z] }
}

impl From<[f32; 3]> for Vec3 {
    fn from(v: [f32; 3]) -> Self { Vec3::new(v[0], v[1], v[2]) }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 { Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z) }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        self.x += rhs.x;
        self.y += rhs.y;
        self.z += rhs.z;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 { Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z) }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 { Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs) }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 { Vec3::new(-self.x, -self.y, -self.z) }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub a: Vec3,
    pub b: Vec3,
}

impl Segment {
    pub fn new(a: Vec3, b: Vec3) -> Self { Segment { a, b } }

    pub fn length(&self) -> f32 { self.a.distance(self.b) }
    pub fn midpoint(&self) -> Vec3 { self.a.lerp(self.b, 0.5) }
    pub fn point_at(&self, t: f32) -> Vec3 { self.a.lerp(self.b, t) }

    /// Closest point to `p`, clamped to the segment.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq <= f32::EPSILON {
            return self.a;
        }
        let t = ((p - self.a).dot(ab) / len_sq).clamp(0.0, 1.0);
        self.point_at(t)
    }

    /// Parameter of the closest point to `p` on the ground plane, clamped to `[0, 1]`.
    pub fn closest_param_xy(&self, p: Vec2) -> f32 {
        let a = self.a.xy();
        let ab = self.b.xy() - a;
        let len_sq = ab.length_squared();
        if len_sq <= f32::EPSILON {
            return 0.0;
        }
        ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0)
    }

    pub fn distance_squared_xy(&self, p: Vec2) -> f32 {
        let t = self.closest_param_xy(p);
        self.point_at(t).xy().distance_squared(p)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self { Sphere { center, radius } }

    pub fn contains(&self, p: Vec3) -> bool {
        p.distance_squared(self.center) < self.radius * self.radius
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn new(min: Vec3, max: Vec3) -> Self { Aabb { min, max } }

    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Aabb::new(first, first);
        for p in iter {
            bounds.min = bounds.min.min(p);
            bounds.max = bounds.max.max(p);
        }
        Some(bounds)
    }

    pub fn center(&self) -> Vec3 { self.min.lerp(self.max, 0.5) }
    pub fn half_extents(&self) -> Vec3 { (self.max - self.min) * 0.5 }

    pub fn longest_half_extent(&self) -> f32 {
        let e = self.half_extents();
        e.x.max(e.y).max(e.z)
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x && p.x <= self.max.x
            && p.y >= self.min.y && p.y <= self.max.y
            && p.z >= self.min.z && p.z <= self.max.z
    }

    pub fn contains_xy(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn expanded(&self, by: Vec3) -> Aabb {
        Aabb::new(self.min - by, self.max + by)
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x
            && self.min.y <= other.max.y && self.max.y >= other.min.y
            && self.min.z <= other.max.z && self.max.z >= other.min.z
    }
}

/// Placement of a building: translation plus rotation about the world z axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Radians, counter-clockwise when looking down the z axis.
    pub yaw: f32,
}

impl Transform {
    pub fn new(position: Vec3, yaw: f32) -> Self { Transform { position, yaw } }

    fn rotate_z(p: Vec3, angle: f32) -> Vec3 {
        let (s, c) = angle.sin_cos();
        Vec3::new(p.x * c - p.y * s, p.x * s + p.y * c, p.z)
    }

    /// World position into the local (still z-up) frame.
    pub fn to_local(&self, world: Vec3) -> Vec3 {
        Self::rotate_z(world - self.position, -self.yaw)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        Self::rotate_z(local, self.yaw) + self.position
    }

    /// World position into building model space (x/z ground plane, y up).
    pub fn to_model_space(&self, world: Vec3) -> Vec3 {
        self.to_local(world).swap_yz()
    }

    pub fn from_model_space(&self, model: Vec3) -> Vec3 {
        self.to_world(model.swap_yz())
    }
}
