//! 3D math primitives for camera and landmark motion

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// 3D vector (world units)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };
    pub const UP: Vec3 = Vec3 {
        x: 0.0,
        y: 1.0,
        z: 0.0,
    };
    pub const FORWARD: Vec3 = Vec3 {
        x: 0.0,
        y: 0.0,
        z: 1.0,
    };
    pub const RIGHT: Vec3 = Vec3 {
        x: 1.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn from_array(a: [f32; 3]) -> Self {
        Self::new(a[0], a[1], a[2])
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    /// Distance to another position
    pub fn distance(self, other: Vec3) -> f32 {
        (other - self).length()
    }

    pub fn dot(self, other: Vec3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * other.z - self.z * other.y,
            y: self.z * other.x - self.x * other.z,
            z: self.x * other.y - self.y * other.x,
        }
    }

    /// Unit vector, or zero when the length is degenerate
    pub fn normalized(self) -> Vec3 {
        let len = self.length();
        if len < 1e-6 {
            return Vec3::ZERO;
        }
        Vec3::new(self.x / len, self.y / len, self.z / len)
    }

    /// Linear interpolation
    pub fn lerp(self, other: Vec3, t: f32) -> Vec3 {
        self + (other - self) * t
    }

    /// Step toward `target` by at most `max_delta`, never overshooting
    pub fn move_towards(self, target: Vec3, max_delta: f32) -> Vec3 {
        let delta = target - self;
        let dist = delta.length();
        if dist <= max_delta || dist < 1e-6 {
            return target;
        }
        self + delta * (max_delta / dist)
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl AddAssign for Vec3 {
    fn add_assign(&mut self, rhs: Vec3) {
        *self = *self + rhs;
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, rhs: Vec3) -> Vec3 {
        Vec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Vec3 {
    type Output = Vec3;
    fn mul(self, rhs: f32) -> Vec3 {
        Vec3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Vec3 {
    type Output = Vec3;
    fn neg(self) -> Vec3 {
        Vec3::new(-self.x, -self.y, -self.z)
    }
}

/// Rotation (unit quaternion)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quat {
    pub w: f32,
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Default for Quat {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quat {
    pub const IDENTITY: Quat = Quat {
        w: 1.0,
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    /// Rotation of `angle` radians about `axis` (axis need not be unit length)
    pub fn from_axis_angle(axis: Vec3, angle: f32) -> Quat {
        let axis = axis.normalized();
        let half = angle * 0.5;
        let s = half.sin();
        Quat {
            w: half.cos(),
            x: axis.x * s,
            y: axis.y * s,
            z: axis.z * s,
        }
    }

    /// Yaw about world up, then pitch about the resulting right axis, roll zero
    pub fn from_yaw_pitch(yaw: f32, pitch: f32) -> Quat {
        Quat::from_axis_angle(Vec3::UP, yaw) * Quat::from_axis_angle(Vec3::RIGHT, pitch)
    }

    /// Rotation whose forward axis points along `forward`
    pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
        let f = forward.normalized();
        if f == Vec3::ZERO {
            return Quat::IDENTITY;
        }
        let mut r = up.cross(f).normalized();
        if r == Vec3::ZERO {
            // forward parallel to up; pick an arbitrary right axis
            r = Vec3::RIGHT;
        }
        let u = f.cross(r);

        // Basis [r u f] to quaternion
        let trace = r.x + u.y + f.z;
        let q = if trace > 0.0 {
            let s = (trace + 1.0).sqrt() * 2.0;
            Quat {
                w: 0.25 * s,
                x: (u.z - f.y) / s,
                y: (f.x - r.z) / s,
                z: (r.y - u.x) / s,
            }
        } else if r.x > u.y && r.x > f.z {
            let s = (1.0 + r.x - u.y - f.z).sqrt() * 2.0;
            Quat {
                w: (u.z - f.y) / s,
                x: 0.25 * s,
                y: (u.x + r.y) / s,
                z: (f.x + r.z) / s,
            }
        } else if u.y > f.z {
            let s = (1.0 + u.y - r.x - f.z).sqrt() * 2.0;
            Quat {
                w: (f.x - r.z) / s,
                x: (u.x + r.y) / s,
                y: 0.25 * s,
                z: (f.y + u.z) / s,
            }
        } else {
            let s = (1.0 + f.z - r.x - u.y).sqrt() * 2.0;
            Quat {
                w: (r.y - u.x) / s,
                x: (f.x + r.z) / s,
                y: (f.y + u.z) / s,
                z: 0.25 * s,
            }
        };
        q.normalized()
    }

    /// Conjugate; inverse for unit quaternions
    pub fn inverse(self) -> Quat {
        Quat {
            w: self.w,
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }

    /// Rotate a vector by this quaternion
    pub fn rotate(self, v: Vec3) -> Vec3 {
        let qv = Vec3::new(self.x, self.y, self.z);
        let uv = qv.cross(v);
        let uuv = qv.cross(uv);
        v + (uv * self.w + uuv) * 2.0
    }

    /// Local forward axis in world space
    pub fn forward(self) -> Vec3 {
        self.rotate(Vec3::FORWARD)
    }

    /// Local right axis in world space
    pub fn right(self) -> Vec3 {
        self.rotate(Vec3::RIGHT)
    }

    /// Spherical linear interpolation
    pub fn slerp(self, other: Quat, t: f32) -> Quat {
        let mut dot = self.w * other.w + self.x * other.x + self.y * other.y + self.z * other.z;

        let other = if dot < 0.0 {
            dot = -dot;
            Quat {
                w: -other.w,
                x: -other.x,
                y: -other.y,
                z: -other.z,
            }
        } else {
            other
        };

        if dot > 0.9995 {
            // Linear interpolation for very close quaternions
            let result = Quat {
                w: self.w + (other.w - self.w) * t,
                x: self.x + (other.x - self.x) * t,
                y: self.y + (other.y - self.y) * t,
                z: self.z + (other.z - self.z) * t,
            };
            return result.normalized();
        }

        let theta_0 = dot.acos();
        let theta = theta_0 * t;
        let sin_theta = theta.sin();
        let sin_theta_0 = theta_0.sin();

        let s0 = theta.cos() - dot * sin_theta / sin_theta_0;
        let s1 = sin_theta / sin_theta_0;

        Quat {
            w: self.w * s0 + other.w * s1,
            x: self.x * s0 + other.x * s1,
            y: self.y * s0 + other.y * s1,
            z: self.z * s0 + other.z * s1,
        }
    }

    fn normalized(self) -> Quat {
        let len = (self.w * self.w + self.x * self.x + self.y * self.y + self.z * self.z).sqrt();
        if len < 1e-4 {
            return Quat::IDENTITY;
        }
        Quat {
            w: self.w / len,
            x: self.x / len,
            y: self.y / len,
            z: self.z / len,
        }
    }
}

impl Mul for Quat {
    type Output = Quat;
    fn mul(self, rhs: Quat) -> Quat {
        Quat {
            w: self.w * rhs.w - self.x * rhs.x - self.y * rhs.y - self.z * rhs.z,
            x: self.w * rhs.x + self.x * rhs.w + self.y * rhs.z - self.z * rhs.y,
            y: self.w * rhs.y - self.x * rhs.z + self.y * rhs.w + self.z * rhs.x,
            z: self.w * rhs.z + self.x * rhs.y - self.y * rhs.x + self.z * rhs.w,
        }
    }
}

/// Clamp to the unit interval
pub fn clamp01(v: f32) -> f32 {
    v.clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    fn approx_vec(a: Vec3, b: Vec3) -> bool {
        approx(a.x, b.x) && approx(a.y, b.y) && approx(a.z, b.z)
    }

    #[test]
    fn test_vec_lerp() {
        let a = Vec3::ZERO;
        let b = Vec3::new(10.0, 10.0, 10.0);

        let mid = a.lerp(b, 0.5);
        assert!(approx_vec(mid, Vec3::new(5.0, 5.0, 5.0)));
    }

    #[test]
    fn test_move_towards_never_overshoots() {
        let a = Vec3::ZERO;
        let target = Vec3::new(1.0, 0.0, 0.0);

        let step = a.move_towards(target, 0.25);
        assert!(approx_vec(step, Vec3::new(0.25, 0.0, 0.0)));

        let snapped = a.move_towards(target, 5.0);
        assert!(approx_vec(snapped, target));
    }

    #[test]
    fn test_look_rotation_forward() {
        let dir = Vec3::new(1.0, 0.0, 1.0).normalized();
        let q = Quat::look_rotation(dir, Vec3::UP);
        assert!(approx_vec(q.forward(), dir));
    }

    #[test]
    fn test_rotate_about_up() {
        let q = Quat::from_axis_angle(Vec3::UP, std::f32::consts::FRAC_PI_2);
        let v = q.rotate(Vec3::FORWARD);
        // 90 degrees about +Y takes +Z to +X
        assert!(approx_vec(v, Vec3::RIGHT));
    }

    #[test]
    fn test_slerp_endpoints() {
        let a = Quat::IDENTITY;
        let b = Quat::from_axis_angle(Vec3::UP, 1.0);

        assert!(approx(a.slerp(b, 0.0).w, a.w));
        assert!(approx(a.slerp(b, 1.0).w, b.w));
    }

    proptest::proptest! {
        #[test]
        fn prop_move_towards_bounded(
            ax in -100.0f32..100.0, ay in -100.0f32..100.0, az in -100.0f32..100.0,
            bx in -100.0f32..100.0, by in -100.0f32..100.0, bz in -100.0f32..100.0,
            step in 0.0f32..10.0,
        ) {
            let a = Vec3::new(ax, ay, az);
            let b = Vec3::new(bx, by, bz);
            let moved = a.move_towards(b, step);
            // Never moves past the target and never increases the distance
            proptest::prop_assert!(moved.distance(b) <= a.distance(b) + 1e-3);
            proptest::prop_assert!(a.distance(moved) <= step + 1e-3);
        }
    }

    #[test]
    fn test_yaw_pitch_roundtrip() {
        let yaw = 0.7f32;
        let pitch = -0.3f32;
        let q = Quat::from_yaw_pitch(yaw, pitch);
        let f = q.forward();

        assert!(approx((-f.y).asin(), pitch));
        assert!(approx(f.x.atan2(f.z), yaw));
    }
}
