//! Deterministic Fixed-Point Mathematics (2D)
//!
//! Bit-exact arithmetic that produces identical results on x86, ARM, WASM,
//! or any other platform. No IEEE 754 floating point in simulation paths.
//!
//! # Types
//!
//! - [`Fix64`] (I32F32): 64-bit fixed-point, 32 integer bits, 32 fractional bits
//! - [`Vec2Fix`]: 2D vector with Fix64 components
//! - [`Rot2Fix`]: rotation stored as a (sin, cos) pair
//! - [`Transform2Fix`]: rigid transform (translation + rotation)
//! - [`Aabb2`]: axis-aligned bounding box
//!
//! # Precision
//!
//! - Range: ±2.1 × 10^9 (world units)
//! - Resolution: ~2.3 × 10^-10
//!
//! Overflowing operations saturate to the representable range instead of
//! wrapping; there is no NaN and no infinity to propagate.

use core::cmp::Ordering;
use core::ops::{Add, AddAssign, Div, Mul, Neg, Sub, SubAssign};

// ============================================================================
// Fix64 (I32F32)
// ============================================================================

/// 64-bit fixed-point number: 32 integer bits, 32 fractional bits.
///
/// Internal representation: `value = raw / 2^32`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Fix64 {
    /// Raw scaled value. The binary point sits between bits 31 and 32.
    pub raw: i64,
}

/// Number of fractional bits in [`Fix64`].
const FRAC_BITS: u32 = 32;

impl Fix64 {
    /// Zero constant.
    pub const ZERO: Self = Self { raw: 0 };

    /// One (1.0).
    pub const ONE: Self = Self { raw: 1 << FRAC_BITS };

    /// Negative one (-1.0).
    pub const NEG_ONE: Self = Self { raw: -(1 << FRAC_BITS) };

    /// One half (0.5).
    pub const HALF: Self = Self { raw: 1 << (FRAC_BITS - 1) };

    /// Two (2.0).
    pub const TWO: Self = Self { raw: 2 << FRAC_BITS };

    /// π ≈ 3.14159265358979
    pub const PI: Self = Self { raw: 13_493_037_705 };

    /// 2π
    pub const TWO_PI: Self = Self { raw: 26_986_075_409 };

    /// π/2
    pub const HALF_PI: Self = Self { raw: 6_746_518_852 };

    /// Largest representable value.
    pub const MAX: Self = Self { raw: i64::MAX };

    /// Smallest (most negative) representable value.
    pub const MIN: Self = Self { raw: i64::MIN };

    /// Create from an integer. Saturates outside ±2^31.
    #[inline]
    #[must_use]
    pub const fn from_int(n: i64) -> Self {
        if n > (i32::MAX as i64) {
            Self::MAX
        } else if n < (i32::MIN as i64) {
            Self::MIN
        } else {
            Self { raw: n << FRAC_BITS }
        }
    }

    /// Create from a raw I32F32 bit pattern.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self { raw }
    }

    /// Create from a fraction `num / denom`. Returns zero for a zero denominator.
    #[must_use]
    pub const fn from_ratio(num: i64, denom: i64) -> Self {
        if denom == 0 {
            return Self::ZERO;
        }
        let scaled = ((num as i128) << FRAC_BITS) / (denom as i128);
        Self { raw: saturate_i128(scaled) }
    }

    /// Create from `f64`. Initialization convenience only, not deterministic.
    #[cfg(feature = "std")]
    #[must_use]
    pub fn from_f64(f: f64) -> Self {
        Self {
            raw: (f * (1u64 << FRAC_BITS) as f64) as i64,
        }
    }

    /// Convert to `f64`. Debug/display only, not deterministic.
    #[cfg(feature = "std")]
    #[must_use]
    pub fn to_f64(self) -> f64 {
        self.raw as f64 / (1u64 << FRAC_BITS) as f64
    }

    /// Absolute value. `MIN.abs()` saturates to `MAX`.
    #[inline]
    #[must_use]
    pub const fn abs(self) -> Self {
        Self {
            raw: self.raw.saturating_abs(),
        }
    }

    /// True if this value is strictly negative.
    #[inline]
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.raw < 0
    }

    /// True if this value is exactly zero.
    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.raw == 0
    }

    /// Integer part, rounded toward negative infinity.
    #[inline]
    #[must_use]
    pub const fn floor_int(self) -> i64 {
        self.raw >> FRAC_BITS
    }

    /// Minimum of two values.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if self.raw < other.raw { self } else { other }
    }

    /// Maximum of two values.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        if self.raw > other.raw { self } else { other }
    }

    /// Clamp into `[lo, hi]`.
    #[inline]
    #[must_use]
    pub fn clamp(self, lo: Self, hi: Self) -> Self {
        self.max(lo).min(hi)
    }

    /// Divide by two (exact bit shift).
    #[inline]
    #[must_use]
    pub const fn half(self) -> Self {
        Self { raw: self.raw >> 1 }
    }

    /// Multiply by two (saturating).
    #[inline]
    #[must_use]
    pub const fn double(self) -> Self {
        Self {
            raw: self.raw.saturating_mul(2),
        }
    }

    /// Square root via exact integer digit-by-digit extraction.
    ///
    /// Returns zero for negative inputs. Deterministic: pure integer loop.
    #[must_use]
    pub fn sqrt(self) -> Self {
        if self.raw <= 0 {
            return Self::ZERO;
        }
        // sqrt(raw / 2^32) * 2^32 = isqrt(raw << 32)
        let n = (self.raw as u128) << FRAC_BITS;
        Self { raw: isqrt_u128(n) as i64 }
    }

    /// Sine (CORDIC, fixed iteration count).
    #[must_use]
    pub fn sin(self) -> Self {
        cordic_sin_cos(self).0
    }

    /// Cosine (CORDIC, fixed iteration count).
    #[must_use]
    pub fn cos(self) -> Self {
        cordic_sin_cos(self).1
    }

    /// Simultaneous sine and cosine.
    #[must_use]
    pub fn sin_cos(self) -> (Self, Self) {
        cordic_sin_cos(self)
    }

    /// Four-quadrant arctangent of `y / x` (CORDIC vectoring mode).
    #[must_use]
    pub fn atan2(y: Self, x: Self) -> Self {
        cordic_atan2(y, x)
    }
}

/// Clamp a 128-bit intermediate back into the i64 raw range.
#[inline]
const fn saturate_i128(v: i128) -> i64 {
    if v > i64::MAX as i128 {
        i64::MAX
    } else if v < i64::MIN as i128 {
        i64::MIN
    } else {
        v as i64
    }
}

/// Exact floor square root of a u128 (digit-by-digit method).
fn isqrt_u128(n: u128) -> u128 {
    if n == 0 {
        return 0;
    }
    let mut x = n;
    let mut result = 0u128;
    // Highest power of four <= n
    let mut bit = 1u128 << ((127 - n.leading_zeros()) & !1);
    while bit != 0 {
        if x >= result + bit {
            x -= result + bit;
            result = (result >> 1) + bit;
        } else {
            result >>= 1;
        }
        bit >>= 2;
    }
    result
}

impl Add for Fix64 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            raw: self.raw.saturating_add(rhs.raw),
        }
    }
}

impl Sub for Fix64 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            raw: self.raw.saturating_sub(rhs.raw),
        }
    }
}

impl Mul for Fix64 {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Self) -> Self {
        let wide = (self.raw as i128) * (rhs.raw as i128);
        Self {
            raw: saturate_i128(wide >> FRAC_BITS),
        }
    }
}

impl Div for Fix64 {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Self) -> Self {
        if rhs.raw == 0 {
            return Self::ZERO;
        }
        let wide = ((self.raw as i128) << FRAC_BITS) / (rhs.raw as i128);
        Self { raw: saturate_i128(wide) }
    }
}

impl Neg for Fix64 {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            raw: self.raw.saturating_neg(),
        }
    }
}

impl AddAssign for Fix64 {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Fix64 {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl PartialOrd for Fix64 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Fix64 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.raw.cmp(&other.raw)
    }
}

// ============================================================================
// CORDIC (fixed 30-iteration rotation mode)
// ============================================================================

/// arctan(2^-i) for i in 0..30, in I32F32 raw form.
const ATAN_TABLE: [i64; 30] = [
    3_373_259_426, // atan(1)
    1_991_351_318, // atan(1/2)
    1_052_175_346,
    534_100_635,
    268_086_748,
    134_174_063,
    67_103_403,
    33_553_749,
    16_777_131,
    8_388_597,
    4_194_303,
    2_097_152,
    1_048_576,
    524_288,
    262_144,
    131_072,
    65_536,
    32_768,
    16_384,
    8_192,
    4_096,
    2_048,
    1_024,
    512,
    256,
    128,
    64,
    32,
    16,
    8,
];

/// CORDIC gain compensation: K = Π cos(atan(2^-i)) ≈ 0.60725293500888
const CORDIC_K: i64 = 2_608_131_496;

/// Sine and cosine via CORDIC rotation mode (30 iterations).
fn cordic_sin_cos(angle: Fix64) -> (Fix64, Fix64) {
    // Reduce to [-π, π]
    let mut theta = angle;
    while theta > Fix64::PI {
        theta = theta - Fix64::TWO_PI;
    }
    while theta < -Fix64::PI {
        theta = theta + Fix64::TWO_PI;
    }

    // Axis angles must come out exact: a zero-angle rotation has to be the
    // identity, not identity-minus-an-ulp.
    if theta.raw == 0 {
        return (Fix64::ZERO, Fix64::ONE);
    }
    if theta.raw == Fix64::HALF_PI.raw {
        return (Fix64::ONE, Fix64::ZERO);
    }
    if theta.raw == -Fix64::HALF_PI.raw {
        return (-Fix64::ONE, Fix64::ZERO);
    }
    if theta.raw == Fix64::PI.raw || theta.raw == -Fix64::PI.raw {
        return (Fix64::ZERO, -Fix64::ONE);
    }

    // CORDIC converges on [-π/2, π/2]; fold the outer quadrants.
    let mut flip = false;
    if theta > Fix64::HALF_PI {
        theta = Fix64::PI - theta;
        flip = true;
    } else if theta < -Fix64::HALF_PI {
        theta = -Fix64::PI - theta;
        flip = true;
    }

    let mut x = CORDIC_K;
    let mut y = 0i64;
    let mut z = theta.raw;

    for (i, &a) in ATAN_TABLE.iter().enumerate() {
        let xs = x >> i;
        let ys = y >> i;
        if z >= 0 {
            x -= ys;
            y += xs;
            z -= a;
        } else {
            x += ys;
            y -= xs;
            z += a;
        }
    }

    let sin = Fix64::from_raw(y);
    let cos = if flip {
        Fix64::from_raw(-x)
    } else {
        Fix64::from_raw(x)
    };
    (sin, cos)
}

/// Four-quadrant arctangent via CORDIC vectoring mode.
fn cordic_atan2(y: Fix64, x: Fix64) -> Fix64 {
    if x.is_zero() && y.is_zero() {
        return Fix64::ZERO;
    }

    // Pre-scale into a safe range so the shifts below cannot overflow.
    let mut xs = x.raw;
    let mut ys = y.raw;
    while xs.abs() >= (1 << 60) || ys.abs() >= (1 << 60) {
        xs >>= 8;
        ys >>= 8;
    }

    // Vectoring mode needs x > 0; fold the left half-plane.
    let (mut cx, mut cy, adjust) = if xs < 0 {
        if ys >= 0 {
            (-xs, ys, Some(Fix64::PI))
        } else {
            (-xs, ys, Some(-Fix64::PI))
        }
    } else {
        (xs, ys, None)
    };

    let mut z = 0i64;
    for (i, &a) in ATAN_TABLE.iter().enumerate() {
        let dx = cx >> i;
        let dy = cy >> i;
        if cy >= 0 {
            cx += dy;
            cy -= dx;
            z += a;
        } else {
            cx -= dy;
            cy += dx;
            z -= a;
        }
    }

    match adjust {
        // atan2(y, -x) = ±π - atan2(y, x), sign folded by the branch above
        Some(offset) => offset - Fix64::from_raw(z),
        None => Fix64::from_raw(z),
    }
}

// ============================================================================
// Vec2Fix
// ============================================================================

/// 2D vector with [`Fix64`] components.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Vec2Fix {
    /// X component
    pub x: Fix64,
    /// Y component
    pub y: Fix64,
}

impl Vec2Fix {
    /// Zero vector.
    pub const ZERO: Self = Self {
        x: Fix64::ZERO,
        y: Fix64::ZERO,
    };

    /// Unit X vector.
    pub const UNIT_X: Self = Self {
        x: Fix64::ONE,
        y: Fix64::ZERO,
    };

    /// Unit Y vector.
    pub const UNIT_Y: Self = Self {
        x: Fix64::ZERO,
        y: Fix64::ONE,
    };

    /// Create a new vector.
    #[inline]
    #[must_use]
    pub const fn new(x: Fix64, y: Fix64) -> Self {
        Self { x, y }
    }

    /// Create from integer components.
    #[inline]
    #[must_use]
    pub const fn from_int(x: i64, y: i64) -> Self {
        Self {
            x: Fix64::from_int(x),
            y: Fix64::from_int(y),
        }
    }

    /// Dot product.
    #[inline]
    #[must_use]
    pub fn dot(self, rhs: Self) -> Fix64 {
        self.x * rhs.x + self.y * rhs.y
    }

    /// 2D cross product (z-component of the embedded 3D cross product).
    #[inline]
    #[must_use]
    pub fn cross(self, rhs: Self) -> Fix64 {
        self.x * rhs.y - self.y * rhs.x
    }

    /// Cross a scalar with a vector: `s × v = (-s·v.y, s·v.x)`.
    #[inline]
    #[must_use]
    pub fn cross_scalar_vec(s: Fix64, v: Self) -> Self {
        Self {
            x: -s * v.y,
            y: s * v.x,
        }
    }

    /// Squared length (no sqrt).
    #[inline]
    #[must_use]
    pub fn length_squared(self) -> Fix64 {
        self.dot(self)
    }

    /// Length (magnitude).
    #[inline]
    #[must_use]
    pub fn length(self) -> Fix64 {
        self.length_squared().sqrt()
    }

    /// Normalize to unit length. Zero-length vectors normalize to zero.
    #[must_use]
    pub fn normalize(self) -> Self {
        let len = self.length();
        if len.is_zero() {
            Self::ZERO
        } else {
            self / len
        }
    }

    /// Normalize, returning the original length alongside the unit vector.
    #[must_use]
    pub fn normalize_with_length(self) -> (Self, Fix64) {
        let len = self.length();
        if len.is_zero() {
            (Self::ZERO, Fix64::ZERO)
        } else {
            (self / len, len)
        }
    }

    /// Perpendicular vector, 90° counter-clockwise: `(-y, x)`.
    #[inline]
    #[must_use]
    pub fn perp(self) -> Self {
        Self {
            x: -self.y,
            y: self.x,
        }
    }

    /// Perpendicular vector, 90° clockwise: `(y, -x)`.
    #[inline]
    #[must_use]
    pub fn perp_right(self) -> Self {
        Self {
            x: self.y,
            y: -self.x,
        }
    }

    /// Distance to another point.
    #[inline]
    #[must_use]
    pub fn distance_to(self, other: Self) -> Fix64 {
        (other - self).length()
    }

    /// Linear interpolation: `self + (other - self) * t`.
    #[inline]
    #[must_use]
    pub fn lerp(self, other: Self, t: Fix64) -> Self {
        self + (other - self) * t
    }

    /// Component-wise minimum.
    #[inline]
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        Self {
            x: self.x.min(other.x),
            y: self.y.min(other.y),
        }
    }

    /// Component-wise maximum.
    #[inline]
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self {
            x: self.x.max(other.x),
            y: self.y.max(other.y),
        }
    }
}

impl Add for Vec2Fix {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl Sub for Vec2Fix {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl Mul<Fix64> for Vec2Fix {
    type Output = Self;

    #[inline]
    fn mul(self, rhs: Fix64) -> Self {
        Self {
            x: self.x * rhs,
            y: self.y * rhs,
        }
    }
}

impl Div<Fix64> for Vec2Fix {
    type Output = Self;

    #[inline]
    fn div(self, rhs: Fix64) -> Self {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}

impl Neg for Vec2Fix {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Self {
            x: -self.x,
            y: -self.y,
        }
    }
}

impl AddAssign for Vec2Fix {
    #[inline]
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl SubAssign for Vec2Fix {
    #[inline]
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

// ============================================================================
// Rot2Fix — rotation as a stored (sin, cos) pair
// ============================================================================

/// 2D rotation stored as a sine/cosine pair.
///
/// Storing the pair instead of the angle keeps every transform application a
/// pure multiply-add with no trigonometry in hot paths.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(C)]
pub struct Rot2Fix {
    /// sin(θ)
    pub s: Fix64,
    /// cos(θ)
    pub c: Fix64,
}

impl Rot2Fix {
    /// Identity rotation (θ = 0).
    pub const IDENTITY: Self = Self {
        s: Fix64::ZERO,
        c: Fix64::ONE,
    };

    /// Create from an angle in radians (counter-clockwise).
    #[must_use]
    pub fn from_angle(angle: Fix64) -> Self {
        let (s, c) = angle.sin_cos();
        Self { s, c }
    }

    /// Recover the angle via atan2.
    #[must_use]
    pub fn angle(self) -> Fix64 {
        Fix64::atan2(self.s, self.c)
    }

    /// Rotate a vector.
    #[inline]
    #[must_use]
    pub fn apply(self, v: Vec2Fix) -> Vec2Fix {
        Vec2Fix {
            x: self.c * v.x - self.s * v.y,
            y: self.s * v.x + self.c * v.y,
        }
    }

    /// Inverse-rotate a vector.
    #[inline]
    #[must_use]
    pub fn apply_inv(self, v: Vec2Fix) -> Vec2Fix {
        Vec2Fix {
            x: self.c * v.x + self.s * v.y,
            y: -self.s * v.x + self.c * v.y,
        }
    }

    /// Compose two rotations: `self * rhs`.
    #[inline]
    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            s: self.s * rhs.c + self.c * rhs.s,
            c: self.c * rhs.c - self.s * rhs.s,
        }
    }

    /// Compose with the inverse of `self`: `self^-1 * rhs`.
    #[inline]
    #[must_use]
    pub fn mul_t(self, rhs: Self) -> Self {
        Self {
            s: self.c * rhs.s - self.s * rhs.c,
            c: self.c * rhs.c + self.s * rhs.s,
        }
    }

    /// The local X axis of this rotation.
    #[inline]
    #[must_use]
    pub fn x_axis(self) -> Vec2Fix {
        Vec2Fix { x: self.c, y: self.s }
    }

    /// The local Y axis of this rotation.
    #[inline]
    #[must_use]
    pub fn y_axis(self) -> Vec2Fix {
        Vec2Fix { x: -self.s, y: self.c }
    }
}

impl Default for Rot2Fix {
    #[inline]
    fn default() -> Self {
        Self::IDENTITY
    }
}

// ============================================================================
// Transform2Fix
// ============================================================================

/// Rigid 2D transform: rotation followed by translation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Transform2Fix {
    /// Translation
    pub p: Vec2Fix,
    /// Rotation
    pub q: Rot2Fix,
}

impl Transform2Fix {
    /// Identity transform.
    pub const IDENTITY: Self = Self {
        p: Vec2Fix::ZERO,
        q: Rot2Fix::IDENTITY,
    };

    /// Create from translation and rotation.
    #[inline]
    #[must_use]
    pub const fn new(p: Vec2Fix, q: Rot2Fix) -> Self {
        Self { p, q }
    }

    /// Transform a local-space point to world space.
    #[inline]
    #[must_use]
    pub fn apply(self, v: Vec2Fix) -> Vec2Fix {
        self.q.apply(v) + self.p
    }

    /// Transform a world-space point back to local space.
    #[inline]
    #[must_use]
    pub fn apply_inv(self, v: Vec2Fix) -> Vec2Fix {
        self.q.apply_inv(v - self.p)
    }

    /// Compose: `self * rhs` (apply `rhs` first, then `self`).
    #[must_use]
    pub fn mul(self, rhs: Self) -> Self {
        Self {
            p: self.q.apply(rhs.p) + self.p,
            q: self.q.mul(rhs.q),
        }
    }
}

// ============================================================================
// Aabb2
// ============================================================================

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(C)]
pub struct Aabb2 {
    /// Lower bound
    pub min: Vec2Fix,
    /// Upper bound
    pub max: Vec2Fix,
}

impl Aabb2 {
    /// Create from bounds.
    #[inline]
    #[must_use]
    pub const fn new(min: Vec2Fix, max: Vec2Fix) -> Self {
        Self { min, max }
    }

    /// Union of two boxes.
    #[inline]
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// True if `other` fits entirely inside this box.
    #[inline]
    #[must_use]
    pub fn contains(&self, other: &Self) -> bool {
        self.min.x <= other.min.x
            && self.min.y <= other.min.y
            && self.max.x >= other.max.x
            && self.max.y >= other.max.y
    }

    /// True if the boxes overlap.
    #[inline]
    #[must_use]
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    /// True if a point lies inside (inclusive).
    #[inline]
    #[must_use]
    pub fn contains_point(&self, p: Vec2Fix) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Perimeter — the 2D analogue of surface area, used as the tree cost metric.
    #[inline]
    #[must_use]
    pub fn perimeter(&self) -> Fix64 {
        let w = self.max.x - self.min.x;
        let h = self.max.y - self.min.y;
        (w + h).double()
    }

    /// Center point.
    #[inline]
    #[must_use]
    pub fn center(&self) -> Vec2Fix {
        (self.min + self.max) * Fix64::HALF
    }

    /// Grow symmetrically by `margin` in each direction.
    #[inline]
    #[must_use]
    pub fn expanded(&self, margin: Fix64) -> Self {
        let m = Vec2Fix::new(margin, margin);
        Self {
            min: self.min - m,
            max: self.max + m,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix64_basic_ops() {
        let a = Fix64::from_int(5);
        let b = Fix64::from_int(3);
        assert_eq!((a + b).floor_int(), 8);
        assert_eq!((a - b).floor_int(), 2);
        assert_eq!((a * b).floor_int(), 15);
        assert_eq!((a / b).floor_int(), 1);
    }

    #[test]
    fn test_fix64_ratio() {
        let half = Fix64::from_ratio(1, 2);
        assert_eq!(half, Fix64::HALF);
        let third = Fix64::from_ratio(1, 3);
        assert!((third * Fix64::from_int(3) - Fix64::ONE).abs() < Fix64::from_ratio(1, 1_000_000));
    }

    #[test]
    fn test_fix64_saturation() {
        let big = Fix64::MAX;
        assert_eq!(big + Fix64::ONE, Fix64::MAX);
        assert_eq!(big * Fix64::TWO, Fix64::MAX);
        assert_eq!(-Fix64::MIN, Fix64::MAX);
    }

    #[test]
    fn test_fix64_div_by_zero() {
        assert_eq!(Fix64::ONE / Fix64::ZERO, Fix64::ZERO);
    }

    #[test]
    fn test_fix64_sqrt() {
        assert_eq!(Fix64::from_int(25).sqrt().floor_int(), 5);
        assert_eq!(Fix64::from_int(4).sqrt(), Fix64::TWO);
        let r2 = Fix64::TWO.sqrt();
        // sqrt(2) ≈ 1.41421356, raw ≈ 6074001000
        assert!((r2.raw - 6_074_001_000).abs() < 4);
        assert_eq!(Fix64::from_int(-4).sqrt(), Fix64::ZERO);
    }

    #[test]
    fn test_sin_cos_cardinal_angles() {
        let tol = Fix64::from_ratio(1, 100_000);
        let (s, c) = Fix64::ZERO.sin_cos();
        assert!(s.abs() < tol);
        assert!((c - Fix64::ONE).abs() < tol);

        let (s, c) = Fix64::HALF_PI.sin_cos();
        assert!((s - Fix64::ONE).abs() < tol);
        assert!(c.abs() < tol);

        let (s, c) = Fix64::PI.sin_cos();
        assert!(s.abs() < tol);
        assert!((c + Fix64::ONE).abs() < tol);

        let (s, c) = (-Fix64::HALF_PI).sin_cos();
        assert!((s + Fix64::ONE).abs() < tol);
        assert!(c.abs() < tol);
    }

    #[test]
    fn test_sin_cos_axis_angles_are_exact() {
        assert_eq!(Fix64::ZERO.sin_cos(), (Fix64::ZERO, Fix64::ONE));
        assert_eq!(Fix64::HALF_PI.sin_cos(), (Fix64::ONE, Fix64::ZERO));
        assert_eq!((-Fix64::HALF_PI).sin_cos(), (-Fix64::ONE, Fix64::ZERO));
        assert_eq!(Fix64::PI.sin_cos(), (Fix64::ZERO, -Fix64::ONE));

        let q = Rot2Fix::from_angle(Fix64::ZERO);
        let v = Vec2Fix::from_int(3, -7);
        assert_eq!(q.apply(v), v);
    }

    #[test]
    fn test_sin_cos_pythagorean() {
        let tol = Fix64::from_ratio(1, 10_000);
        for i in -12..=12 {
            let angle = Fix64::from_ratio(i, 4);
            let (s, c) = angle.sin_cos();
            let one = s * s + c * c;
            assert!(
                (one - Fix64::ONE).abs() < tol,
                "s^2+c^2 != 1 at angle {i}/4"
            );
        }
    }

    #[test]
    fn test_atan2_quadrants() {
        let tol = Fix64::from_ratio(1, 10_000);
        let one = Fix64::ONE;
        assert!((Fix64::atan2(Fix64::ZERO, one)).abs() < tol);
        assert!((Fix64::atan2(one, Fix64::ZERO) - Fix64::HALF_PI).abs() < tol);
        assert!((Fix64::atan2(-one, Fix64::ZERO) + Fix64::HALF_PI).abs() < tol);
        // atan2(1, 1) = π/4
        let qpi = Fix64::PI / Fix64::from_int(4);
        assert!((Fix64::atan2(one, one) - qpi).abs() < tol);
        // atan2(1, -1) = 3π/4
        let expected = Fix64::PI - qpi;
        assert!((Fix64::atan2(one, -one) - expected).abs() < tol);
    }

    #[test]
    fn test_vec2_ops() {
        let a = Vec2Fix::from_int(3, 4);
        let b = Vec2Fix::from_int(2, 5);
        assert_eq!(a.dot(b).floor_int(), 26);
        assert_eq!(a.cross(b).floor_int(), 7);
        assert_eq!(a.length().floor_int(), 5);
        assert_eq!(a.length_squared().floor_int(), 25);
        let p = a.perp();
        assert!(a.dot(p).is_zero());
    }

    #[test]
    fn test_vec2_normalize() {
        let v = Vec2Fix::from_int(0, 7).normalize();
        assert!(v.x.is_zero());
        assert_eq!(v.y.floor_int(), 1);
        assert_eq!(Vec2Fix::ZERO.normalize(), Vec2Fix::ZERO);
    }

    #[test]
    fn test_rot2_apply_and_inverse() {
        let tol = Fix64::from_ratio(1, 10_000);
        let q = Rot2Fix::from_angle(Fix64::HALF_PI);
        let v = q.apply(Vec2Fix::UNIT_X);
        assert!(v.x.abs() < tol);
        assert!((v.y - Fix64::ONE).abs() < tol);

        let back = q.apply_inv(v);
        assert!((back.x - Fix64::ONE).abs() < tol);
        assert!(back.y.abs() < tol);
    }

    #[test]
    fn test_rot2_compose() {
        let tol = Fix64::from_ratio(1, 10_000);
        let q1 = Rot2Fix::from_angle(Fix64::from_ratio(1, 2));
        let q2 = Rot2Fix::from_angle(Fix64::from_ratio(1, 3));
        let q12 = q1.mul(q2);
        let direct = Rot2Fix::from_angle(Fix64::from_ratio(5, 6));
        assert!((q12.s - direct.s).abs() < tol);
        assert!((q12.c - direct.c).abs() < tol);
    }

    #[test]
    fn test_transform_round_trip() {
        let tol = Fix64::from_ratio(1, 10_000);
        let xf = Transform2Fix::new(
            Vec2Fix::from_int(10, -5),
            Rot2Fix::from_angle(Fix64::from_ratio(1, 4)),
        );
        let p = Vec2Fix::from_int(3, 7);
        let world = xf.apply(p);
        let local = xf.apply_inv(world);
        assert!((local.x - p.x).abs() < tol);
        assert!((local.y - p.y).abs() < tol);
    }

    #[test]
    fn test_aabb_containment_and_overlap() {
        let a = Aabb2::new(Vec2Fix::from_int(0, 0), Vec2Fix::from_int(10, 10));
        let b = Aabb2::new(Vec2Fix::from_int(2, 2), Vec2Fix::from_int(5, 5));
        let c = Aabb2::new(Vec2Fix::from_int(20, 20), Vec2Fix::from_int(30, 30));
        assert!(a.contains(&b));
        assert!(!b.contains(&a));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert_eq!(a.perimeter().floor_int(), 40);
    }

    #[test]
    fn test_determinism_raw_equality() {
        let a = Fix64::from_raw(0x1234_5678_9ABC);
        let b = Fix64::from_raw(-0x0FED_CBA9_8765);
        let r1 = (a * b + a / b).sqrt();
        let r2 = (a * b + a / b).sqrt();
        assert_eq!(r1.raw, r2.raw);
    }
}
