/*
 * 17.14 signed fixed-point arithmetic.
 *
 * `Fp(v)` represents the rational `v / 2^14`. Multiplication and division
 * widen to i64 before scaling back down, so a 32-bit result never
 * overflows during the intermediate product. No floating point anywhere.
 */

use super::FRACTION_BITS;

const F: i64 = 1 << FRACTION_BITS;

/// Rounding mode for [`Fp::to_int`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Round {
    /// Toward zero.
    Trunc,
    /// To nearest, ties away from zero.
    Nearest,
}

/// A signed fixed-point number with 14 fractional bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Fp(pub i32);

impl Fp {
    pub const ZERO: Fp = Fp(0);

    /// `int_to_fp(n)`.
    pub const fn from_int(n: i32) -> Self {
        Fp(n * (1 << FRACTION_BITS))
    }

    /// `fp_to_int(x, mode)`.
    pub fn to_int(self, mode: Round) -> i32 {
        let v = self.0 as i64;
        let result = match mode {
            Round::Trunc => v / F,
            Round::Nearest => {
                if v >= 0 {
                    (v + F / 2) / F
                } else {
                    (v - F / 2) / F
                }
            }
        };
        result as i32
    }

    pub fn add(self, other: Fp) -> Fp {
        Fp(self.0 + other.0)
    }

    pub fn sub(self, other: Fp) -> Fp {
        Fp(self.0 - other.0)
    }

    pub fn mul(self, other: Fp) -> Fp {
        let v = (self.0 as i64 * other.0 as i64) / F;
        Fp(v as i32)
    }

    /// `fp_div(x,y)`. Panics on division by zero — the caller is expected to
    /// never divide by a fixed-point zero (`load_avg` is always `>= 0` and
    /// `2*load_avg + 1` is never zero), so this is a programmer-error
    /// assertion, not a recoverable condition.
    pub fn div(self, other: Fp) -> Fp {
        assert!(other.0 != 0, "division by zero in fixed-point arithmetic");
        let v = (self.0 as i64 * F) / other.0 as i64;
        Fp(v as i32)
    }

    pub fn add_int(self, n: i32) -> Fp {
        self.add(Fp::from_int(n))
    }

    pub fn sub_int(self, n: i32) -> Fp {
        self.sub(Fp::from_int(n))
    }

    pub fn mul_int(self, n: i32) -> Fp {
        Fp(self.0 * n)
    }

    pub fn div_int(self, n: i32) -> Fp {
        assert!(n != 0, "division by zero in fixed-point arithmetic");
        Fp(self.0 / n)
    }
}

impl core::ops::Add for Fp {
    type Output = Fp;
    fn add(self, rhs: Fp) -> Fp {
        Fp::add(self, rhs)
    }
}

impl core::ops::Sub for Fp {
    type Output = Fp;
    fn sub(self, rhs: Fp) -> Fp {
        Fp::sub(self, rhs)
    }
}

impl core::ops::Mul for Fp {
    type Output = Fp;
    fn mul(self, rhs: Fp) -> Fp {
        Fp::mul(self, rhs)
    }
}

impl core::ops::Div for Fp {
    type Output = Fp;
    fn div(self, rhs: Fp) -> Fp {
        Fp::div(self, rhs)
    }
}
