// 1.0 fixed_point.rs: 18-decimal fixed point over i128. every monetary and
// price quantity in the engine is one of these. no floats anywhere in margin math.
//
// the protocol's wire format carries these as raw x18 integer strings
// ("1500000000000000000" == 1.5), so serde round-trips the raw form.
// mul and div run through a 256-bit intermediate so two x18 values never
// lose precision before rescaling. rounding rule everywhere: truncate
// toward zero.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::iter::Sum;
use std::str::FromStr;

/// Number of fractional decimal digits.
pub const FIXED_POINT_DECIMALS: u32 = 18;

const SCALE: i128 = 1_000_000_000_000_000_000;
const SCALE_U128: u128 = SCALE as u128;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPoint(i128);

impl FixedPoint {
    pub const ZERO: Self = Self(0);
    pub const ONE: Self = Self(SCALE);
    pub const MAX: Self = Self(i128::MAX);
    pub const MIN: Self = Self(i128::MIN);

    /// Wrap a raw x18-scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// Lift a whole number into x18 scale.
    pub const fn from_int(value: i64) -> Self {
        Self(value as i128 * SCALE)
    }

    pub const fn raw(self) -> i128 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn signum(self) -> i32 {
        self.0.signum() as i32
    }

    pub fn abs(self) -> Self {
        Self(self.0.abs())
    }

    pub fn min(self, other: Self) -> Self {
        if self.0 <= other.0 {
            self
        } else {
            other
        }
    }

    pub fn max(self, other: Self) -> Self {
        if self.0 >= other.0 {
            self
        } else {
            other
        }
    }

    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }

    pub fn checked_neg(self) -> Option<Self> {
        self.0.checked_neg().map(Self)
    }

    /// Full-precision multiply: (a * b) / 10^18 with a 256-bit product.
    /// Truncates toward zero. None on overflow of the rescaled result.
    pub fn checked_mul(self, rhs: Self) -> Option<Self> {
        let negative = (self.0 < 0) != (rhs.0 < 0);
        let (hi, lo) = mul_wide(self.0.unsigned_abs(), rhs.0.unsigned_abs());
        let mag = div_wide(hi, lo, SCALE_U128)?;
        Self::from_magnitude(mag, negative)
    }

    /// Full-precision divide: (a * 10^18) / b with a 256-bit dividend.
    /// Truncates toward zero. None when b is zero or the quotient overflows.
    pub fn checked_div(self, rhs: Self) -> Option<Self> {
        if rhs.0 == 0 {
            return None;
        }
        let negative = (self.0 < 0) != (rhs.0 < 0);
        let (hi, lo) = mul_wide(self.0.unsigned_abs(), SCALE_U128);
        let mag = div_wide(hi, lo, rhs.0.unsigned_abs())?;
        Self::from_magnitude(mag, negative)
    }

    fn from_magnitude(mag: u128, negative: bool) -> Option<Self> {
        if negative {
            if mag > i128::MAX as u128 + 1 {
                None
            } else {
                Some(Self((mag as i128).wrapping_neg()))
            }
        } else if mag > i128::MAX as u128 {
            None
        } else {
            Some(Self(mag as i128))
        }
    }
}

// 1.1: wide arithmetic helpers. 128x128 -> 256 product as (hi, lo) u128 limbs,
// then restoring division of the 256-bit value by a 128-bit divisor.

fn mul_wide(a: u128, b: u128) -> (u128, u128) {
    const MASK: u128 = (1 << 64) - 1;
    let (a_hi, a_lo) = (a >> 64, a & MASK);
    let (b_hi, b_lo) = (b >> 64, b & MASK);

    let ll = a_lo * b_lo;
    let lh = a_lo * b_hi;
    let hl = a_hi * b_lo;
    let hh = a_hi * b_hi;

    let mid = (ll >> 64) + (lh & MASK) + (hl & MASK);
    let lo = (mid << 64) | (ll & MASK);
    let hi = hh + (lh >> 64) + (hl >> 64) + (mid >> 64);
    (hi, lo)
}

// quotient of (hi:lo) / divisor, truncated. None if divisor is zero or the
// quotient does not fit in 128 bits (hi >= divisor).
fn div_wide(hi: u128, lo: u128, divisor: u128) -> Option<u128> {
    if divisor == 0 || hi >= divisor {
        return None;
    }
    let mut rem = hi;
    let mut quotient = 0u128;
    for i in (0..128).rev() {
        let carry = rem >> 127;
        rem = (rem << 1) | ((lo >> i) & 1);
        quotient <<= 1;
        if carry == 1 || rem >= divisor {
            rem = rem.wrapping_sub(divisor);
            quotient |= 1;
        }
    }
    Some(quotient)
}

// 1.2: panicking operator sugar. engine arithmetic is total over well-formed
// snapshots; paths where failure is data (isolated leverage) call checked_div.

impl std::ops::Add for FixedPoint {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        match self.checked_add(rhs) {
            Some(v) => v,
            None => panic!("fixed point overflow in add"),
        }
    }
}

impl std::ops::Sub for FixedPoint {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self {
        match self.checked_sub(rhs) {
            Some(v) => v,
            None => panic!("fixed point overflow in sub"),
        }
    }
}

impl std::ops::Mul for FixedPoint {
    type Output = Self;
    fn mul(self, rhs: Self) -> Self {
        match self.checked_mul(rhs) {
            Some(v) => v,
            None => panic!("fixed point overflow in mul"),
        }
    }
}

impl std::ops::Div for FixedPoint {
    type Output = Self;
    fn div(self, rhs: Self) -> Self {
        match self.checked_div(rhs) {
            Some(v) => v,
            None => panic!("fixed point divide by zero or overflow"),
        }
    }
}

impl std::ops::Neg for FixedPoint {
    type Output = Self;
    fn neg(self) -> Self {
        match self.checked_neg() {
            Some(v) => v,
            None => panic!("fixed point overflow in neg"),
        }
    }
}

impl std::ops::AddAssign for FixedPoint {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::ops::SubAssign for FixedPoint {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl Sum for FixedPoint {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + v)
    }
}

impl<'a> Sum<&'a FixedPoint> for FixedPoint {
    fn sum<I: Iterator<Item = &'a Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, |acc, v| acc + *v)
    }
}

// 1.3: parse and display. "123.45" <-> FixedPoint, at most 18 fractional digits.

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FixedPointError {
    #[error("invalid fixed point literal: {literal}")]
    InvalidLiteral { literal: String },
    #[error("fixed point literal out of range: {literal}")]
    OutOfRange { literal: String },
    #[error("too many fractional digits (max {FIXED_POINT_DECIMALS}): {literal}")]
    TooManyDecimals { literal: String },
}

impl FromStr for FixedPoint {
    type Err = FixedPointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FixedPointError::InvalidLiteral {
            literal: s.to_string(),
        };
        let out_of_range = || FixedPointError::OutOfRange {
            literal: s.to_string(),
        };

        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        if body.is_empty() {
            return Err(invalid());
        }

        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        if frac_part.len() > FIXED_POINT_DECIMALS as usize {
            return Err(FixedPointError::TooManyDecimals {
                literal: s.to_string(),
            });
        }

        let mut raw: i128 = 0;
        if !int_part.is_empty() {
            let whole: i128 = int_part.parse().map_err(|_| invalid())?;
            raw = whole.checked_mul(SCALE).ok_or_else(out_of_range)?;
        }
        if !frac_part.is_empty() {
            let frac_digits: i128 = frac_part.parse().map_err(|_| invalid())?;
            let pad = 10i128.pow(FIXED_POINT_DECIMALS - frac_part.len() as u32);
            raw = raw
                .checked_add(frac_digits * pad)
                .ok_or_else(out_of_range)?;
        }
        if negative {
            raw = raw.checked_neg().ok_or_else(out_of_range)?;
        }
        Ok(Self(raw))
    }
}

impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mag = self.0.unsigned_abs();
        let whole = mag / SCALE_U128;
        let frac = mag % SCALE_U128;
        let sign = if self.0 < 0 { "-" } else { "" };
        if frac == 0 {
            write!(f, "{}{}", sign, whole)
        } else {
            let digits = format!("{:018}", frac);
            write!(f, "{}{}.{}", sign, whole, digits.trim_end_matches('0'))
        }
    }
}

// 1.4: serde as the raw x18 integer string, the protocol wire convention.

impl Serialize for FixedPoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for FixedPoint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        let value: i128 = raw
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid x18 integer: {raw}")))?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPoint {
        s.parse().unwrap()
    }

    #[test]
    fn whole_number_scale() {
        assert_eq!(FixedPoint::from_int(5).raw(), 5 * SCALE);
        assert_eq!(FixedPoint::from_int(-3).raw(), -3 * SCALE);
        assert_eq!(FixedPoint::ONE.raw(), SCALE);
    }

    #[test]
    fn multiply_preserves_scale() {
        let a = FixedPoint::from_int(2);
        let b = FixedPoint::from_int(3);
        assert_eq!(a * b, FixedPoint::from_int(6));

        assert_eq!(fp("0.5") * fp("0.5"), fp("0.25"));
        assert_eq!(fp("-0.5") * fp("0.5"), fp("-0.25"));
    }

    #[test]
    fn multiply_uses_wide_intermediate() {
        // 10^9 * 10^9 = 10^18: the raw product is 10^54, far past i128.
        let billion = FixedPoint::from_int(1_000_000_000);
        let product = billion * billion;
        assert_eq!(product, fp("1000000000000000000"));
    }

    #[test]
    fn multiply_keeps_full_precision() {
        // smallest representable value times a whole number survives intact
        let tick = FixedPoint::from_raw(1);
        assert_eq!(tick * FixedPoint::from_int(7), FixedPoint::from_raw(7));
    }

    #[test]
    fn divide_truncates_toward_zero() {
        let third = FixedPoint::from_int(1) / FixedPoint::from_int(3);
        assert_eq!(third.raw(), 333_333_333_333_333_333);

        let neg_third = FixedPoint::from_int(-1) / FixedPoint::from_int(3);
        assert_eq!(neg_third.raw(), -333_333_333_333_333_333);
    }

    #[test]
    fn divide_by_zero_is_detectable() {
        assert_eq!(
            FixedPoint::from_int(1).checked_div(FixedPoint::ZERO),
            None
        );
    }

    #[test]
    fn multiply_overflow_checked() {
        assert_eq!(FixedPoint::MAX.checked_mul(FixedPoint::from_int(2)), None);
        assert_eq!(FixedPoint::MAX.checked_add(FixedPoint::from_raw(1)), None);
    }

    #[test]
    fn parse_and_display_round_trip() {
        for literal in ["0", "1", "-1", "0.5", "-0.5", "50000", "1.000000000000000001", "0.000000000000000001"] {
            let v = fp(literal);
            assert_eq!(v.to_string(), literal, "literal {literal}");
        }
        assert_eq!(fp("1.50").to_string(), "1.5");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert!("".parse::<FixedPoint>().is_err());
        assert!("-".parse::<FixedPoint>().is_err());
        assert!("1.2.3".parse::<FixedPoint>().is_err());
        assert!("abc".parse::<FixedPoint>().is_err());
        assert!(matches!(
            "0.0000000000000000001".parse::<FixedPoint>(),
            Err(FixedPointError::TooManyDecimals { .. })
        ));
    }

    #[test]
    fn serde_uses_raw_x18_string() {
        let v = fp("1.5");
        let json = serde_json::to_string(&v).unwrap();
        assert_eq!(json, "\"1500000000000000000\"");
        let back: FixedPoint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, v);
    }

    #[test]
    fn sum_over_iterator() {
        let total: FixedPoint = [fp("1.5"), fp("2.5"), fp("-1")].iter().sum();
        assert_eq!(total, FixedPoint::from_int(3));
    }

    #[test]
    fn sign_helpers() {
        assert!(fp("-0.1").is_negative());
        assert!(fp("0.1").is_positive());
        assert!(FixedPoint::ZERO.is_zero());
        assert_eq!(fp("-7").signum(), -1);
        assert_eq!(fp("-7").abs(), fp("7"));
    }

    #[test]
    fn wide_division_edge() {
        // hi >= divisor means the quotient cannot fit: must be None, not wrap
        assert_eq!(div_wide(SCALE_U128, 0, SCALE_U128), None);
        assert_eq!(div_wide(0, u128::MAX, u128::MAX), Some(1));
    }
}
