//! Exact rational arithmetic.
//!
//! Every rate, amount and cost handled by the solver is a [`Rational`]: an
//! arbitrary-precision fraction that is always stored in lowest terms with a
//! strictly positive denominator. Zero is `0/1`.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, Mul, MulAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{FromPrimitive, One, Signed, ToPrimitive, Zero};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Decimal scale used by [`Rational::from_float`] (five fractional digits).
const FLOAT_SCALE: i64 = 100_000;

/// Fractional parts that [`Rational::from_float`] snaps to thirds.
///
/// Game data writes two thirds as the truncated `0.66666`; `0.66667` is also
/// accepted because that is what `2.0 / 3.0` rounds to at five digits.
const ONE_THIRD_APPROX: [i64; 1] = [33_333];
const TWO_THIRDS_APPROX: [i64; 2] = [66_666, 66_667];

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by fallible rational operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RationalError {
    #[error("division by zero")]
    DivisionByZero,
    #[error("value is not finite: {0}")]
    NotFinite(f64),
    #[error("cannot parse rational from {0:?}")]
    Parse(String),
}

// ---------------------------------------------------------------------------
// Rational
// ---------------------------------------------------------------------------

/// Immutable exact fraction. Arithmetic always returns a new value.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rational(BigRational);

/// Result of [`Rational::divmod`]: `quotient * divisor + remainder == self`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivMod {
    pub quotient: Rational,
    pub remainder: Rational,
}

impl Rational {
    pub fn zero() -> Self {
        Rational(BigRational::zero())
    }

    pub fn one() -> Self {
        Rational(BigRational::one())
    }

    pub fn from_integer(n: i64) -> Self {
        Rational(BigRational::from_integer(BigInt::from(n)))
    }

    /// Build `p/q` from machine integers, reducing and normalizing the sign.
    ///
    /// # Panics
    ///
    /// Panics if `q` is zero. Use [`Rational::new`] for untrusted input.
    pub fn ratio(p: i64, q: i64) -> Self {
        assert!(q != 0, "Rational::ratio called with a zero denominator");
        Rational(BigRational::new(BigInt::from(p), BigInt::from(q)))
    }

    /// Build `p/q`, reducing and normalizing the sign so the denominator is
    /// positive.
    pub fn new(p: BigInt, q: BigInt) -> Result<Self, RationalError> {
        if q.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Rational(BigRational::new(p, q)))
    }

    /// Approximate a float with bounded precision.
    ///
    /// Integers convert exactly. Anything else is rounded to five decimal
    /// digits, and a fractional part of `0.33333` or `0.66666` is replaced by
    /// the exact third, since game data writes thirds that way. The rounded
    /// form `0.66667` snaps to two thirds as well, so computed thirds such as
    /// `2.0 / 3.0` come out exact too.
    pub fn from_float(x: f64) -> Result<Self, RationalError> {
        if !x.is_finite() {
            return Err(RationalError::NotFinite(x));
        }
        if x.fract() == 0.0 {
            let n = BigInt::from_f64(x).ok_or(RationalError::NotFinite(x))?;
            return Ok(Rational(BigRational::from_integer(n)));
        }
        let scaled =
            BigInt::from_f64((x * FLOAT_SCALE as f64).round()).ok_or(RationalError::NotFinite(x))?;
        let approx = Rational(BigRational::new(scaled, BigInt::from(FLOAT_SCALE)));
        let DivMod {
            quotient,
            remainder,
        } = approx.divmod(&Rational::one())?;

        let snaps_to = |candidates: &[i64]| {
            candidates
                .iter()
                .any(|&c| remainder == Rational::ratio(c, FLOAT_SCALE))
        };
        if snaps_to(&ONE_THIRD_APPROX) {
            Ok(quotient + Rational::ratio(1, 3))
        } else if snaps_to(&TWO_THIRDS_APPROX) {
            Ok(quotient + Rational::ratio(2, 3))
        } else {
            Ok(approx)
        }
    }

    pub fn numerator(&self) -> &BigInt {
        self.0.numer()
    }

    pub fn denominator(&self) -> &BigInt {
        self.0.denom()
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn is_integer(&self) -> bool {
        self.0.is_integer()
    }

    /// Largest integer not greater than `self`.
    pub fn floor(&self) -> Rational {
        Rational(self.0.floor())
    }

    /// Smallest integer not less than `self`.
    pub fn ceil(&self) -> Rational {
        Rational(self.0.ceil())
    }

    pub fn abs(&self) -> Rational {
        Rational(self.0.abs())
    }

    pub fn reciprocal(&self) -> Result<Rational, RationalError> {
        if self.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Rational(self.0.recip()))
    }

    pub fn checked_div(&self, other: &Rational) -> Result<Rational, RationalError> {
        if other.is_zero() {
            return Err(RationalError::DivisionByZero);
        }
        Ok(Rational(&self.0 / &other.0))
    }

    /// Floor division with remainder.
    ///
    /// For `other > 0` the remainder satisfies `0 <= remainder < other`.
    pub fn divmod(&self, other: &Rational) -> Result<DivMod, RationalError> {
        let quotient = self.checked_div(other)?.floor();
        let remainder = self - &(other * &quotient);
        Ok(DivMod {
            quotient,
            remainder,
        })
    }

    /// Lossy conversion for display and plotting only.
    pub fn to_f64(&self) -> f64 {
        match (self.numerator().to_f64(), self.denominator().to_f64()) {
            (Some(p), Some(q)) => p / q,
            _ => f64::NAN,
        }
    }

    /// Render as a decimal rounded half-up to at most `max_digits` digits.
    ///
    /// Trailing zeros are dropped when the value is exactly representable
    /// within `max_digits` digits.
    pub fn to_decimal(&self, max_digits: usize) -> String {
        let rounding = Rational(BigRational::new(
            BigInt::from(5),
            num_traits::pow(BigInt::from(10), max_digits + 1),
        ));
        self.to_decimal_with(max_digits, rounding)
    }

    /// Render as a decimal rounded up (away from zero) to `max_digits` digits.
    pub fn to_up_decimal(&self, max_digits: usize) -> String {
        let step = Rational(BigRational::new(
            BigInt::one(),
            num_traits::pow(BigInt::from(10), max_digits),
        ));
        let mut x = self.clone();
        if let Ok(DivMod { remainder, .. }) = self.divmod(&step)
            && !remainder.is_zero()
        {
            x = x + &step;
        }
        x.to_decimal_with(max_digits, Rational::zero())
    }

    fn to_decimal_with(&self, mut max_digits: usize, mut rounding: Rational) -> String {
        let ten = BigRational::from_integer(BigInt::from(10));
        let (sign, magnitude) = if self.is_negative() {
            ("-", self.abs())
        } else {
            ("", self.clone())
        };
        let x = magnitude + &rounding;
        let (whole, rest) = x.numerator().div_mod_floor(x.denominator());
        let mut fraction = BigRational::new(rest, x.denominator().clone());
        let mut digits = String::new();
        while max_digits > 0 && fraction != rounding.0 {
            fraction *= ten.clone();
            rounding = Rational(&rounding.0 * &ten);
            let (digit, rest) = fraction.numer().div_mod_floor(fraction.denom());
            digits.push_str(&digit.to_string());
            fraction = BigRational::new(rest, fraction.denom().clone());
            max_digits -= 1;
        }
        if fraction == rounding.0 {
            while digits.ends_with('0') {
                digits.pop();
            }
        }
        if digits.is_empty() {
            format!("{sign}{whole}")
        } else {
            format!("{sign}{whole}.{digits}")
        }
    }

    /// Render as a mixed number, e.g. `"1 + 1/2"`.
    pub fn to_mixed(&self) -> String {
        let (whole, rest) = self.numerator().div_mod_floor(self.denominator());
        if whole.is_zero() || rest.is_zero() {
            return self.to_string();
        }
        format!("{whole} + {rest}/{}", self.denominator())
    }
}

impl Default for Rational {
    fn default() -> Self {
        Rational::zero()
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.denominator().is_one() {
            write!(f, "{}", self.numerator())
        } else {
            write!(f, "{}/{}", self.numerator(), self.denominator())
        }
    }
}

impl fmt::Debug for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Rational({self})")
    }
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Accepts `"p"` (integer or exact decimal such as `"1.25"`), `"p/q"`, and
/// the mixed form `"i+p/q"` meaning `(i*q + p)/q`.
impl FromStr for Rational {
    type Err = RationalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let err = || RationalError::Parse(s.to_string());
        let int = |part: &str| part.trim().parse::<BigInt>().map_err(|_| err());

        match s.split_once('/') {
            None => parse_decimal(s).ok_or_else(err),
            Some((head, denom)) => {
                let q = int(denom)?;
                let p = match head.rsplit_once('+') {
                    Some((whole, frac)) if !whole.trim().is_empty() => int(frac)? + int(whole)? * &q,
                    _ => int(head)?,
                };
                Rational::new(p, q)
            }
        }
    }
}

fn parse_decimal(s: &str) -> Option<Rational> {
    let (negative, unsigned) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s.strip_prefix('+').unwrap_or(s)),
    };
    let (whole, frac) = unsigned.split_once('.').unwrap_or((unsigned, ""));
    if whole.is_empty() && frac.is_empty() {
        return None;
    }
    let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
    if !all_digits(whole) || !all_digits(frac) {
        return None;
    }
    let mantissa: BigInt = format!("{whole}{frac}").parse().ok()?;
    let value = BigRational::new(mantissa, num_traits::pow(BigInt::from(10), frac.len()));
    Some(Rational(if negative { -value } else { value }))
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

impl From<i64> for Rational {
    fn from(n: i64) -> Self {
        Rational::from_integer(n)
    }
}

impl From<u32> for Rational {
    fn from(n: u32) -> Self {
        Rational::from_integer(i64::from(n))
    }
}

impl From<BigInt> for Rational {
    fn from(n: BigInt) -> Self {
        Rational(BigRational::from_integer(n))
    }
}

impl Serialize for Rational {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Rational {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Operators
// ---------------------------------------------------------------------------

macro_rules! forward_binop {
    ($imp:ident, $method:ident) => {
        impl $imp<&Rational> for &Rational {
            type Output = Rational;
            fn $method(self, rhs: &Rational) -> Rational {
                Rational($imp::$method(&self.0, &rhs.0))
            }
        }

        impl $imp<Rational> for Rational {
            type Output = Rational;
            fn $method(self, rhs: Rational) -> Rational {
                Rational($imp::$method(&self.0, &rhs.0))
            }
        }

        impl $imp<&Rational> for Rational {
            type Output = Rational;
            fn $method(self, rhs: &Rational) -> Rational {
                Rational($imp::$method(&self.0, &rhs.0))
            }
        }

        impl $imp<Rational> for &Rational {
            type Output = Rational;
            fn $method(self, rhs: Rational) -> Rational {
                Rational($imp::$method(&self.0, &rhs.0))
            }
        }
    };
}

forward_binop!(Add, add);
forward_binop!(Sub, sub);
forward_binop!(Mul, mul);
// Panics on a zero divisor, like integer division. See `checked_div`.
forward_binop!(Div, div);

impl AddAssign<&Rational> for Rational {
    fn add_assign(&mut self, rhs: &Rational) {
        self.0 = &self.0 + &rhs.0;
    }
}

impl SubAssign<&Rational> for Rational {
    fn sub_assign(&mut self, rhs: &Rational) {
        self.0 = &self.0 - &rhs.0;
    }
}

impl MulAssign<&Rational> for Rational {
    fn mul_assign(&mut self, rhs: &Rational) {
        self.0 = &self.0 * &rhs.0;
    }
}

impl Neg for Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational(-self.0)
    }
}

impl Neg for &Rational {
    type Output = Rational;
    fn neg(self) -> Rational {
        Rational(-self.0.clone())
    }
}

impl Sum for Rational {
    fn sum<I: Iterator<Item = Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}

impl<'a> Sum<&'a Rational> for Rational {
    fn sum<I: Iterator<Item = &'a Rational>>(iter: I) -> Rational {
        iter.fold(Rational::zero(), |acc, x| acc + x)
    }
}
