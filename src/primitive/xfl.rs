use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

const MIN_MANTISSA: u64 = 1_000_000_000_000_000;
const MAX_MANTISSA: u64 = 9_999_999_999_999_999;
const MIN_EXPONENT: i64 = -96;
const MAX_EXPONENT: i64 = 80;
const EXPONENT_BIAS: i64 = 97;
const MANTISSA_BITS: u32 = 54;
const MANTISSA_MASK: u64 = (1 << MANTISSA_BITS) - 1;
const SIGN_BIT: u64 = 1 << 62;
const RESERVED_BIT: u64 = 1 << 63;
const SIGNIFICANT_DIGITS: usize = 16;

/// A 64-bit decimal floating point number as used by hooks.
///
/// Layout, most significant bit first:
///
/// - bit 63: reserved, always 0
/// - bit 62: sign, 1 for positive
/// - bits 54-61: exponent, biased by 97
/// - bits 0-53: mantissa, normalized to 16 decimal digits
///
/// The value is `mantissa * 10^exponent`. Zero is the all-zero word and has no other encoding.
/// Only canonical words can be held by an `Xfl`, so two equal values always have equal bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Xfl(u64);

impl Xfl {
    pub const BYTES: usize = 8;
    pub const ZERO: Xfl = Xfl(0);

    /// Interpret a raw word, rejecting anything that isn't canonical.
    pub fn from_bits(bits: u64) -> Result<Self> {
        if bits == 0 {
            return Ok(Self::ZERO);
        }
        if bits & RESERVED_BIT != 0 {
            return Err(Error::MalformedInput(format!(
                "XFL {:016X} has its reserved bit set",
                bits
            )));
        }
        let mantissa = bits & MANTISSA_MASK;
        if !(MIN_MANTISSA..=MAX_MANTISSA).contains(&mantissa) {
            return Err(Error::MalformedInput(format!(
                "XFL {:016X} has a non-normalized mantissa",
                bits
            )));
        }
        let exponent = ((bits >> MANTISSA_BITS) & 0xFF) as i64 - EXPONENT_BIAS;
        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(Error::MalformedInput(format!(
                "XFL {:016X} has exponent {} outside [{}, {}]",
                bits, exponent, MIN_EXPONENT, MAX_EXPONENT
            )));
        }
        Ok(Self(bits))
    }

    pub fn to_bits(self) -> u64 {
        self.0
    }

    /// Build from `mantissa * 10^exponent`, rounding half-to-even to 16 significant digits.
    pub fn from_parts(negative: bool, mantissa: u64, exponent: i32) -> Result<Self> {
        Self::from_digits(negative, mantissa.to_string().as_bytes(), exponent as i64)
    }

    /// Convert from a binary float through its shortest round-trip decimal form.
    ///
    /// ```
    /// # use hookstate_codec::Xfl;
    /// let x = Xfl::from_f64(0.01).unwrap();
    /// assert_eq!(x.to_bits(), 0x5403_8D7E_A4C6_8000);
    /// ```
    pub fn from_f64(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(Error::OutOfRange(format!(
                "{} cannot be represented as XFL",
                value
            )));
        }
        format!("{:e}", value).parse()
    }

    /// Nearest binary float to this decimal value.
    pub fn to_f64(self) -> f64 {
        if self.is_zero() {
            return 0.0;
        }
        let sign = if self.is_negative() { "-" } else { "" };
        format!("{}{}e{}", sign, self.mantissa(), self.exponent())
            .parse()
            .unwrap_or(f64::NAN)
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn is_negative(self) -> bool {
        !self.is_zero() && self.0 & SIGN_BIT == 0
    }

    /// The 16-digit mantissa, or 0 for zero.
    pub fn mantissa(self) -> u64 {
        self.0 & MANTISSA_MASK
    }

    /// The decimal exponent, or 0 for zero.
    pub fn exponent(self) -> i32 {
        if self.is_zero() {
            return 0;
        }
        (((self.0 >> MANTISSA_BITS) & 0xFF) as i64 - EXPONENT_BIAS) as i32
    }

    /// Round an ASCII digit string times `10^exponent` into a canonical value.
    fn from_digits(negative: bool, digits: &[u8], exponent: i64) -> Result<Self> {
        let start = digits.iter().take_while(|d| **d == b'0').count();
        let digits = &digits[start..];
        if digits.is_empty() {
            return Ok(Self::ZERO);
        }
        let keep = digits.len().min(SIGNIFICANT_DIGITS);
        let mut mantissa = digits[..keep]
            .iter()
            .fold(0u64, |acc, d| acc * 10 + u64::from(d - b'0'));
        let mut exponent = exponent.saturating_add((digits.len() - keep) as i64);
        if digits.len() > keep {
            let round = digits[keep] - b'0';
            let sticky = digits[keep + 1..].iter().any(|d| *d != b'0');
            if round > 5 || (round == 5 && (sticky || mantissa % 2 == 1)) {
                mantissa += 1;
            }
        }
        while mantissa < MIN_MANTISSA {
            mantissa *= 10;
            exponent = exponent.saturating_sub(1);
        }
        if mantissa > MAX_MANTISSA {
            // Only reachable by rounding 9999999999999999 up.
            mantissa /= 10;
            exponent = exponent.saturating_add(1);
        }
        if !(MIN_EXPONENT..=MAX_EXPONENT).contains(&exponent) {
            return Err(Error::OutOfRange(format!(
                "exponent {} is outside the XFL range [{}, {}]",
                exponent, MIN_EXPONENT, MAX_EXPONENT
            )));
        }
        let sign = if negative { 0 } else { SIGN_BIT };
        Ok(Self(
            sign | (((exponent + EXPONENT_BIAS) as u64) << MANTISSA_BITS) | mantissa,
        ))
    }
}

impl FromStr for Xfl {
    type Err = Error;

    /// Parse a decimal literal such as `-12.5`, `1e-81`, or `0.003333333333333333`.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedInput(format!("`{}` is not a decimal number", s));
        let text = s.trim();
        let (negative, body) = match text.as_bytes().first() {
            Some(b'-') => (true, &text[1..]),
            Some(b'+') => (false, &text[1..]),
            _ => (false, text),
        };
        let (number, exp) = match body.find(|c| c == 'e' || c == 'E') {
            Some(i) => (
                &body[..i],
                body[i + 1..].parse::<i64>().map_err(|_| malformed())?,
            ),
            None => (body, 0),
        };
        let (int_part, frac_part) = match number.find('.') {
            Some(i) => (&number[..i], &number[i + 1..]),
            None => (number, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(malformed());
        }
        if !int_part
            .bytes()
            .chain(frac_part.bytes())
            .all(|b| b.is_ascii_digit())
        {
            return Err(malformed());
        }
        let digits: Vec<u8> = int_part.bytes().chain(frac_part.bytes()).collect();
        let exponent = exp.saturating_sub(frac_part.len() as i64);
        Self::from_digits(negative, &digits, exponent)
    }
}

/// Exact decimal form, without exponent notation.
impl fmt::Display for Xfl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0");
        }
        if self.is_negative() {
            f.write_str("-")?;
        }
        let digits = self.mantissa().to_string();
        let exponent = self.exponent() as i64;
        if exponent >= 0 {
            f.write_str(&digits)?;
            return (0..exponent).try_for_each(|_| f.write_str("0"));
        }
        let point = digits.len() as i64 + exponent;
        let (int_part, frac_part) = if point > 0 {
            let (i, r) = digits.split_at(point as usize);
            (i.to_string(), r.to_string())
        } else {
            ("0".to_string(), "0".repeat((-point) as usize) + &digits)
        };
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.is_empty() {
            f.write_str(&int_part)
        } else {
            write!(f, "{}.{}", int_part, frac_part)
        }
    }
}

impl fmt::Debug for Xfl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Xfl({})", self)
    }
}
