//! Scaled-integer arithmetic matching the embedded target.
//!
//! Values are `i32` with an implicit scale factor S. The product of two
//! scaled values carries S^2 and is brought back to S by a `Rescale`, applied
//! to every product term on its own before accumulation. Arithmetic right
//! shift rounds toward negative infinity, so shifting a sum differs from
//! summing shifted terms as soon as one term is negative.

use serde::{Deserialize, Serialize};

use crate::error::{LutError, Result};

/// Reciprocal approximation of a division by a non power-of-two scale:
/// `x / S ≈ (x * mul) >> shift`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reciprocal {
    pub mul: i32,
    pub shift: u32,
}

impl Reciprocal {
    /// Divisor this approximation actually applies: 2^shift / mul.
    pub fn divisor(self) -> f64 {
        (1u64 << self.shift) as f64 / self.mul as f64
    }
}

/// How a product term returns to scale S.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rescale {
    /// Arithmetic right shift by log2(S).
    Shift(u32),
    /// `(x * mul) >> shift` for scales that are not powers of two.
    Reciprocal(Reciprocal),
}

/// Maximum relative error accepted between a reciprocal's divisor and S.
const RECIPROCAL_TOLERANCE: f64 = 0.01;

impl Rescale {
    /// Derive the rescale step for a scale factor.
    ///
    /// Power-of-two scales shift by their log2 and reject a reciprocal.
    /// Any other scale needs a reciprocal within 1% of it.
    pub fn for_scale(scale: i32, reciprocal: Option<Reciprocal>) -> Result<Self> {
        if scale <= 0 {
            return Err(LutError::Config(format!("scale must be positive, got {}", scale)));
        }
        let pow2 = (scale as u32).is_power_of_two();
        match (pow2, reciprocal) {
            (true, None) => Ok(Rescale::Shift(scale.trailing_zeros())),
            (true, Some(_)) => Err(LutError::Config(format!(
                "scale {} is a power of two; it rescales by shift, remove the reciprocal",
                scale
            ))),
            (false, None) => Err(LutError::Config(format!(
                "scale {} is not a power of two and no reciprocal approximation is given",
                scale
            ))),
            (false, Some(r)) => {
                if r.mul <= 0 || r.shift == 0 || r.shift > 30 {
                    return Err(LutError::Config(format!(
                        "reciprocal (* {} >> {}) is malformed",
                        r.mul, r.shift
                    )));
                }
                let err = (r.divisor() - scale as f64).abs() / scale as f64;
                if err > RECIPROCAL_TOLERANCE {
                    return Err(LutError::Config(format!(
                        "reciprocal (* {} >> {}) divides by {:.2}, too far from scale {}",
                        r.mul,
                        r.shift,
                        r.divisor(),
                        scale
                    )));
                }
                Ok(Rescale::Reciprocal(r))
            }
        }
    }

    /// Rescale one product term `a * w`. `None` on 32-bit overflow.
    #[inline]
    pub fn term(self, a: i32, w: i32) -> Option<i32> {
        match self {
            Rescale::Shift(shift) => a.checked_mul(w).map(|p| p >> shift),
            Rescale::Reciprocal(r) => a.checked_mul(w)?.checked_mul(r.mul).map(|p| p >> r.shift),
        }
    }
}

impl std::fmt::Display for Rescale {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Rescale::Shift(s) => write!(f, ">> {}", s),
            Rescale::Reciprocal(r) => write!(f, "* {} >> {}", r.mul, r.shift),
        }
    }
}

/// Accumulator for `bias + Σ rescale(a_i * w_i)` in checked 32-bit arithmetic.
pub struct TermAccum(i32);

impl TermAccum {
    #[inline]
    pub fn new(bias: i32) -> Self {
        Self(bias)
    }

    /// Accumulate one individually rescaled product term.
    #[inline]
    pub fn add_term(&mut self, a: i32, w: i32, rescale: Rescale) -> Option<()> {
        self.0 = self.0.checked_add(rescale.term(a, w)?)?;
        Some(())
    }

    #[inline]
    pub fn finish(self) -> i32 {
        self.0
    }
}

#[inline]
pub fn relu(x: i32) -> i32 {
    x.max(0)
}

/// Truncate to a 16-bit register the way a C `(s16)` cast does.
#[inline]
pub fn narrow16(x: i32) -> i32 {
    x as i16 as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_for_power_of_two() {
        assert_eq!(Rescale::for_scale(1024, None).unwrap(), Rescale::Shift(10));
        assert_eq!(Rescale::for_scale(64, None).unwrap(), Rescale::Shift(6));
        assert_eq!(Rescale::for_scale(1, None).unwrap(), Rescale::Shift(0));
    }

    #[test]
    fn reciprocal_for_thousand() {
        let r = Reciprocal { mul: 33, shift: 15 };
        assert_eq!(
            Rescale::for_scale(1000, Some(r)).unwrap(),
            Rescale::Reciprocal(r)
        );
    }

    #[test]
    fn scale_rescale_disagreement_rejected() {
        assert!(Rescale::for_scale(1000, None).is_err());
        assert!(Rescale::for_scale(1024, Some(Reciprocal { mul: 1, shift: 10 })).is_err());
        // 2^15 / 16 = 2048, nowhere near 1000
        assert!(Rescale::for_scale(1000, Some(Reciprocal { mul: 16, shift: 15 })).is_err());
        assert!(Rescale::for_scale(0, None).is_err());
        assert!(Rescale::for_scale(-1024, None).is_err());
    }

    #[test]
    fn shift_rounds_toward_negative_infinity() {
        let r = Rescale::Shift(10);
        assert_eq!(r.term(1, -1), Some(-1));
        assert_eq!(r.term(1023, 1), Some(0));
        assert_eq!(r.term(-1024, 1), Some(-1));
        assert_eq!(r.term(-1025, 1), Some(-2));
    }

    #[test]
    fn reciprocal_term_matches_firmware_formula() {
        let r = Rescale::Reciprocal(Reciprocal { mul: 33, shift: 15 });
        // ((65 * 150) * 33) >> 15
        assert_eq!(r.term(65, 150), Some((65 * 150 * 33) >> 15));
        assert_eq!(r.term(-64, 169), Some((-64 * 169 * 33) >> 15));
    }

    #[test]
    fn term_overflow_detected() {
        assert_eq!(Rescale::Shift(10).term(i32::MAX, 2), None);
        let mut acc = TermAccum::new(i32::MAX);
        assert_eq!(acc.add_term(1024, 1, Rescale::Shift(10)), None);
    }

    #[test]
    fn accum_per_term_shift_differs_from_shifted_sum() {
        // 700*1 and -300*1: per-term gives 0 + (-1) = -1, shifted sum gives 400 >> 10 = 0
        let rescale = Rescale::Shift(10);
        let mut acc = TermAccum::new(0);
        acc.add_term(700, 1, rescale).unwrap();
        acc.add_term(-300, 1, rescale).unwrap();
        assert_eq!(acc.finish(), -1);
        assert_eq!((700 - 300) >> 10, 0);
    }

    #[test]
    fn relu_and_narrow() {
        assert_eq!(relu(-5), 0);
        assert_eq!(relu(7), 7);
        assert_eq!(narrow16(116_475), -14_597);
        assert_eq!(narrow16(-108_550), 22_522);
        assert_eq!(narrow16(32_767), 32_767);
        assert_eq!(narrow16(32_768), -32_768);
    }
}
