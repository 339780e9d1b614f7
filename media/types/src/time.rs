/*!
Timestamps and time bases.

Presentation times are plain tick counts; what a tick means comes from
the [`Rational`] time base they are paired with. Conversions between
time bases go through [`Rational::rescale`], which works in integer
arithmetic end to end so repeated conversions never accumulate drift.
*/

use std::fmt;

/** A presentation or decode timestamp, counted in time-base ticks. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Pts(pub i64);

impl fmt::Display for Pts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/** A span measured in time-base ticks, e.g. a packet duration. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MediaDuration(pub i64);

/** An exact fraction, used for time bases and frame rates. */
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rational {
    pub num: i32,
    pub den: i32,
}

impl Rational {
    pub const fn new(num: i32, den: i32) -> Self {
        Rational { num, den }
    }

    /** The reciprocal, e.g. a frame rate turned into a time base. */
    pub const fn inverse(self) -> Self {
        Rational {
            num: self.den,
            den: self.num,
        }
    }

    pub fn to_f64(self) -> f64 {
        if self.den == 0 {
            return 0.0;
        }
        f64::from(self.num) / f64::from(self.den)
    }

    /**
    Convert a tick count from one time base to another.

    The cross multiplication runs in 128-bit integers and truncates
    toward zero only at the final division, so values that divide
    evenly convert without any loss. `from.den` and `to.num` must be
    nonzero.
    */
    pub fn rescale(ts: i64, from: Rational, to: Rational) -> i64 {
        if from == to {
            return ts;
        }
        let num = ts as i128 * from.num as i128 * to.den as i128;
        let den = from.den as i128 * to.num as i128;
        (num / den) as i64
    }
}

impl fmt::Display for Rational {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.num, self.den)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rescale_is_identity_for_equal_bases() {
        let tb = Rational::new(1, 90_000);
        assert_eq!(Rational::rescale(12_345, tb, tb), 12_345);
    }

    #[test]
    fn rescale_frame_ticks_to_ninety_khz() {
        let from = Rational::new(1, 25);
        let to = Rational::new(1, 90_000);
        assert_eq!(Rational::rescale(0, from, to), 0);
        assert_eq!(Rational::rescale(1, from, to), 3_600);
        assert_eq!(Rational::rescale(9, from, to), 32_400);
    }

    #[test]
    fn rescale_stays_exact_over_long_runs() {
        let from = Rational::new(1, 25);
        let to = Rational::new(1, 90_000);
        for ts in 0..10_000i64 {
            assert_eq!(Rational::rescale(ts, from, to), ts * 3_600);
        }
    }

    #[test]
    fn rescale_truncates_toward_zero() {
        let from = Rational::new(1, 3);
        let to = Rational::new(1, 2);
        assert_eq!(Rational::rescale(1, from, to), 0);
        assert_eq!(Rational::rescale(-1, from, to), 0);
        assert_eq!(Rational::rescale(4, from, to), 2);
    }

    #[test]
    fn rescale_survives_large_timestamps() {
        let from = Rational::new(1, 90_000);
        let to = Rational::new(1, 90_000_000);
        let ts = i64::MAX / 2_000;
        assert_eq!(Rational::rescale(ts, from, to), ts * 1_000);
    }

    #[test]
    fn inverse_swaps_numerator_and_denominator() {
        assert_eq!(Rational::new(25, 1).inverse(), Rational::new(1, 25));
    }

    #[test]
    fn to_f64_handles_zero_denominator() {
        assert_eq!(Rational::new(1, 0).to_f64(), 0.0);
        assert!((Rational::new(30_000, 1_001).to_f64() - 29.97).abs() < 0.01);
    }
}
