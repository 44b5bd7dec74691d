//! Walk the full quantized domain and tabulate a policy.
//!
//! The output buffer is preallocated to the table's entry count and split
//! into one contiguous slice per ball_x value. Each slice is filled in
//! nesting order by a single worker, so the position of every decision is
//! its flat index no matter how rayon schedules the slices.

use rayon::prelude::*;
use tracing::debug;

use super::domain::{Axes, QuantizedState};
use crate::error::Result;
use crate::policy::Policy;

/// Tabulate `policy` over every state, slices in parallel.
pub fn enumerate<P: Policy + ?Sized>(axes: &Axes, policy: &P) -> Result<Vec<u8>> {
    let mut codes = vec![0u8; axes.entries()];
    let slice_len = axes.slice_len();
    codes
        .par_chunks_mut(slice_len)
        .enumerate()
        .try_for_each(|(bx, slice)| fill_slice(axes, policy, bx as u32, slice))?;
    Ok(codes)
}

/// Same table as [`enumerate`], one slice after another on this thread.
pub fn enumerate_serial<P: Policy + ?Sized>(axes: &Axes, policy: &P) -> Result<Vec<u8>> {
    let mut codes = vec![0u8; axes.entries()];
    let slice_len = axes.slice_len();
    for (bx, slice) in codes.chunks_mut(slice_len).enumerate() {
        fill_slice(axes, policy, bx as u32, slice)?;
    }
    Ok(codes)
}

/// Fill the slice of one ball_x value. Inner axes nest by, vx, vy, ay.
fn fill_slice<P: Policy + ?Sized>(
    axes: &Axes,
    policy: &P,
    ball_x: u32,
    slice: &mut [u8],
) -> Result<()> {
    let mut out = slice.iter_mut();
    for ball_y in 0..axes.ball_y.steps {
        for ball_vx in 0..axes.ball_vx.steps {
            for ball_vy in 0..axes.ball_vy.steps {
                for ai_y in 0..axes.ai_y.steps {
                    let q = QuantizedState {
                        ball_x,
                        ball_y,
                        ball_vx,
                        ball_vy,
                        ai_y,
                    };
                    let code = policy.decide(&axes.raw_state(&q))?;
                    if let Some(slot) = out.next() {
                        *slot = code;
                    }
                }
            }
        }
    }
    debug!(ball_x, entries = slice.len(), "slice done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LutError;
    use crate::lut::domain::{AxisSpec, RawState};

    fn axes() -> Axes {
        Axes {
            ball_x: AxisSpec::new(5, 0, 3),
            ball_y: AxisSpec::new(3, 0, 3),
            ball_vx: AxisSpec::new(3, -1, 0),
            ball_vy: AxisSpec::new(2, 0, 0),
            ai_y: AxisSpec::new(4, 0, 3),
        }
    }

    /// Encodes the raw state into a code so any misplaced entry shows.
    struct Checksum;

    impl Policy for Checksum {
        fn decide(&self, raw: &RawState) -> Result<u8> {
            let mix = raw.ball_x / 8 * 7 + raw.ball_y / 8 * 5 + (raw.ball_vx + 1) * 3 + raw.ball_vy * 11 + raw.ai_y / 8;
            Ok((mix % 251) as u8)
        }

        fn describe(&self) -> String {
            "checksum".into()
        }
    }

    struct FailAt(i32);

    impl Policy for FailAt {
        fn decide(&self, raw: &RawState) -> Result<u8> {
            if raw.ball_x == self.0 {
                return Err(LutError::Overflow {
                    stage: "test",
                    unit: 0,
                });
            }
            Ok(1)
        }

        fn describe(&self) -> String {
            "fail".into()
        }
    }

    #[test]
    fn position_equals_flat_index() {
        let axes = axes();
        let codes = enumerate(&axes, &Checksum).unwrap();
        assert_eq!(codes.len(), axes.entries());
        for (index, &code) in codes.iter().enumerate() {
            let q = axes.decode(index).unwrap();
            let expected = Checksum.decide(&axes.raw_state(&q)).unwrap();
            assert_eq!(code, expected, "index {} state {}", index, q);
        }
    }

    #[test]
    fn parallel_matches_serial() {
        let axes = axes();
        assert_eq!(
            enumerate(&axes, &Checksum).unwrap(),
            enumerate_serial(&axes, &Checksum).unwrap()
        );
    }

    #[test]
    fn policy_error_aborts() {
        let axes = axes();
        assert!(enumerate(&axes, &FailAt(24)).is_err());
        assert!(enumerate_serial(&axes, &FailAt(24)).is_err());
        assert!(enumerate(&axes, &FailAt(1000)).is_ok());
    }
}
