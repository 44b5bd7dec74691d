//! Forward pass, bit-exact with the embedded routine.
//!
//! 1. `sum_h = bias1[h] + Σ_i rescale(input[i] * w1[i][h])`
//! 2. `hidden[h] = max(sum_h, 0)`
//! 3. `score_o = bias2[o] + Σ_h rescale(hidden[h] * w2[h][o])`, no activation
//!
//! Every product is rescaled on its own before it is added. Accumulation is
//! checked 32-bit; an overflow is an error because the target would wrap.

use super::{select, Weights, HIDDEN, INPUTS, OUTPUTS};
use crate::error::{LutError, Result};
use crate::fixed::{narrow16, relu, Rescale, TermAccum};

/// Intermediate values of one forward pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForwardTrace {
    pub inputs: [i32; INPUTS],
    pub hidden: [i32; HIDDEN],
    pub scores: [i32; OUTPUTS],
    pub decision: u8,
}

#[derive(Clone, Debug)]
pub struct Network {
    weights: Weights,
    rescale: Rescale,
    /// Store each finished sum in a 16-bit register, as firmware with `s16`
    /// hidden/output arrays does.
    narrow: bool,
}

impl Network {
    pub fn new(weights: Weights, rescale: Rescale, narrow: bool) -> Self {
        Self {
            weights,
            rescale,
            narrow,
        }
    }

    pub fn weights(&self) -> &Weights {
        &self.weights
    }

    pub fn rescale(&self) -> Rescale {
        self.rescale
    }

    #[inline]
    fn store(&self, sum: i32) -> i32 {
        if self.narrow {
            narrow16(sum)
        } else {
            sum
        }
    }

    /// Hidden layer activations.
    pub fn hidden(&self, inputs: &[i32; INPUTS]) -> Result<[i32; HIDDEN]> {
        let w = &self.weights;
        let mut hidden = [0i32; HIDDEN];
        for (h, out) in hidden.iter_mut().enumerate() {
            let mut acc = TermAccum::new(w.b1[h]);
            for (i, &x) in inputs.iter().enumerate() {
                acc.add_term(x, w.w1[i][h], self.rescale)
                    .ok_or(LutError::Overflow {
                        stage: "hidden",
                        unit: h,
                    })?;
            }
            *out = relu(self.store(acc.finish()));
        }
        Ok(hidden)
    }

    /// Output scores from hidden activations.
    pub fn scores(&self, hidden: &[i32; HIDDEN]) -> Result<[i32; OUTPUTS]> {
        let w = &self.weights;
        let mut scores = [0i32; OUTPUTS];
        for (o, out) in scores.iter_mut().enumerate() {
            let mut acc = TermAccum::new(w.b2[o]);
            for (h, &x) in hidden.iter().enumerate() {
                acc.add_term(x, w.w2[h][o], self.rescale)
                    .ok_or(LutError::Overflow {
                        stage: "output",
                        unit: o,
                    })?;
            }
            *out = self.store(acc.finish());
        }
        Ok(scores)
    }

    /// Forward pass to output scores.
    pub fn forward(&self, inputs: &[i32; INPUTS]) -> Result<[i32; OUTPUTS]> {
        self.scores(&self.hidden(inputs)?)
    }

    /// Forward pass to a decision code.
    #[inline]
    pub fn decide(&self, inputs: &[i32; INPUTS]) -> Result<u8> {
        Ok(select(&self.forward(inputs)?))
    }

    /// Forward pass keeping every intermediate value.
    pub fn trace(&self, inputs: &[i32; INPUTS]) -> Result<ForwardTrace> {
        let hidden = self.hidden(inputs)?;
        let scores = self.scores(&hidden)?;
        Ok(ForwardTrace {
            inputs: *inputs,
            hidden,
            scores,
            decision: select(&scores),
        })
    }
}

impl ForwardTrace {
    pub fn format_report(&self) -> String {
        let join = |v: &[i32]| v.iter().map(|x| x.to_string()).collect::<Vec<_>>().join(", ");
        format!(
            "inputs   [{}]\nhidden   [{}]\nscores   [{}]\ndecision {}\n",
            join(&self.inputs),
            join(&self.hidden),
            join(&self.scores),
            self.decision
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixed::Reciprocal;

    fn trained() -> Network {
        Network::new(Weights::trained(), Rescale::Shift(10), false)
    }

    #[test]
    fn golden_origin_tile_ratio() {
        let t = trained().trace(&[0, 0, 512, 512, 0]).unwrap();
        assert_eq!(t.hidden, [0, 1929, 0, 0, 1825, 0, 214, 2032]);
        assert_eq!(t.scores, [5231, 5357, 5263]);
        assert_eq!(t.decision, 1);
    }

    #[test]
    fn golden_far_corner() {
        let t = trained().trace(&[1024, 1024, 0, 1024, 0]).unwrap();
        assert_eq!(t.hidden, [2742, 667, 0, 843, 488, 0, 0, 288]);
        assert_eq!(t.scores, [-4702, -4788, -4485]);
        assert_eq!(t.decision, 2);
    }

    #[test]
    fn golden_direct_bitshift_inputs() {
        let n = trained();
        assert_eq!(n.forward(&[0, 0, 0, 0, 0]).unwrap(), [2796, 2869, 2838]);
        assert_eq!(n.forward(&[65, 64, 64, -32, 46]).unwrap(), [2743, 2826, 2774]);
    }

    #[test]
    fn per_term_shift_order_matters() {
        // Summing before shifting would give a different score for this input.
        let n = trained();
        let inputs = [525, 530, 1024, 256, 379];
        let w = n.weights();
        let per_term = n.hidden(&inputs).unwrap();
        let mut differs = false;
        for h in 0..HIDDEN {
            let raw: i32 = (0..INPUTS).map(|i| inputs[i] * w.w1[i][h]).sum();
            let shifted_sum = relu(w.b1[h] + (raw >> 10));
            differs |= shifted_sum != per_term[h];
        }
        assert!(differs, "per-term and summed shifting agree on every unit");
        assert_eq!(per_term, [0, 2171, 0, 0, 2006, 0, 0, 2337]);
    }

    #[test]
    fn reciprocal_and_narrow_storage() {
        let rescale = Rescale::Reciprocal(Reciprocal { mul: 33, shift: 15 });
        let n = Network::new(Weights::trained_1000(), rescale, true);
        let t = n.trace(&[0, 0, 0, 0, 0]).unwrap();
        assert_eq!(t.hidden, [0, 0, 0, 0, 0, 8, 0, 112]);
        assert_eq!(t.scores, [-263, 65, -8]);
        assert_eq!(t.decision, 1);

        let t = n.trace(&[65, 64, 64, -32, 46]).unwrap();
        assert_eq!(t.scores, [-269, 49, -10]);
    }

    #[test]
    fn narrow_storage_changes_debug_decision() {
        let wide = Network::new(Weights::debug(), Rescale::Shift(6), false);
        let narrow = Network::new(Weights::debug(), Rescale::Shift(6), true);
        let origin = [0, 0, 0, 0, 0];
        assert_eq!(wide.forward(&origin).unwrap(), [116_475, -108_550, 109_075]);
        assert_eq!(narrow.forward(&origin).unwrap(), [-14_597, 22_522, -21_997]);
        assert_eq!(wide.decide(&origin).unwrap(), 0);
        assert_eq!(narrow.decide(&origin).unwrap(), 1);

        let inputs = [65, 64, 64, -32, 46];
        assert_eq!(wide.decide(&inputs).unwrap(), 0);
        assert_eq!(narrow.decide(&inputs).unwrap(), 2);
    }

    #[test]
    fn overflow_is_an_error() {
        let mut w = Weights::trained();
        w.w1[0][3] = i32::MAX / 2;
        let n = Network::new(w, Rescale::Shift(10), false);
        let err = n.forward(&[1024, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(err, LutError::Overflow { stage: "hidden", unit: 3 }));
    }

    #[test]
    fn report_lists_every_stage() {
        let report = trained().trace(&[0, 0, 512, 512, 0]).unwrap().format_report();
        assert!(report.contains("scores   [5231, 5357, 5263]"));
        assert!(report.ends_with("decision 1\n"));
    }
}
