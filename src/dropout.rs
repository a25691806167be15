use burn::{prelude::*, tensor::Distribution};

use crate::error::{Result, SegNetError};

/// Whether stochastic layers draw new masks or pass their input through.
///
/// Passed explicitly to every forward call instead of being read from the
/// backend, so the same module can be sampled and evaluated side by side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Mode {
    /// Dropout is active; repeated calls give different outputs.
    Sample,
    /// Dropout is the identity.
    #[default]
    Eval,
}

/// Zeroes whole feature maps, independently for every batch element and
/// channel, and rescales the survivors by `1 / (1 - prob)`.
#[derive(Module, Clone, Debug)]
pub struct ChannelDropout {
    pub prob: f64,
}

impl ChannelDropout {
    pub fn new(prob: f64) -> Result<Self> {
        if !(0.0..1.0).contains(&prob) {
            return Err(SegNetError::InvalidDropout(prob));
        }
        Ok(Self { prob })
    }

    pub fn forward<B: Backend>(&self, input: Tensor<B, 4>, mode: Mode) -> Tensor<B, 4> {
        if mode == Mode::Eval || self.prob == 0.0 {
            return input;
        }

        let [batch, channels, _, _] = input.dims();
        let keep = 1.0 - self.prob;
        let mask = Tensor::<B, 4>::random(
            [batch, channels, 1, 1],
            Distribution::Bernoulli(keep),
            &input.device(),
        );

        input.mul(mask).div_scalar(keep)
    }
}
