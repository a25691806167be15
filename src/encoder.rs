use burn::prelude::*;

use crate::conv::{ConvBlock, stack};
use crate::dropout::{ChannelDropout, Mode};
use crate::error::{Result, SegNetError};
use crate::layout::BlockKind;
use crate::pool::max_pool;

/// Convolution stack followed by an index-recording max-pool.
///
/// A [`BlockKind::Bayesian`] block also drops channels of the pooled output
/// when run in [`Mode::Sample`].
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    layers: Vec<ConvBlock<B>>,
    dropout: Option<ChannelDropout>,
}

impl<B: Backend> EncoderBlock<B> {
    /// Creates a new encoder block.
    ///
    /// # Arguments
    /// * `c1`: Input channels.
    /// * `c2`: Output channels of every convolution.
    /// * `n`: Number of convolution units, at least one.
    /// * `kind`: Whether the pooled output goes through channel dropout.
    /// * `p`: Dropout probability, ignored for plain blocks.
    pub fn new(
        c1: usize,
        c2: usize,
        n: usize,
        kind: BlockKind,
        p: f64,
        device: &B::Device,
    ) -> Result<Self> {
        if n == 0 {
            return Err(SegNetError::EmptyBlock {
                in_channels: c1,
                out_channels: c2,
            });
        }
        let dropout = match kind {
            BlockKind::Plain => None,
            BlockKind::Bayesian => Some(ChannelDropout::new(p)?),
        };

        Ok(Self {
            layers: stack(c1, c2, n, device),
            dropout,
        })
    }

    pub fn kind(&self) -> BlockKind {
        match self.dropout {
            Some(_) => BlockKind::Bayesian,
            None => BlockKind::Plain,
        }
    }

    /// Output of the convolution stack, before pooling.
    pub fn features(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        self.layers.iter().fold(input, |x, layer| layer.forward(x))
    }

    /// # Shapes
    ///   - Input `[batch, c1, h, w]`
    ///   - Output `[batch, c2, h / 2, w / 2]` and indices of the same shape
    pub fn forward(&self, input: Tensor<B, 4>, mode: Mode) -> (Tensor<B, 4>, Tensor<B, 4, Int>) {
        let (x, indices) = max_pool(self.features(input));
        let x = match &self.dropout {
            Some(dropout) => dropout.forward(x, mode),
            None => x,
        };
        (x, indices)
    }
}
