use burn::prelude::*;

use crate::conv::ConvBlock;
use crate::dropout::{ChannelDropout, Mode};
use crate::error::{Result, SegNetError};
use crate::layout::BlockKind;
use crate::pool::max_unpool;

/// Index-driven unpooling followed by a convolution stack.
///
/// All units but the last keep `c1` channels; the last maps `c1 -> c2`.
#[derive(Module, Debug)]
pub struct DecoderBlock<B: Backend> {
    layers: Vec<ConvBlock<B>>,
    dropout: Option<ChannelDropout>,
}

impl<B: Backend> DecoderBlock<B> {
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
        let layers = (0..n)
            .map(|i| ConvBlock::new(c1, if i + 1 == n { c2 } else { c1 }, device))
            .collect();

        Ok(Self { layers, dropout })
    }

    pub fn kind(&self) -> BlockKind {
        match self.dropout {
            Some(_) => BlockKind::Bayesian,
            None => BlockKind::Plain,
        }
    }

    /// # Shapes
    ///   - Input `[batch, c1, h, w]` with indices of the same shape
    ///   - Output `[batch, c2, output_size[0], output_size[1]]`, or
    ///     `[batch, c2, 2h, 2w]` without an output size
    pub fn forward(
        &self,
        input: Tensor<B, 4>,
        indices: Tensor<B, 4, Int>,
        output_size: Option<[usize; 2]>,
        mode: Mode,
    ) -> Result<Tensor<B, 4>> {
        let x = max_unpool(input, indices, output_size)?;
        let x = self.layers.iter().fold(x, |x, layer| layer.forward(x));
        Ok(match &self.dropout {
            Some(dropout) => dropout.forward(x, mode),
            None => x,
        })
    }
}
