use burn::{
    nn::{PaddingConfig2d, conv::Conv2dConfig},
    prelude::*,
    tensor::activation::softmax,
};
use log::debug;

use crate::decoder::DecoderBlock;
use crate::dropout::Mode;
use crate::encoder::EncoderBlock;
use crate::error::{self, SegNetError};
use crate::layout::{BlockKind, STAGES, StageLayout, Variant};

/// Output channels and layer count of each encoder stage.
const ENCODERS: [(usize, usize); STAGES] = [(64, 2), (128, 2), (256, 3), (512, 3), (512, 3)];
/// Input channels, output channels and layer count of each decoder stage.
const DECODERS: [(usize, usize, usize); STAGES] = [
    (64, 64, 1),
    (128, 64, 2),
    (256, 128, 3),
    (512, 256, 3),
    (512, 512, 3),
];

/// Smallest height and width that survives all five poolings.
pub const MIN_INPUT_SIZE: usize = 1 << STAGES;

#[derive(Config, Debug)]
pub struct SegNetConfig {
    pub in_channels: usize,
    pub out_channels: usize,
    #[config(default = "StageLayout::plain()")]
    pub layout: StageLayout,
    #[config(default = 0.5)]
    pub dropout: f64,
}

impl SegNetConfig {
    /// Config of one of the named variants.
    pub fn variant(in_channels: usize, out_channels: usize, variant: Variant) -> Self {
        Self::new(in_channels, out_channels).with_layout(variant.layout())
    }

    pub fn init<B: Backend>(&self, device: &B::Device) -> error::Result<SegNet<B>> {
        if self.in_channels == 0 || self.out_channels == 0 {
            return Err(SegNetError::InvalidChannels {
                in_channels: self.in_channels,
                out_channels: self.out_channels,
            });
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(SegNetError::InvalidDropout(self.dropout));
        }
        debug!(
            "building segnet {}->{}: encoders {:?}, decoders {:?}, p={}",
            self.in_channels,
            self.out_channels,
            self.layout.encoders,
            self.layout.decoders,
            self.dropout
        );

        let mut encoders = Vec::with_capacity(STAGES);
        let mut c1 = self.in_channels;
        for ((c2, n), kind) in ENCODERS.into_iter().zip(self.layout.encoders) {
            encoders.push(EncoderBlock::new(c1, c2, n, kind, self.dropout, device)?);
            c1 = c2;
        }

        let decoders = DECODERS
            .into_iter()
            .zip(self.layout.decoders)
            .map(|((c1, c2, n), kind)| DecoderBlock::new(c1, c2, n, kind, self.dropout, device))
            .collect::<error::Result<Vec<_>>>()?;

        let conv = Conv2dConfig::new([DECODERS[0].1, self.out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        Ok(SegNet {
            encoders,
            decoders,
            conv,
            in_channels: self.in_channels,
        })
    }
}

/// What one encoder stage hands to its mirror decoder stage.
#[derive(Debug, Clone)]
pub struct EncoderStage<B: Backend> {
    /// Pooled (and possibly dropped-out) output of the stage.
    pub output: Tensor<B, 4>,
    pub indices: Tensor<B, 4, Int>,
    /// Height and width of the stage input, before pooling.
    pub input_size: [usize; 2],
}

/// Result of the downsampling path, one entry per stage from input to
/// bottleneck.
#[derive(Debug, Clone)]
pub struct Encoding<B: Backend> {
    pub stages: Vec<EncoderStage<B>>,
}

/// SegNet: five index-recording encoder stages, five unpooling decoder
/// stages and a per-pixel softmax classifier.
#[derive(Module, Debug)]
pub struct SegNet<B: Backend> {
    encoders: Vec<EncoderBlock<B>>,
    decoders: Vec<DecoderBlock<B>>,
    conv: nn::conv::Conv2d<B>,
    in_channels: usize,
}

impl<B: Backend> SegNet<B> {
    pub fn layout(&self) -> StageLayout {
        let mut layout = StageLayout::plain();
        for (slot, block) in layout.encoders.iter_mut().zip(&self.encoders) {
            *slot = block.kind();
        }
        for (slot, block) in layout.decoders.iter_mut().zip(&self.decoders) {
            *slot = block.kind();
        }
        layout
    }

    pub fn is_stochastic(&self) -> bool {
        self.encoders.iter().any(|e| e.kind() == BlockKind::Bayesian)
            || self.decoders.iter().any(|d| d.kind() == BlockKind::Bayesian)
    }

    /// Runs the downsampling path.
    pub fn encode(&self, images: Tensor<B, 4>, mode: Mode) -> error::Result<Encoding<B>> {
        let [_, channels, height, width] = images.dims();
        if channels != self.in_channels {
            return Err(SegNetError::ChannelMismatch {
                got: channels,
                expected: self.in_channels,
            });
        }
        if height < MIN_INPUT_SIZE || width < MIN_INPUT_SIZE {
            return Err(SegNetError::InputTooSmall {
                height,
                width,
                min: MIN_INPUT_SIZE,
            });
        }

        let mut stages = Vec::with_capacity(STAGES);
        let mut x = images;
        for encoder in &self.encoders {
            let [_, _, h, w] = x.dims();
            let (output, indices) = encoder.forward(x, mode);
            x = output.clone();
            stages.push(EncoderStage {
                output,
                indices,
                input_size: [h, w],
            });
        }
        Ok(Encoding { stages })
    }

    /// Runs the upsampling path and the classifier, consuming each stage's
    /// indices in reverse order.
    pub fn decode(&self, encoding: Encoding<B>, mode: Mode) -> error::Result<Tensor<B, 4>> {
        if encoding.stages.len() != self.decoders.len() {
            return Err(SegNetError::StageCount {
                got: encoding.stages.len(),
                expected: self.decoders.len(),
            });
        }

        let mut x = None;
        for (decoder, stage) in self.decoders.iter().rev().zip(encoding.stages.into_iter().rev()) {
            // the bottleneck output seeds the first decoder
            let input = x.unwrap_or(stage.output);
            x = Some(decoder.forward(input, stage.indices, Some(stage.input_size), mode)?);
        }
        let Some(x) = x else {
            return Err(SegNetError::StageCount {
                got: 0,
                expected: self.decoders.len(),
            });
        };

        let x = self.conv.forward(x);
        Ok(softmax(x, 1))
    }

    /// # Shapes
    ///   - Images `[batch, in_channels, height, width]`
    ///   - Output `[batch, out_channels, height, width]`, a probability
    ///     distribution over channels at every pixel
    pub fn forward(&self, images: Tensor<B, 4>, mode: Mode) -> error::Result<Tensor<B, 4>> {
        let encoding = self.encode(images, mode)?;
        self.decode(encoding, mode)
    }
}
