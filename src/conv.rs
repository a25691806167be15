use burn::{
    nn::{BatchNorm, BatchNormConfig, PaddingConfig2d, Relu, conv::Conv2dConfig},
    prelude::*,
};

const KERNEL_SIZE: [usize; 2] = [3, 3];

/// 3x3 convolution followed by batch normalization and a ReLU.
///
/// Padding keeps the spatial size, so only the channel count changes.
///
/// Normalization does not look at [`Mode`](crate::Mode): burn normalizes with
/// batch statistics on an autodiff backend and with the running statistics
/// otherwise. `Mode::Sample` on an inference backend only switches dropout.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv: nn::conv::Conv2d<B>,
    norm: BatchNorm<B, 2>,
    activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn new(c1: usize, c2: usize, device: &B::Device) -> Self {
        let conv = Conv2dConfig::new([c1, c2], KERNEL_SIZE)
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let norm = BatchNormConfig::new(c2).init(device);

        Self {
            conv,
            norm,
            activation: Relu::new(),
        }
    }

    pub fn forward(&self, input: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.conv.forward(input);
        let x = self.norm.forward(x);
        self.activation.forward(x)
    }
}

/// Builds the `c1 -> c2` unit followed by `n - 1` units of `c2 -> c2`.
pub(crate) fn stack<B: Backend>(
    c1: usize,
    c2: usize,
    n: usize,
    device: &B::Device,
) -> Vec<ConvBlock<B>> {
    (0..n)
        .map(|i| ConvBlock::new(if i == 0 { c1 } else { c2 }, c2, device))
        .collect()
}
