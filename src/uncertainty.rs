use burn::prelude::*;
use log::debug;

use crate::dropout::Mode;
use crate::error::{Result, SegNetError};
use crate::model::SegNet;

const EPSILON: f64 = 1e-12;

/// Per-pixel statistics of repeated stochastic forward passes.
#[derive(Debug, Clone)]
pub struct McPrediction<B: Backend> {
    /// Mean class probabilities, `[batch, classes, height, width]`.
    pub mean: Tensor<B, 4>,
    /// Variance of each class probability across samples.
    pub variance: Tensor<B, 4>,
    /// Entropy of the mean distribution, `[batch, height, width]`.
    pub entropy: Tensor<B, 3>,
    pub samples: usize,
}

impl<B: Backend> McPrediction<B> {
    /// Most probable class at every pixel, `[batch, height, width]`.
    pub fn labels(&self) -> Tensor<B, 3, Int> {
        self.mean.clone().argmax(1).squeeze::<3>(1)
    }
}

/// Runs `samples` forward passes with dropout active and summarizes them.
///
/// A network without Bayesian stages yields zero variance.
pub fn monte_carlo<B: Backend>(
    model: &SegNet<B>,
    images: Tensor<B, 4>,
    samples: usize,
) -> Result<McPrediction<B>> {
    if samples == 0 {
        return Err(SegNetError::NoSamples);
    }
    if !model.is_stochastic() {
        debug!("sampling a network without dropout stages, all {samples} draws will agree");
    }

    let mut sum: Option<Tensor<B, 4>> = None;
    let mut sum_sq: Option<Tensor<B, 4>> = None;
    for i in 0..samples {
        let probs = model.forward(images.clone(), Mode::Sample)?;
        let sq = probs.clone().powf_scalar(2.0);
        sum = Some(match sum {
            Some(acc) => acc.add(probs),
            None => probs,
        });
        sum_sq = Some(match sum_sq {
            Some(acc) => acc.add(sq),
            None => sq,
        });
        debug!("monte carlo sample {}/{samples}", i + 1);
    }
    let (Some(sum), Some(sum_sq)) = (sum, sum_sq) else {
        return Err(SegNetError::NoSamples);
    };

    let n = samples as f64;
    let mean = sum.div_scalar(n);
    let variance = sum_sq
        .div_scalar(n)
        .sub(mean.clone().powf_scalar(2.0))
        .clamp_min(0.0);
    let entropy = mean
        .clone()
        .mul(mean.clone().add_scalar(EPSILON).log())
        .sum_dim(1)
        .neg()
        .squeeze::<3>(1);

    Ok(McPrediction {
        mean,
        variance,
        entropy,
        samples,
    })
}
