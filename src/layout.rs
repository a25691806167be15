use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::SegNetError;

/// Number of encoder (and decoder) stages in the network.
pub const STAGES: usize = 5;

/// Whether a stage ends with channel dropout.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    #[default]
    Plain,
    Bayesian,
}

/// Block kind of every encoder and decoder stage, indexed by stage.
///
/// Stage 0 sits next to the input and output, stage 4 at the bottleneck.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageLayout {
    pub encoders: [BlockKind; STAGES],
    pub decoders: [BlockKind; STAGES],
}

impl StageLayout {
    pub fn plain() -> Self {
        Self::default()
    }

    pub fn is_stochastic(&self) -> bool {
        self.encoders
            .iter()
            .chain(self.decoders.iter())
            .any(|kind| *kind == BlockKind::Bayesian)
    }
}

/// The named stage layouts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    /// No dropout anywhere.
    Plain,
    /// Every encoder stage drops channels.
    BayesEncoder,
    /// Encoders and decoders of stages 2 to 4 drop channels.
    BayesCenter,
    /// Every decoder stage drops channels.
    BayesDecoder,
    /// All ten stages drop channels.
    BayesFull,
}

impl Variant {
    pub const ALL: [Variant; 5] = [
        Variant::Plain,
        Variant::BayesEncoder,
        Variant::BayesCenter,
        Variant::BayesDecoder,
        Variant::BayesFull,
    ];

    pub fn layout(self) -> StageLayout {
        use BlockKind::{Bayesian as B, Plain as P};

        let (encoders, decoders) = match self {
            Variant::Plain => ([P; STAGES], [P; STAGES]),
            Variant::BayesEncoder => ([B; STAGES], [P; STAGES]),
            Variant::BayesCenter => ([P, P, B, B, B], [P, P, B, B, B]),
            Variant::BayesDecoder => ([P; STAGES], [B; STAGES]),
            Variant::BayesFull => ([B; STAGES], [B; STAGES]),
        };
        StageLayout { encoders, decoders }
    }

    pub fn name(self) -> &'static str {
        match self {
            Variant::Plain => "plain",
            Variant::BayesEncoder => "bayes-encoder",
            Variant::BayesCenter => "bayes-center",
            Variant::BayesDecoder => "bayes-decoder",
            Variant::BayesFull => "bayes-full",
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Variant {
    type Err = SegNetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Variant::ALL
            .into_iter()
            .find(|variant| variant.name() == s)
            .ok_or_else(|| SegNetError::UnknownVariant(s.to_string()))
    }
}

impl From<Variant> for StageLayout {
    fn from(variant: Variant) -> Self {
        variant.layout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_variant_keeps_outer_stages_plain() {
        let layout = Variant::BayesCenter.layout();

        for stage in 0..2 {
            assert_eq!(layout.encoders[stage], BlockKind::Plain);
            assert_eq!(layout.decoders[stage], BlockKind::Plain);
        }
        for stage in 2..STAGES {
            assert_eq!(layout.encoders[stage], BlockKind::Bayesian);
            assert_eq!(layout.decoders[stage], BlockKind::Bayesian);
        }
    }

    #[test]
    fn encoder_variant_leaves_decoders_plain() {
        let layout = Variant::BayesEncoder.layout();
        assert!(layout.encoders.iter().all(|k| *k == BlockKind::Bayesian));
        assert!(layout.decoders.iter().all(|k| *k == BlockKind::Plain));
    }

    #[test]
    fn only_plain_is_deterministic() {
        for variant in Variant::ALL {
            assert_eq!(
                variant.layout().is_stochastic(),
                variant != Variant::Plain,
                "{variant}"
            );
        }
    }

    #[test]
    fn names_parse_back() {
        for variant in Variant::ALL {
            assert_eq!(variant.to_string().parse::<Variant>().unwrap(), variant);
        }
        assert_eq!(
            "bayes".parse::<Variant>().unwrap_err(),
            SegNetError::UnknownVariant("bayes".to_string())
        );
    }
}
