use std::{
    error::Error,
    fmt::{self, Display},
};

/// The result type used across the crate.
pub type Result<T> = std::result::Result<T, SegNetError>;

/// Failures the network can detect before handing tensors to the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum SegNetError {
    InvalidChannels {
        in_channels: usize,
        out_channels: usize,
    },
    InvalidDropout(f64),
    EmptyBlock {
        in_channels: usize,
        out_channels: usize,
    },
    ChannelMismatch {
        got: usize,
        expected: usize,
    },
    InputTooSmall {
        height: usize,
        width: usize,
        min: usize,
    },
    UnpoolSize {
        input: [usize; 2],
        target: [usize; 2],
    },
    StageCount {
        got: usize,
        expected: usize,
    },
    NoSamples,
    UnknownVariant(String),
}

impl Display for SegNetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SegNetError::InvalidChannels {
                in_channels,
                out_channels,
            } => write!(
                f,
                "channel counts must be positive, got {in_channels} in and {out_channels} out"
            ),
            SegNetError::InvalidDropout(p) => {
                write!(f, "dropout probability must lie in [0, 1), got {p}")
            }
            SegNetError::EmptyBlock {
                in_channels,
                out_channels,
            } => write!(
                f,
                "block {in_channels}->{out_channels} needs at least one convolution layer"
            ),
            SegNetError::ChannelMismatch { got, expected } => {
                write!(f, "input has {got} channels, the network expects {expected}")
            }
            SegNetError::InputTooSmall { height, width, min } => write!(
                f,
                "input of {height}x{width} is too small, both sides must be at least {min}"
            ),
            SegNetError::UnpoolSize { input, target } => write!(
                f,
                "cannot unpool {}x{} into {}x{}, each side must be twice the input or one more",
                input[0], input[1], target[0], target[1]
            ),
            SegNetError::StageCount { got, expected } => {
                write!(f, "encoding holds {got} stages, the decoder needs {expected}")
            }
            SegNetError::NoSamples => write!(f, "monte carlo prediction needs at least one sample"),
            SegNetError::UnknownVariant(name) => write!(f, "unknown network variant: {name}"),
        }
    }
}

impl Error for SegNetError {}
