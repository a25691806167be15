pub mod conv;
pub mod decoder;
pub mod dropout;
pub mod encoder;
pub mod error;
pub mod layout;
pub mod model;
pub mod pool;
pub mod uncertainty;

pub use crate::dropout::{ChannelDropout, Mode};
pub use crate::error::{Result, SegNetError};
pub use crate::layout::{BlockKind, StageLayout, Variant};
pub use crate::model::{Encoding, EncoderStage, SegNet, SegNetConfig};
pub use crate::uncertainty::{McPrediction, monte_carlo};
