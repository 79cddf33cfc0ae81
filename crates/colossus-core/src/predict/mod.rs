//! Split prediction: a tree per player whose nodes are legions, refined as
//! splits, reveals and losses are observed.

pub mod config;
pub mod error;
pub mod multiset;
pub mod node;
pub mod predictor;
mod splitter;

pub use config::{PredictorConfig, Propagation};
pub use error::PredictError;
pub use multiset::CreatureMultiset;
pub use node::{Node, NodeId, SplitChildren};
pub use predictor::SplitPredictor;
