//! A small multilayer perceptron trained with online backpropagation.
//!
//! The core is [`Network`]: a stack of fully connected layers trained one
//! sample at a time. Around it sit a [`Trainer`] that runs training in
//! chunks (optionally on a worker thread), a plain-text weight file format,
//! and readers that turn MNIST style IDX files into a [`Dataset`].

pub mod activator;
pub mod dataset;
pub mod error;
pub mod feed_forward;
pub mod idx;
pub mod layer;
pub mod matrix;
pub mod progress;
pub mod trainer;
pub mod utils;
pub mod weights;

pub use crate::activator::Activator;
pub use crate::dataset::{Dataset, Example};
pub use crate::error::{Error, Result};
pub use crate::feed_forward::Network;
pub use crate::progress::{Progress, Watcher};
pub use crate::trainer::{Logging, Session, StopCondition, StopHandle, Trainer, Training, TrainingReport};
pub use crate::weights::{read_weights, write_weights};
