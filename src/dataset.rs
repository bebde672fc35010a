//! Encodes raw labelled images into network inputs and expected outputs.

use crate::error::{Error, Result};
use crate::idx::Images;

use std::ops::Deref;

/// A `(network input, expected output)` pair.
pub type Example = (Vec<f64>, Vec<f64>);

/// Scales each byte into `[0, 1]`.
pub fn normalize_image(pixels: &[u8]) -> Vec<f64> {
    pixels.iter().map(|&p| f64::from(p) / 255.0).collect()
}

/// Returns a vector of `num_classes` zeros with a single one at `label`.
pub fn one_hot(label: usize, num_classes: usize) -> Result<Vec<f64>> {
    if label >= num_classes {
        return Err(Error::invalid(format!(
            "label {label} is out of range for {num_classes} classes"
        )));
    }
    let mut encoded = vec![0.0; num_classes];
    encoded[label] = 1.0;
    Ok(encoded)
}

/// An ordered list of training examples.
///
/// Dereferences to `[Example]`, so it can be passed straight to
/// `Network::train`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    examples: Vec<Example>,
}

impl Dataset {
    /// Pairs each input with the expected output at the same index.
    pub fn from_parts(inputs: Vec<Vec<f64>>, targets: Vec<Vec<f64>>) -> Result<Self> {
        if inputs.len() != targets.len() {
            return Err(Error::invalid(format!(
                "{} inputs but {} expected outputs",
                inputs.len(),
                targets.len()
            )));
        }
        Ok(inputs.into_iter().zip(targets).collect())
    }

    /// Normalizes the first `limit` images (all of them if `None`) and
    /// one-hot encodes their labels.
    pub fn encode(images: &Images, labels: &[u8], num_classes: usize, limit: Option<usize>) -> Result<Self> {
        if images.len() != labels.len() {
            return Err(Error::invalid(format!(
                "{} images but {} labels",
                images.len(),
                labels.len()
            )));
        }
        let count = limit.map_or(images.len(), |limit| limit.min(images.len()));
        (0..count)
            .map(|i| {
                let input = normalize_image(images.image(i));
                let target = one_hot(usize::from(labels[i]), num_classes)?;
                Ok((input, target))
            })
            .collect()
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    /// Width of each input, or 0 for an empty dataset.
    pub fn input_len(&self) -> usize {
        self.examples.first().map_or(0, |(input, _)| input.len())
    }

    /// Width of each expected output, or 0 for an empty dataset.
    pub fn target_len(&self) -> usize {
        self.examples.first().map_or(0, |(_, target)| target.len())
    }
}

impl Deref for Dataset {
    type Target = [Example];

    fn deref(&self) -> &[Example] {
        &self.examples
    }
}

impl FromIterator<Example> for Dataset {
    fn from_iter<T: IntoIterator<Item = Example>>(iter: T) -> Self {
        Dataset {
            examples: iter.into_iter().collect(),
        }
    }
}
