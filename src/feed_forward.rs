//! A [Feedforward neural network]
//! (https://en.wikipedia.org/wiki/Feedforward_neural_network).
//!
//! # Example
//!
//! Let's teach a small network to tell two patterns apart:
//!
//! ```
//! # use neuralnet::feed_forward::*;
//! let examples = [(vec![1.0, 0.0], vec![1.0, 0.0]),
//!                 (vec![0.0, 1.0], vec![0.0, 1.0])];
//!
//! let mut network = Network::new(&[2, 3, 2]).unwrap();
//! network.train(&examples, 1000, 0.5).unwrap();
//! assert!(network.current_error() < 0.01);
//!
//! assert_eq!(network.classify(&[1.0, 0.0]).unwrap(), 0);
//! assert_eq!(network.classify(&[0.0, 1.0]).unwrap(), 1);
//! ```

pub use crate::activator::Activator;

use crate::error::{check_len, Error, Result};
use crate::layer::Layer;
use crate::progress::{Mailbox, Progress, Watcher};
use crate::utils::{argmax, split_backward, split_forward, Back, Front, ZeroOut};

use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;

/// Seed used by [`Network::new`], so that default runs are reproducible.
pub const DEFAULT_SEED: u64 = 0;

/// Largest number of units or incoming weights a single layer may have.
pub const MAX_LAYER_PARAMETERS: usize = 1 << 26;

/// A Feedforward neural network
///
/// Layer 0 is the input layer; it holds no weights and only stores the
/// values passed to [`Network::forward`]. Every later layer is fully
/// connected to the one before it.
///
/// A clone starts detached from any progress watcher of the original.
#[derive(Debug)]
pub struct Network {
    layers: Vec<Layer>,
    activator: Activator,
    rng: StdRng,
    progress: Progress,
    mailbox: Option<Mailbox>,
}

impl Network {
    /// Creates a new, untrained sigmoid network seeded with [`DEFAULT_SEED`].
    ///
    /// Arguments:
    ///  * `layer_sizes` - the number of neurons in each layer, starting with
    ///                    the input layer and ending with the output layer.
    pub fn new(layer_sizes: &[usize]) -> Result<Self> {
        Network::with_seed(layer_sizes, Activator::Sigmoid, DEFAULT_SEED)
    }

    /// Creates a new, untrained network whose hidden and output layers use
    /// `activator`, with weights drawn from a generator seeded with `seed`.
    pub fn with_seed(layer_sizes: &[usize], activator: Activator, seed: u64) -> Result<Self> {
        Network::with_rng(layer_sizes, activator, StdRng::seed_from_u64(seed))
    }

    /// Creates a new, untrained network drawing its weights from `rng`.
    ///
    /// The network keeps `rng` and uses it again if the layers are ever
    /// rebuilt by [`Network::load_weights`].
    pub fn with_rng(layer_sizes: &[usize], activator: Activator, mut rng: StdRng) -> Result<Self> {
        if layer_sizes.is_empty() {
            return Err(Error::invalid("a network needs at least one layer"));
        }
        if let Some(i) = layer_sizes.iter().position(|&size| size == 0) {
            return Err(Error::invalid(format!("layer {i} has size 0")));
        }
        if let Some(i) = layer_sizes.iter().position(|&size| size > MAX_LAYER_PARAMETERS) {
            return Err(Error::invalid(format!(
                "layer {i} has {} units, at most {MAX_LAYER_PARAMETERS} are supported",
                layer_sizes[i]
            )));
        }
        for (i, sizes) in layer_sizes.windows(2).enumerate() {
            let weights = sizes[0].checked_mul(sizes[1]).filter(|&n| n <= MAX_LAYER_PARAMETERS);
            if weights.is_none() {
                return Err(Error::invalid(format!(
                    "layer {} would need {} x {} weights, at most {MAX_LAYER_PARAMETERS} are supported",
                    i + 1,
                    sizes[1],
                    sizes[0]
                )));
            }
        }

        let mut layers = Vec::with_capacity(layer_sizes.len());
        layers.push(Layer::input(layer_sizes[0]));
        for sizes in layer_sizes.windows(2) {
            layers.push(Layer::new(sizes[1], sizes[0], activator, &mut rng));
        }
        debug!("initialised {activator} network with layer sizes {layer_sizes:?}");

        Ok(Network {
            layers,
            activator,
            rng,
            progress: Progress::default(),
            mailbox: None,
        })
    }

    /// Returns the size of the input layer to the network.
    pub fn input_len(&self) -> usize {
        self.input_layer().size()
    }

    /// Returns the size of the output layer from the network.
    pub fn output_len(&self) -> usize {
        self.output_layer().size()
    }

    /// Returns the number of neurons in each layer.
    pub fn layer_sizes(&self) -> Vec<usize> {
        self.layers.iter().map(Layer::size).collect()
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub(crate) fn layers_mut(&mut self) -> &mut [Layer] {
        &mut self.layers
    }

    pub fn input_layer(&self) -> &Layer {
        self.layers.front()
    }

    pub fn output_layer(&self) -> &Layer {
        self.layers.back()
    }

    /// The activator used by every layer after the input layer.
    pub fn activator(&self) -> Activator {
        self.activator
    }

    pub(crate) fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Feeds the provided `input` through the network, returning the
    /// activations of the output layer.
    ///
    /// Fails with [`Error::Dimension`] if `input` does not match the input
    /// layer.
    pub fn forward(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.layers.mut_front().set_outputs_from_inputs(input)?;
        for i in 1..self.layers.len() {
            let (previous, layer) = split_forward(&mut self.layers, i - 1);
            layer.compute_outputs(previous)?;
        }
        Ok(self.layers.back().outputs())
    }

    /// Like [`Network::forward`], but returns an owned copy of the outputs.
    pub fn run(&mut self, input: &[f64]) -> Result<Vec<f64>> {
        self.forward(input).map(<[f64]>::to_vec)
    }

    /// Returns the index of the most activated output unit for `input`.
    pub fn classify(&mut self, input: &[f64]) -> Result<usize> {
        let output = self.forward(input)?;
        Ok(argmax(output).unwrap_or(0))
    }

    /// Feeds the `expected` output for the last forwarded sample back through
    /// the network and takes one gradient descent step.
    ///
    /// Every delta is computed before any weight is touched, since the
    /// deltas of a hidden layer read the pre-update weights of the next one.
    pub fn backpropagate(&mut self, expected: &[f64], learning_rate: f64) -> Result<()> {
        check_len("expected output", self.output_len(), expected.len())?;
        check_learning_rate(learning_rate)?;

        let last = self.layers.len() - 1;
        if last == 0 {
            return Ok(());
        }
        self.layers[last].compute_output_deltas(expected);
        for i in (1..last).rev() {
            let (layer, next) = split_backward(&mut self.layers, i);
            layer.compute_hidden_deltas(next);
        }
        for i in 1..=last {
            let (previous, layer) = split_forward(&mut self.layers, i - 1);
            layer.apply_deltas(previous, learning_rate);
        }
        Ok(())
    }

    /// Runs `num_passes` passes of online gradient descent over `examples`,
    /// in order, updating the weights after every sample.
    ///
    /// The provided `examples` should be a list of labelled data, where each
    /// element takes the form `(network input, expected output)`.
    ///
    /// Telemetry is reported relative to this call, so it is safe to train
    /// in several smaller chunks.
    pub fn train<I, O>(&mut self, examples: &[(I, O)], num_passes: usize, learning_rate: f64) -> Result<()>
    where
        I: AsRef<[f64]>,
        O: AsRef<[f64]>,
    {
        if examples.is_empty() {
            return Err(Error::invalid("cannot train on an empty set of examples"));
        }
        check_learning_rate(learning_rate)?;

        for pass in 0..num_passes {
            self.progress.max_error = 0.0;
            let mut total_error = 0.0;
            for (i, (input, expected)) in examples.iter().enumerate() {
                let expected = expected.as_ref();
                self.forward(input.as_ref())?;
                self.progress.input_index = i;
                // Updates never touch the output activations, so this is
                // still the error of the forward pass above.
                self.backpropagate(expected, learning_rate)?;
                let error = mean_square_error(self.layers.back().outputs(), expected);
                total_error += error;
                if error > self.progress.max_error {
                    self.progress.max_error = error;
                    self.progress.max_error_index = i;
                }
                self.publish();
            }
            self.progress.iteration = pass;
            self.progress.error = total_error / examples.len() as f64;
            self.publish();
            trace!(
                "pass {}: mse={} max={} (sample {})",
                pass,
                self.progress.error,
                self.progress.max_error,
                self.progress.max_error_index
            );
        }
        Ok(())
    }

    /// Returns the fraction of `examples` whose most activated output matches
    /// the hot index of the expected output.
    pub fn accuracy<I, O>(&mut self, examples: &[(I, O)]) -> Result<f64>
    where
        I: AsRef<[f64]>,
        O: AsRef<[f64]>,
    {
        if examples.is_empty() {
            return Err(Error::invalid("cannot score an empty set of examples"));
        }
        let mut correct = 0;
        for (input, expected) in examples {
            let expected = expected.as_ref();
            check_len("expected output", self.output_len(), expected.len())?;
            if Some(self.classify(input.as_ref())?) == argmax(expected) {
                correct += 1;
            }
        }
        Ok(correct as f64 / examples.len() as f64)
    }

    /// Returns a snapshot of the training telemetry.
    pub fn progress(&self) -> Progress {
        self.progress
    }

    pub fn current_iteration(&self) -> usize {
        self.progress.iteration
    }

    pub fn current_input_index(&self) -> usize {
        self.progress.input_index
    }

    pub fn current_error(&self) -> f64 {
        self.progress.error
    }

    pub fn current_max_error(&self) -> f64 {
        self.progress.max_error
    }

    pub fn current_max_error_index(&self) -> usize {
        self.progress.max_error_index
    }

    /// Returns a reader that sees the progress of every later `train` call,
    /// including ones made from another thread after the network moves there.
    pub fn watch(&mut self) -> Watcher {
        self.mailbox.get_or_insert_with(Mailbox::new).watcher()
    }

    pub(crate) fn mailbox(&self) -> Option<&Mailbox> {
        self.mailbox.as_ref()
    }

    pub(crate) fn set_mailbox(&mut self, mailbox: Option<Mailbox>) {
        self.mailbox = mailbox;
    }

    fn publish(&self) {
        if let Some(mailbox) = &self.mailbox {
            mailbox.publish(self.progress);
        }
    }
}

impl Clone for Network {
    fn clone(&self) -> Self {
        Network {
            layers: self.layers.clone(),
            activator: self.activator,
            rng: self.rng.clone(),
            progress: self.progress,
            mailbox: None,
        }
    }
}

impl ZeroOut for Network {
    /// Sets every weight and bias in the network to zero.
    fn zero_out(&mut self) {
        self.layers.zero_out();
    }
}

fn check_learning_rate(learning_rate: f64) -> Result<()> {
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(Error::invalid(format!(
            "learning rate must be finite and > 0, got {learning_rate}"
        )));
    }
    Ok(())
}

/// Computes the mean squared error between `actual` and `expected`.
///
/// # Panics
///
/// If the two slices differ in length.
pub fn mean_square_error(actual: &[f64], expected: &[f64]) -> f64 {
    assert_eq!(actual.len(), expected.len());
    if actual.is_empty() {
        return 0.0;
    }
    let mut error = 0.0;
    for (&a, e) in actual.iter().zip(expected) {
        error += (a - e) * (a - e);
    }
    error / (actual.len() as f64)
}
