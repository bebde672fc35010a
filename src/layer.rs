use crate::activator::Activator;
use crate::error::{check_len, Result};
use crate::matrix::Mat;
use crate::utils::ZeroOut;

use itertools::multizip;
use rand::distributions::Uniform;
use rand::Rng;

/// A single fully connected layer of the neural network.
///
/// Each layer exclusively owns its output buffer. The next layer only reads
/// it for the duration of one `compute_outputs` call and never keeps it.
#[derive(Clone, Debug)]
pub struct Layer {
    /// The activation function to be used for every neuron in the layer.
    activator: Activator,
    /// The incoming weights, `weights[(i, j)]` connecting unit `j` of the
    /// previous layer to unit `i` of this one. Empty for the input layer.
    weights: Mat,
    /// One bias per unit. Empty for the input layer.
    biases: Vec<f64>,
    /// Activations from the most recent forward pass.
    outputs: Vec<f64>,
    /// Error signals from the most recent backward pass.
    deltas: Vec<f64>,
}

impl Layer {
    /// Initializes a new, untrained layer.
    ///
    /// Arguments:
    ///
    ///  * `size` - the number of neurons in this layer.
    ///  * `input_size` - the number of outputs of the previous layer, or 0
    ///                   for the input layer.
    ///  * `activator` - the activation function to be used for this layer's
    ///                  output.
    ///  * `rng` - the random source for the initial weights and biases, each
    ///            drawn uniformly from `[-1, 1)`.
    pub fn new<R>(size: usize, input_size: usize, activator: Activator, rng: &mut R) -> Self
    where
        R: Rng + ?Sized,
    {
        if input_size == 0 {
            return Layer::input(size);
        }
        let init = Uniform::new(-1.0, 1.0);
        let weights = Mat::random(&init, size, input_size, rng);
        let biases = (0..size).map(|_| rng.sample(&init)).collect();
        Layer {
            activator,
            weights,
            biases,
            outputs: vec![0.0; size],
            deltas: vec![0.0; size],
        }
    }

    /// Creates an input layer, which only stores externally supplied values.
    pub fn input(size: usize) -> Self {
        Layer {
            activator: Activator::Identity,
            weights: Mat::zeros(0, 0),
            biases: Vec::new(),
            outputs: vec![0.0; size],
            deltas: Vec::new(),
        }
    }

    /// Returns the number of neurons in this layer.
    pub fn size(&self) -> usize {
        self.outputs.len()
    }

    /// Returns the width of the previous layer, 0 for the input layer.
    pub fn input_size(&self) -> usize {
        self.weights.cols()
    }

    pub fn is_input(&self) -> bool {
        self.input_size() == 0
    }

    pub fn activator(&self) -> Activator {
        self.activator
    }

    pub fn weights(&self) -> &Mat {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    /// Returns the activations computed by the last forward pass.
    pub fn outputs(&self) -> &[f64] {
        &self.outputs
    }

    pub(crate) fn weights_mut(&mut self) -> &mut Mat {
        &mut self.weights
    }

    pub(crate) fn biases_mut(&mut self) -> &mut [f64] {
        &mut self.biases
    }

    /// Copies `values` into the outputs directly, bypassing the activator.
    pub fn set_outputs_from_inputs(&mut self, values: &[f64]) -> Result<()> {
        check_len("input", self.size(), values.len())?;
        self.outputs.copy_from_slice(values);
        Ok(())
    }

    /// Feeds the outputs of `previous` forward through this layer.
    pub fn compute_outputs(&mut self, previous: &Layer) -> Result<()> {
        check_len("previous layer output", self.input_size(), previous.size())?;
        let inputs = previous.outputs();
        for (i, (y, &bias)) in self.outputs.iter_mut().zip(&self.biases).enumerate() {
            let sum: f64 = self
                .weights
                .row(i)
                .iter()
                .zip(inputs)
                .map(|(w, x)| w * x)
                .sum();
            *y = self.activator.f(bias + sum);
        }
        Ok(())
    }

    /// Computes deltas for an output layer against the `expected` values.
    pub(crate) fn compute_output_deltas(&mut self, expected: &[f64]) {
        debug_assert_eq!(expected.len(), self.size());
        for (d, &y, &t) in multizip((self.deltas.iter_mut(), &self.outputs, expected)) {
            *d = (t - y) * self.activator.fprime(y);
        }
    }

    /// Computes deltas for a hidden layer by feeding the deltas of `next`
    /// back through the weights that carried this layer's signal forward.
    ///
    /// `next` must still hold its pre-update weights.
    pub(crate) fn compute_hidden_deltas(&mut self, next: &Layer) {
        debug_assert_eq!(next.input_size(), self.size());
        self.deltas.zero_out();
        for (row, &next_delta) in next.weights.iter_rows().zip(&next.deltas) {
            for (d, &w) in self.deltas.iter_mut().zip(row) {
                *d += w * next_delta;
            }
        }
        for (d, &y) in self.deltas.iter_mut().zip(&self.outputs) {
            *d *= self.activator.fprime(y);
        }
    }

    /// Applies the gradient descent step for the current deltas, using the
    /// outputs of `previous` as the inputs of this layer.
    pub(crate) fn apply_deltas(&mut self, previous: &Layer, learning_rate: f64) {
        debug_assert_eq!(previous.size(), self.input_size());
        let inputs = previous.outputs();
        for (i, (bias, &delta)) in self.biases.iter_mut().zip(&self.deltas).enumerate() {
            let step = learning_rate * delta;
            *bias += step;
            for (w, &x) in self.weights.row_mut(i).iter_mut().zip(inputs) {
                *w += step * x;
            }
        }
    }
}

impl ZeroOut for Layer {
    /// Sets every weight and bias to zero.
    fn zero_out(&mut self) {
        self.weights.zero_out();
        self.biases.zero_out();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn input_layer_has_no_parameters() {
        let layer = Layer::new(4, 0, Activator::Sigmoid, &mut rng());
        assert!(layer.is_input());
        assert_eq!(layer.size(), 4);
        assert_eq!(layer.activator(), Activator::Identity);
        assert!(layer.biases().is_empty());
        assert_eq!(layer.weights().rows(), 0);
    }

    #[test]
    fn parameters_have_declared_shape_and_range() {
        let layer = Layer::new(3, 5, Activator::Sigmoid, &mut rng());
        assert_eq!(layer.weights().rows(), 3);
        assert_eq!(layer.weights().cols(), 5);
        assert_eq!(layer.biases().len(), 3);
        let in_range = |v: &f64| (-1.0..1.0).contains(v);
        assert!(layer.biases().iter().all(in_range));
        assert!(layer.weights().iter_rows().flatten().all(in_range));
    }

    #[test]
    fn compute_outputs_is_weighted_sum_plus_bias() {
        let mut input = Layer::input(2);
        input.set_outputs_from_inputs(&[1.0, 2.0]).unwrap();

        let mut layer = Layer::new(2, 2, Activator::Identity, &mut rng());
        layer.weights_mut().row_mut(0).copy_from_slice(&[0.5, -1.0]);
        layer.weights_mut().row_mut(1).copy_from_slice(&[2.0, 0.25]);
        layer.biases_mut().copy_from_slice(&[0.1, -0.2]);

        layer.compute_outputs(&input).unwrap();
        let out = layer.outputs();
        assert!((out[0] - (0.1 + 0.5 - 2.0)).abs() < 1e-12);
        assert!((out[1] - (-0.2 + 2.0 + 0.5)).abs() < 1e-12);
    }

    #[test]
    fn input_values_must_match_size() {
        let mut input = Layer::input(3);
        assert!(input.set_outputs_from_inputs(&[0.0, 1.0]).is_err());
    }

    #[test]
    fn zeroed_sigmoid_layer_outputs_one_half() {
        let mut input = Layer::input(3);
        input.set_outputs_from_inputs(&[0.3, -4.0, 9.0]).unwrap();
        let mut layer = Layer::new(2, 3, Activator::Sigmoid, &mut rng());
        layer.zero_out();
        layer.compute_outputs(&input).unwrap();
        assert_eq!(layer.outputs(), &[0.5, 0.5]);
    }

    #[test]
    fn hidden_deltas_use_transposed_weights() {
        let mut hidden = Layer::new(2, 1, Activator::Identity, &mut rng());
        let mut next = Layer::new(3, 2, Activator::Identity, &mut rng());
        for (j, row) in [[1.0, 2.0], [3.0, 4.0], [5.0, 6.0]].iter().enumerate() {
            next.weights_mut().row_mut(j).copy_from_slice(row);
        }
        next.deltas.copy_from_slice(&[1.0, 0.5, -1.0]);

        hidden.compute_hidden_deltas(&next);
        // Identity derivative is 1, so delta[i] = sum_j w[j][i] * next_delta[j].
        assert!((hidden.deltas[0] - (1.0 + 1.5 - 5.0)).abs() < 1e-12);
        assert!((hidden.deltas[1] - (2.0 + 2.0 - 6.0)).abs() < 1e-12);
    }
}
