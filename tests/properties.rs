use neuralnet::dataset::one_hot;
use neuralnet::feed_forward::mean_square_error;
use neuralnet::utils::ZeroOut;
use neuralnet::{read_weights, Activator, Error, Network};

use proptest::prelude::*;
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SMALL: &str = "\
LayerCount: 3
2,2,1
Layer[0]:Size=2
Biases: null
Weights: null
Layer[1]:Size=2
Biases: 0.1,-0.1
Weights[0]: 0.5,-0.5
Weights[1]: 0.25,0.75
Layer[2]:Size=1
Biases: 0.2
Weights[0]: 1,-1
";

#[test]
fn one_step_usually_reduces_error() {
    let mut rng = StdRng::seed_from_u64(42);
    let unit = Uniform::new(0.0, 1.0);
    let trials = 200;
    let mut improved = 0;
    for _ in 0..trials {
        let mut network = Network::with_seed(&[4, 5, 3], Activator::Sigmoid, rng.gen()).unwrap();
        let input: Vec<f64> = (0..4).map(|_| unit.sample(&mut rng)).collect();
        let target: Vec<f64> = (0..3).map(|_| unit.sample(&mut rng)).collect();

        let before = mean_square_error(network.forward(&input).unwrap(), &target);
        network.backpropagate(&target, 0.1).unwrap();
        let after = mean_square_error(network.forward(&input).unwrap(), &target);
        if after < before {
            improved += 1;
        }
    }
    assert!(improved * 100 >= trials * 95, "only {improved} of {trials} steps improved");
}

#[test]
fn two_patterns_converge() {
    let examples = [(vec![1.0, 0.0], vec![1.0, 0.0]), (vec![0.0, 1.0], vec![0.0, 1.0])];
    let mut network = Network::new(&[2, 3, 2]).unwrap();
    network.train(&examples, 1000, 0.5).unwrap();
    assert!(network.current_error() < 0.01);
    assert_eq!(network.accuracy(&examples).unwrap(), 1.0);
}

#[test]
fn worst_sample_is_tracked_per_pass() {
    // A zeroed step network outputs all zeros and never learns, so each
    // sample error is known: 0, 1 and 0.5.
    let mut network = Network::with_seed(&[2, 3, 2], Activator::Step, 0).unwrap();
    network.zero_out();
    let examples = [
        ([0.3, 0.1], [0.0, 0.0]),
        ([0.5, 0.9], [1.0, 1.0]),
        ([0.2, 0.4], [1.0, 0.0]),
    ];
    network.train(&examples, 2, 0.1).unwrap();

    let progress = network.progress();
    assert_eq!(progress.iteration, 1);
    assert_eq!(progress.input_index, 2);
    assert_eq!(progress.max_error, 1.0);
    assert_eq!(progress.max_error_index, 1);
    assert_eq!(progress.error, 0.5);
}

#[test]
fn worst_sample_of_one_sigmoid_pass() {
    // From zero weights every unit outputs 0.5. The first sample hits its
    // target exactly and leaves the weights alone. The second has error
    // 0.25 and moves only the output layer, since the hidden deltas are
    // multiplied by zero output weights.
    let mut network = Network::new(&[2, 2, 1]).unwrap();
    network.zero_out();
    let examples = [([0.2, 0.9], [0.5]), ([0.7, 0.1], [1.0]), ([0.4, 0.4], [0.6])];
    let lr = 0.1;
    network.train(&examples, 1, lr).unwrap();

    let delta = (1.0 - 0.5) * 0.5 * (1.0 - 0.5);
    let bias = lr * delta;
    let weight = lr * delta * 0.5;
    let y = 1.0 / (1.0 + (-(bias + 2.0 * weight * 0.5)).exp());
    let errors = [0.0, 0.25, (0.6 - y) * (0.6 - y)];
    assert!(errors[2] < errors[1]);

    let progress = network.progress();
    assert_eq!(progress.iteration, 0);
    assert_eq!(progress.max_error_index, 1);
    assert!((progress.max_error - 0.25).abs() < 1e-12);
    assert!((progress.error - errors.iter().sum::<f64>() / 3.0).abs() < 1e-12);
}

#[test]
fn mismatched_input_is_a_dimension_error() {
    let mut network = Network::new(&[784, 16, 10]).unwrap();
    match network.forward(&[0.0; 783]) {
        Err(Error::Dimension { expected, actual, .. }) => assert_eq!((expected, actual), (784, 783)),
        other => panic!("expected a dimension error, got {other:?}"),
    }
}

/// Replaces one character of `text` and cuts it off at `cut`.
fn mutate(text: &str, at: usize, with: char, cut: usize) -> String {
    let mut chars: Vec<char> = text.chars().collect();
    let at = at % chars.len();
    chars[at] = with;
    chars.truncate(cut % (chars.len() + 1));
    chars.into_iter().collect()
}

proptest! {
    #[test]
    fn sigmoid_outputs_stay_in_unit_interval(
        input in prop::collection::vec(-50.0f64..50.0, 3),
        seed in any::<u64>(),
    ) {
        let mut network = Network::with_seed(&[3, 4, 2], Activator::Sigmoid, seed).unwrap();
        for &y in network.forward(&input).unwrap() {
            prop_assert!((0.0..=1.0).contains(&y));
        }
    }

    #[test]
    fn one_hot_has_a_single_one(num_classes in 1usize..64, label in 0usize..64) {
        let label = label % num_classes;
        let encoded = one_hot(label, num_classes).unwrap();
        prop_assert_eq!(encoded.len(), num_classes);
        prop_assert_eq!(encoded.iter().sum::<f64>(), 1.0);
        prop_assert_eq!(encoded[label], 1.0);
    }

    #[test]
    fn size_line_without_layers_is_rejected(sizes in prop::collection::vec(any::<usize>(), 1..4)) {
        let listed = sizes.iter().map(usize::to_string).collect::<Vec<_>>().join(",");
        let text = format!("LayerCount: {}\n{}\n", sizes.len(), listed);
        let rng = StdRng::seed_from_u64(0);
        let result = read_weights(text.as_bytes(), Activator::Sigmoid, rng);
        prop_assert!(matches!(result, Err(Error::Format { .. })), "expected Error::Format");
    }

    #[test]
    fn damaged_weight_files_never_panic(
        at in any::<usize>(),
        with in prop::sample::select(vec!['0', '7', ',', '.', '-', ':', 'n', 'x', ' ', '\n']),
        cut in any::<usize>(),
    ) {
        let text = mutate(SMALL, at, with, cut);
        let rng = StdRng::seed_from_u64(0);
        match read_weights(text.as_bytes(), Activator::Sigmoid, rng) {
            Ok(network) => prop_assert!(!network.layer_sizes().is_empty()),
            Err(Error::Format { line, .. }) => prop_assert!(line >= 1),
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }
}
