use neuralnet::{Logging, Network, StopCondition, Trainer};
use rand::distributions::{Distribution, Uniform};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::thread;
use std::time::Duration;

const TIME_LIMIT: Duration = Duration::from_secs(30);

type Input = [f64; 2];
type Output = [f64; 2];

/// Points on a noisy unit circle, labelled by whether they fall in the
/// first/third or second/fourth quadrants.
fn generate_data(num_samples: usize, rng: &mut StdRng) -> Vec<(Input, Output)> {
    let radians = Uniform::new(0.0, 2.0 * std::f64::consts::PI);
    let noise = Uniform::new(-0.1, 0.1);

    let mut data = Vec::new();
    for _ in 0..num_samples {
        let theta = radians.sample(rng);
        let dx = noise.sample(rng);
        let dy = noise.sample(rng);
        let point = [theta.cos() + dx, theta.sin() + dy];
        let class = if point[0] * point[1] > 0.0 {
            [1.0, 0.0]
        } else {
            [0.0, 1.0]
        };
        data.push((point, class));
    }
    data
}

fn score(set_name: &str, network: &mut Network, test_data: &[(Input, Output)]) -> neuralnet::Result<()> {
    let accuracy = network.accuracy(test_data)?;
    println!(
        "{} set results: {} of {} correct",
        set_name,
        (accuracy * test_data.len() as f64).round(),
        test_data.len()
    );
    Ok(())
}

fn main() -> neuralnet::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut rng = StdRng::seed_from_u64(7);
    let training_data = generate_data(2_000, &mut rng);
    let trainer = Trainer::new(Network::new(&[2, 5, 5, 2])?)
        .learning_rate(0.3)
        .passes_per_chunk(10)
        .stop_condition(StopCondition::ErrorThreshold(0.01))
        .logging(Logging::Chunks(5));

    // Noise near the axes can keep the error above the threshold forever.
    let stop = trainer.stop_handle();
    thread::spawn(move || {
        thread::sleep(TIME_LIMIT);
        stop.stop();
    });
    let training = trainer.train(&training_data)?;
    let mut network = training.network;

    println!();
    score("Training", &mut network, &training_data)?;
    score("Test", &mut network, &generate_data(1_000, &mut rng))?;
    Ok(())
}
