use anyhow::{bail, Context, Result};
use clap::Parser;
use log::info;
use neuralnet::idx::read_idx_file;
use neuralnet::{Activator, Dataset, Logging, Network, Progress, StopCondition, Trainer};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

/// Trains a network on an IDX image set, reporting progress as it goes.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// IDX file of images, indexed [image][row][column]
    #[arg(long)]
    images: PathBuf,

    /// IDX file of labels, one byte per image
    #[arg(long)]
    labels: PathBuf,

    /// Neurons per layer, from input to output
    #[arg(long, value_delimiter = ',', default_value = "784,128,10")]
    layers: Vec<usize>,

    /// Number of images to encode and train on
    #[arg(long, default_value_t = 10)]
    encode: usize,

    #[arg(long, default_value_t = 100)]
    passes_per_chunk: usize,

    #[arg(long, default_value_t = 1000)]
    total_passes: usize,

    #[arg(short, long, default_value_t = 0.1)]
    learning_rate: f64,

    /// Seed for the initial weights
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// One of sigmoid, step or identity
    #[arg(long, default_value_t = Activator::Sigmoid)]
    activator: Activator,

    /// Weight file to start from; its layer sizes override --layers
    #[arg(long)]
    load: Option<PathBuf>,

    /// Where to write the trained weights
    #[arg(long)]
    save: Option<PathBuf>,

    /// Where to write a JSON summary of the run
    #[arg(long)]
    report: Option<PathBuf>,

    /// Milliseconds between progress updates
    #[arg(long, default_value_t = 200)]
    poll_ms: u64,

    /// Ask training to stop after this many seconds
    #[arg(long)]
    max_seconds: Option<f64>,
}

/// Formats a progress update. `passes_completed` counts finished chunks only.
fn describe(passes_completed: usize, progress: &Progress) -> String {
    format!(
        "{} passes done, at sample {}:\tlast MSE={}\tworst={} (sample {})",
        passes_completed, progress.input_index, progress.error, progress.max_error, progress.max_error_index
    )
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let images = read_idx_file(&args.images)
        .and_then(|array| array.into_images())
        .with_context(|| format!("reading images from {}", args.images.display()))?;
    let labels = read_idx_file(&args.labels)
        .and_then(|array| array.into_labels())
        .with_context(|| format!("reading labels from {}", args.labels.display()))?;

    let mut network = Network::with_seed(&args.layers, args.activator, args.seed)?;
    if let Some(path) = &args.load {
        network
            .load_weights(path)
            .with_context(|| format!("loading weights from {}", path.display()))?;
        info!("Loaded network {:?} from {}", network.layer_sizes(), path.display());
    }

    let dataset = Dataset::encode(&images, &labels, network.output_len(), Some(args.encode))?;
    if dataset.is_empty() {
        bail!("no images to train on");
    }
    if dataset.input_len() != network.input_len() {
        bail!(
            "images have {} pixels but the network takes {} inputs",
            dataset.input_len(),
            network.input_len()
        );
    }
    info!(
        "Encoded {} of {} images ({}x{})",
        dataset.len(),
        images.len(),
        images.height(),
        images.width()
    );

    let session = Trainer::new(network)
        .learning_rate(args.learning_rate)
        .passes_per_chunk(args.passes_per_chunk)
        .stop_condition(StopCondition::Passes(args.total_passes))
        .logging(Logging::Chunks(1))
        .spawn(dataset.clone())?;

    let start_time = Instant::now();
    let deadline = args.max_seconds.map(Duration::from_secs_f64);
    let poll = Duration::from_millis(args.poll_ms.max(1));
    while !session.is_finished() {
        thread::sleep(poll);
        if let Some(progress) = session.latest() {
            info!("{}", describe(session.passes_completed(), &progress));
        }
        if deadline.map_or(false, |d| start_time.elapsed() > d) {
            info!("Time limit reached, stopping after the current chunk");
            session.stop();
        }
    }

    let mut training = session.join()?;
    let accuracy = training.network.accuracy(&dataset)?;
    info!("Training set accuracy: {:.2}%", accuracy * 100.0);

    if let Some(path) = &args.save {
        training
            .network
            .save_weights(path)
            .with_context(|| format!("saving weights to {}", path.display()))?;
        info!("Saved weights to {}", path.display());
    }
    if let Some(path) = &args.report {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &training.report())?;
        info!("Wrote report to {}", path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pass_count_comes_from_finished_chunks_only() {
        // Early in a new chunk the iteration still holds the previous
        // chunk's last pass.
        let progress = Progress {
            iteration: 99,
            input_index: 3,
            error: 0.25,
            max_error: 0.5,
            max_error_index: 7,
        };
        let line = describe(100, &progress);
        assert!(line.starts_with("100 passes done, at sample 3:"), "{line}");
        assert!(!line.contains("199"));
        assert!(line.ends_with("worst=0.5 (sample 7)"));
    }
}
