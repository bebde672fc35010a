//! Utilities for training neural networks in chunks of passes.
//!
//! A [`Trainer`] repeatedly calls [`Network::train`] with a fixed number of
//! passes, checking its stop condition between calls. Passes are never
//! interrupted; a stop request takes effect once the current chunk returns.
//!
//! [`Trainer::spawn`] runs the same loop on a worker thread. The network
//! moves onto that thread, so nothing else can train it concurrently, and
//! the caller observes progress through a [`Session`].

use crate::activator::Activator;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::feed_forward::Network;
use crate::progress::{Progress, Watcher};

use log::info;
use serde::Serialize;
use std::panic;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// A builder for training models.
#[derive(Debug)]
pub struct Trainer {
    network: Network,
    learning_rate: f64,
    passes_per_chunk: usize,
    logging: Logging,
    stop_condition: StopCondition,
    stop: StopHandle,
    passes: Arc<AtomicUsize>,
}

impl Trainer {
    /// Creates a new Trainer instance.
    ///
    /// The trainer is initialized with some default values. These defaults are:
    ///
    /// * A learning rate of 0.1.
    /// * Chunks of 100 passes.
    /// * Stops after 1000 passes.
    /// * Logs on training completion.
    pub fn new(network: Network) -> Self {
        Trainer {
            network,
            learning_rate: 0.1,
            passes_per_chunk: 100,
            logging: Logging::Completion,
            stop_condition: StopCondition::Passes(1000),
            stop: StopHandle::default(),
            passes: Arc::default(),
        }
    }

    /// Sets the learning rate to use during gradient descent.
    pub fn learning_rate(mut self, rate: f64) -> Self {
        self.learning_rate = rate;
        self
    }

    /// Sets how many passes run between stop checks.
    pub fn passes_per_chunk(mut self, passes: usize) -> Self {
        self.passes_per_chunk = passes;
        self
    }

    /// Sets the type of logging to be emitted during training.
    pub fn logging(mut self, logging: Logging) -> Self {
        self.logging = logging;
        self
    }

    /// Sets the condition to finish training.
    pub fn stop_condition<C>(mut self, condition: C) -> Self
    where
        C: Into<StopCondition>,
    {
        self.stop_condition = condition.into();
        self
    }

    /// Returns a handle that asks training to stop after the current chunk.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Returns a reader for the progress of the network being trained.
    pub fn watch(&mut self) -> Watcher {
        self.network.watch()
    }

    /// Trains the network on the provided labelled data.
    ///
    /// The provided `examples` should be a list of labelled data, where each
    /// element takes the form `(network input, expected output)`. They are
    /// visited in the same order on every pass.
    ///
    /// Returns:
    ///   The trained network with a summary of the run, or an error if
    ///   invalid training parameters were provided.
    pub fn train<I, O>(mut self, examples: &[(I, O)]) -> Result<Training>
    where
        I: AsRef<[f64]>,
        O: AsRef<[f64]>,
    {
        if self.passes_per_chunk == 0 {
            return Err(Error::invalid("passes per chunk must be > 0"));
        }

        let start_time = Instant::now();
        let mut chunks = 0;
        let mut passes = 0;
        let mut error = None;
        let mut stopped_early = false;
        loop {
            if self.stop.is_stopped() {
                stopped_early = true;
                break;
            }
            let chunk = match self.stop_condition {
                StopCondition::Passes(total) => self.passes_per_chunk.min(total - passes),
                _ => self.passes_per_chunk,
            };
            if chunk == 0 {
                break;
            }

            self.network.train(examples, chunk, self.learning_rate)?;
            chunks += 1;
            passes += chunk;
            self.passes.store(passes, Ordering::Release);
            let training_error = self.network.current_error();
            error = Some(training_error);

            self.logging.chunk(chunks, passes, &self.network.progress());
            if self.stop_condition.should_stop(passes, training_error, start_time) {
                break;
            }
        }

        let training = Training {
            network: self.network,
            learning_rate: self.learning_rate,
            chunks,
            passes,
            error,
            elapsed: start_time.elapsed(),
            stopped_early,
        };
        self.logging.completion(&training);
        Ok(training)
    }

    /// Trains on a worker thread, returning immediately.
    pub fn spawn(mut self, examples: Dataset) -> Result<Session> {
        let watcher = self.watch();
        let stop = self.stop_handle();
        let passes = Arc::clone(&self.passes);
        let handle = thread::Builder::new()
            .name("trainer".to_owned())
            .spawn(move || self.train(&examples))?;
        Ok(Session {
            handle,
            watcher,
            stop,
            passes,
        })
    }
}

/// The outcome of a [`Trainer`] run.
#[derive(Debug)]
pub struct Training {
    /// The trained network.
    pub network: Network,
    pub learning_rate: f64,
    /// Number of `Network::train` calls made.
    pub chunks: usize,
    /// Total passes over the examples, across all chunks.
    pub passes: usize,
    /// Mean squared error of the final pass, if any pass ran.
    pub error: Option<f64>,
    pub elapsed: Duration,
    /// Whether a stop request ended training.
    pub stopped_early: bool,
}

impl Training {
    pub fn report(&self) -> TrainingReport {
        let progress = self.network.progress();
        TrainingReport {
            layer_sizes: self.network.layer_sizes(),
            activator: self.network.activator(),
            learning_rate: self.learning_rate,
            chunks: self.chunks,
            passes: self.passes,
            error: self.error,
            max_error: progress.max_error,
            max_error_index: progress.max_error_index,
            elapsed_secs: self.elapsed.as_secs_f64(),
            stopped_early: self.stopped_early,
        }
    }
}

/// Serializable summary of a [`Training`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrainingReport {
    pub layer_sizes: Vec<usize>,
    pub activator: Activator,
    pub learning_rate: f64,
    pub chunks: usize,
    pub passes: usize,
    pub error: Option<f64>,
    pub max_error: f64,
    pub max_error_index: usize,
    pub elapsed_secs: f64,
    pub stopped_early: bool,
}

/// A training run on a worker thread.
#[derive(Debug)]
pub struct Session {
    handle: JoinHandle<Result<Training>>,
    watcher: Watcher,
    stop: StopHandle,
    passes: Arc<AtomicUsize>,
}

impl Session {
    /// Returns the latest progress of the current chunk, if any sample has
    /// been processed yet.
    pub fn latest(&self) -> Option<Progress> {
        self.watcher.latest()
    }

    pub fn watcher(&self) -> Watcher {
        self.watcher.clone()
    }

    /// Total passes completed by finished chunks.
    pub fn passes_completed(&self) -> usize {
        self.passes.load(Ordering::Acquire)
    }

    /// Asks training to stop once the current chunk finishes.
    pub fn stop(&self) {
        self.stop.stop();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for training to finish. A panic on the worker is resumed here.
    pub fn join(self) -> Result<Training> {
        match self.handle.join() {
            Ok(result) => result,
            Err(payload) => panic::resume_unwind(payload),
        }
    }
}

/// A shared flag asking a training loop to stop between chunks.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }
}

/// Logging frequency to use during training
#[derive(Copy, Clone, Debug)]
pub enum Logging {
    /// No logs will be emitted
    Silent,
    /// A summary will be logged at completion
    Completion,
    /// A summary will be logged after every `n` chunks, and at completion
    Chunks(usize),
}

impl Logging {
    /// Performs logging after a chunk of passes.
    fn chunk(&self, chunk: usize, passes: usize, progress: &Progress) {
        if let Logging::Chunks(freq) = *self {
            if freq > 0 && chunk % freq == 0 {
                info!(
                    "Chunk {}, pass {}:\tMSE={}\tworst={} (sample {})",
                    chunk, passes, progress.error, progress.max_error, progress.max_error_index
                );
            }
        }
    }

    /// Performs logging at the end of training.
    fn completion(&self, training: &Training) {
        if let Logging::Silent = *self {
            return;
        }
        info!(
            "Ran {} passes in {} chunks in {:.2} seconds.",
            training.passes,
            training.chunks,
            training.elapsed.as_secs_f64()
        );
        match training.error {
            Some(error) => info!("Final MSE: {}", error),
            None => info!("No passes completed."),
        }
    }
}

/// When to stop training
#[derive(Copy, Clone, Debug)]
pub enum StopCondition {
    /// Stops after the provided number of passes in total
    Passes(usize),
    /// Stops when the pass error drops below the provided threshold
    ErrorThreshold(f64),
    /// Stops after the provided duration
    Duration(Duration),
}

impl From<Duration> for StopCondition {
    fn from(duration: Duration) -> StopCondition {
        StopCondition::Duration(duration)
    }
}

impl StopCondition {
    /// Returns true if training is complete.
    fn should_stop(&self, passes: usize, training_error: f64, start_time: Instant) -> bool {
        match *self {
            StopCondition::Passes(total) => passes >= total,
            StopCondition::ErrorThreshold(threshold) => training_error < threshold,
            StopCondition::Duration(duration) => start_time.elapsed() > duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn examples() -> Vec<([f64; 2], [f64; 2])> {
        vec![([1.0, 0.0], [1.0, 0.0]), ([0.0, 1.0], [0.0, 1.0])]
    }

    fn trainer() -> Trainer {
        Trainer::new(Network::new(&[2, 3, 2]).unwrap()).logging(Logging::Silent)
    }

    #[test]
    fn runs_requested_passes_in_chunks() {
        let training = trainer()
            .passes_per_chunk(30)
            .stop_condition(StopCondition::Passes(100))
            .train(&examples())
            .unwrap();
        assert_eq!(training.chunks, 4);
        assert_eq!(training.passes, 100);
        // The last chunk is clamped to 10 passes and reports relative to it.
        assert_eq!(training.network.current_iteration(), 9);
        assert!(!training.stopped_early);
    }

    #[test]
    fn chunked_training_matches_one_call() {
        let mut direct = Network::new(&[2, 3, 2]).unwrap();
        direct.train(&examples(), 50, 0.5).unwrap();

        let training = trainer()
            .learning_rate(0.5)
            .passes_per_chunk(7)
            .stop_condition(StopCondition::Passes(50))
            .train(&examples())
            .unwrap();
        let mut chunked = training.network;

        for (input, _) in examples() {
            assert_eq!(direct.run(&input).unwrap(), chunked.run(&input).unwrap());
        }
    }

    #[test]
    fn stops_on_error_threshold() {
        let training = trainer()
            .learning_rate(0.5)
            .passes_per_chunk(10)
            .stop_condition(StopCondition::ErrorThreshold(0.05))
            .train(&examples())
            .unwrap();
        assert!(training.error.unwrap() < 0.05);
        assert_eq!(training.passes % 10, 0);
    }

    #[test]
    fn stop_request_before_start() {
        let trainer = trainer();
        trainer.stop_handle().stop();
        let training = trainer.train(&examples()).unwrap();
        assert!(training.stopped_early);
        assert_eq!(training.passes, 0);
        assert_eq!(training.error, None);
    }

    #[test]
    fn stop_from_another_thread_ends_unreachable_threshold() {
        let trainer = trainer()
            .passes_per_chunk(5)
            .stop_condition(StopCondition::ErrorThreshold(0.0));
        let stop = trainer.stop_handle();
        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            stop.stop();
        });
        let training = trainer.train(&examples()).unwrap();
        stopper.join().unwrap();

        assert!(training.stopped_early);
        assert!(training.passes > 0);
        assert_eq!(training.passes % 5, 0);
    }

    #[test]
    fn zero_chunk_size() {
        assert!(trainer().passes_per_chunk(0).train(&examples()).is_err());
    }

    #[test]
    fn report_summarises_run() {
        let training = trainer()
            .passes_per_chunk(5)
            .stop_condition(StopCondition::Passes(5))
            .train(&examples())
            .unwrap();
        let report = training.report();
        assert_eq!(report.layer_sizes, vec![2, 3, 2]);
        assert_eq!(report.activator, Activator::Sigmoid);
        assert_eq!(report.chunks, 1);
        assert_eq!(report.error, training.error);
    }
}
