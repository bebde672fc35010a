//! Plain-text weight files.
//!
//! A file lists the layer sizes up front and then every layer in order:
//!
//! ```text
//! LayerCount: 3
//! 2,2,1
//! Layer[0]:Size=2
//! Biases: null
//! Weights: null
//! Layer[1]:Size=2
//! Biases: 0.1,-0.1
//! Weights[0]: 0.5,-0.5
//! Weights[1]: 0.25,0.75
//! Layer[2]:Size=1
//! Biases: 0.2
//! Weights[0]: 1,-1
//! ```
//!
//! The input layer has no parameters and is always written with `null`
//! markers. `Weights[i]` holds the weights into unit `i` from every unit of
//! the previous layer. Numbers use the shortest decimal form that parses back
//! to the same `f64`, independent of locale, so a save/load cycle is exact.

use crate::activator::Activator;
use crate::error::{Error, Result};
use crate::feed_forward::Network;
use crate::layer::Layer;

use itertools::Itertools;
use log::debug;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

/// Stands in for the parameters of the input layer.
pub const NULL_MARKER: &str = "null";

/// Writes the weights and biases of `network` to `out`.
pub fn write_weights<W: Write>(network: &Network, mut out: W) -> Result<()> {
    let layers = network.layers();
    writeln!(out, "LayerCount: {}", layers.len())?;
    writeln!(out, "{}", layers.iter().map(Layer::size).join(","))?;
    for (l, layer) in layers.iter().enumerate() {
        writeln!(out, "Layer[{}]:Size={}", l, layer.size())?;
        if l == 0 {
            writeln!(out, "Biases: {NULL_MARKER}")?;
            writeln!(out, "Weights: {NULL_MARKER}")?;
            continue;
        }
        writeln!(out, "Biases: {}", layer.biases().iter().join(","))?;
        for (i, row) in layer.weights().iter_rows().enumerate() {
            writeln!(out, "Weights[{}]: {}", i, row.iter().join(","))?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Reads a weight file from `input`, building a network whose hidden and
/// output layers use `activator`.
///
/// The layers are first initialised from `rng` at the declared sizes, then
/// every weight and bias is overwritten with the parsed values.
pub fn read_weights<R: BufRead>(input: R, activator: Activator, rng: StdRng) -> Result<Network> {
    let mut lines = Lines::new(input);

    let (n, line) = lines.next_line("layer count")?;
    let count: usize = parse_token(field(&line, "LayerCount:", n)?, n, "layer count")?;

    let (n, line) = lines.next_line("layer sizes")?;
    let sizes = line
        .split(',')
        .map(|token| parse_token::<usize>(token, n, "layer size"))
        .collect::<Result<Vec<_>>>()?;
    if sizes.len() != count {
        return Err(Error::format(
            n,
            format!("declared {} layers but listed {} sizes", count, sizes.len()),
        ));
    }

    let mut network = Network::with_rng(&sizes, activator, rng).map_err(|e| Error::format(n, e.to_string()))?;

    for (l, &size) in sizes.iter().enumerate() {
        let (n, line) = lines.next_line("layer header")?;
        let declared: usize = parse_token(field(&line, &format!("Layer[{l}]:Size="), n)?, n, "layer size")?;
        if declared != size {
            return Err(Error::format(
                n,
                format!("layer {l} declares size {declared}, expected {size}"),
            ));
        }

        if l == 0 {
            for key in ["Biases:", "Weights:"] {
                let (n, line) = lines.next_line("input layer marker")?;
                if field(&line, key, n)? != NULL_MARKER {
                    return Err(Error::format(n, "input layer parameters must be null"));
                }
            }
            continue;
        }

        let input_size = sizes[l - 1];
        let layer = &mut network.layers_mut()[l];

        let (n, line) = lines.next_line("biases")?;
        let biases = parse_values(field(&line, "Biases:", n)?, size, n)?;
        layer.biases_mut().copy_from_slice(&biases);

        for i in 0..size {
            let (n, line) = lines.next_line("weights")?;
            let row = parse_values(field(&line, &format!("Weights[{i}]:"), n)?, input_size, n)?;
            layer.weights_mut().row_mut(i).copy_from_slice(&row);
        }
    }

    Ok(network)
}

impl Network {
    /// Saves the weights and biases to the file at `path`.
    pub fn save_weights<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path)?;
        write_weights(self, BufWriter::new(file))?;
        debug!("saved weights for {:?} to {}", self.layer_sizes(), path.display());
        Ok(())
    }

    /// Replaces this network with the one stored at `path`.
    ///
    /// Layer sizes come from the file; the activator and random source are
    /// kept. On failure the network is left as it was.
    pub fn load_weights<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let rng = StdRng::seed_from_u64(self.rng_mut().gen());
        let mut loaded = read_weights(BufReader::new(file), self.activator(), rng)?;
        loaded.set_mailbox(self.mailbox().cloned());
        debug!("loaded weights for {:?} from {}", loaded.layer_sizes(), path.display());
        *self = loaded;
        Ok(())
    }
}

/// Numbered, non-blank lines of a weight file.
struct Lines<R> {
    input: R,
    number: usize,
}

impl<R: BufRead> Lines<R> {
    fn new(input: R) -> Self {
        Lines { input, number: 0 }
    }

    /// Returns the next non-blank line and its 1-based number.
    fn next_line(&mut self, what: &str) -> Result<(usize, String)> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line)? == 0 {
                return Err(Error::format(
                    self.number + 1,
                    format!("unexpected end of file, expected {what}"),
                ));
            }
            self.number += 1;
            let trimmed = line.trim();
            if !trimmed.is_empty() {
                return Ok((self.number, trimmed.to_owned()));
            }
        }
    }
}

/// Strips `key` from the front of `line`, returning the trimmed remainder.
fn field<'a>(line: &'a str, key: &str, n: usize) -> Result<&'a str> {
    line.strip_prefix(key)
        .map(str::trim)
        .ok_or_else(|| Error::format(n, format!("expected `{key}`, found `{line}`")))
}

fn parse_token<T: FromStr>(token: &str, n: usize, what: &str) -> Result<T> {
    let token = token.trim();
    token
        .parse()
        .map_err(|_| Error::format(n, format!("invalid {what} `{token}`")))
}

/// Parses exactly `len` comma-separated numbers.
fn parse_values(body: &str, len: usize, n: usize) -> Result<Vec<f64>> {
    if body == NULL_MARKER {
        return Err(Error::format(n, "unexpected null for a layer with parameters"));
    }
    let values = body
        .split(',')
        .map(|token| parse_token::<f64>(token, n, "number"))
        .collect::<Result<Vec<_>>>()?;
    if values.len() != len {
        return Err(Error::format(
            n,
            format!("expected {} values, found {}", len, values.len()),
        ));
    }
    Ok(values)
}
