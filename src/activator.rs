//! Activation function types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// [Activation function](https://en.wikipedia.org/wiki/Activation_function)
/// types.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activator {
    /// Logistic sigmoid, `1 / (1 + e^-x)`.
    #[default]
    Sigmoid,
    /// Heaviside step: 1 for positive inputs, 0 otherwise.
    Step,
    /// Passes values through unchanged. Used by the input layer.
    Identity,
}

impl Activator {
    /// Evaluates `f(x)` for this activation function.
    pub fn f(&self, x: f64) -> f64 {
        match *self {
            Activator::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activator::Step => {
                if x > 0.0 {
                    1.0
                } else {
                    0.0
                }
            }
            Activator::Identity => x,
        }
    }

    /// Evaluates the derivative `f'(x)`, where `x = f^{-1}(y)`.
    ///
    /// Note that this function takes in the *output* of the activation
    /// function, rather than the input. This is an optimization that means we
    /// don't have to store the intermediate results before activation.
    pub fn fprime(&self, y: f64) -> f64 {
        match *self {
            Activator::Sigmoid => y * (1.0 - y),
            Activator::Step => 0.0,
            Activator::Identity => 1.0,
        }
    }
}

impl fmt::Display for Activator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Activator::Sigmoid => "sigmoid",
            Activator::Step => "step",
            Activator::Identity => "identity",
        };
        f.write_str(name)
    }
}

impl FromStr for Activator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(Activator::Sigmoid),
            "step" => Ok(Activator::Step),
            "identity" => Ok(Activator::Identity),
            other => Err(Error::invalid(format!("unknown activator `{other}`"))),
        }
    }
}
