//! Error types.

use std::io;

/// Everything that can go wrong while building, running, training or
/// persisting a network.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A vector did not match the width of the layer it was given to.
    #[error("{what} has length {actual}, expected {expected}")]
    Dimension {
        what: &'static str,
        expected: usize,
        actual: usize,
    },
    /// Malformed construction or training parameters.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// A weight or dataset file could not be parsed.
    ///
    /// `line` is 1-based, or 0 when the problem is not tied to a line.
    #[error("format error at line {line}: {message}")]
    Format { line: usize, message: String },
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub(crate) fn format<S: Into<String>>(line: usize, message: S) -> Self {
        Error::Format {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn invalid<S: Into<String>>(message: S) -> Self {
        Error::InvalidArgument(message.into())
    }
}

/// Returns a `Dimension` error unless `actual == expected`.
pub(crate) fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if actual != expected {
        return Err(Error::Dimension {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_message_names_both_lengths() {
        let err = check_len("input", 784, 783).unwrap_err();
        assert_eq!(err.to_string(), "input has length 783, expected 784");
    }

    #[test]
    fn matching_lengths_pass() {
        assert!(check_len("input", 3, 3).is_ok());
    }
}
