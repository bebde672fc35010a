//! Reader for the IDX format used by the MNIST image and label files.
//!
//! An IDX file starts with a four byte magic number: two zero bytes, a data
//! type code and the number of dimensions. Each dimension follows as a
//! big-endian `u32`, then the values themselves in row-major order. Only
//! unsigned byte data is supported.

use crate::error::{Error, Result};

use log::debug;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

/// Data type code for unsigned bytes.
pub const UNSIGNED_BYTE: u8 = 0x08;

/// A decoded IDX file: its dimensions and flat row-major contents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdxArray {
    dims: Vec<usize>,
    data: Vec<u8>,
}

/// Reads an unsigned byte IDX array from `reader`.
pub fn read_idx<R: Read>(mut reader: R) -> Result<IdxArray> {
    let mut magic = [0u8; 4];
    read_header(&mut reader, &mut magic)?;
    if magic[0] != 0 || magic[1] != 0 {
        return Err(Error::format(0, format!("bad IDX magic number {magic:02x?}")));
    }
    if magic[2] != UNSIGNED_BYTE {
        return Err(Error::format(
            0,
            format!("unsupported IDX data type 0x{:02x}, only unsigned bytes are supported", magic[2]),
        ));
    }

    let mut dims = Vec::with_capacity(usize::from(magic[3]));
    for _ in 0..magic[3] {
        let mut buf = [0u8; 4];
        read_header(&mut reader, &mut buf)?;
        dims.push(u32::from_be_bytes(buf) as usize);
    }
    let total = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .ok_or_else(|| Error::format(0, format!("IDX dimensions {dims:?} overflow")))?;

    // Read through `take` so a lying header cannot force a huge allocation.
    let mut data = Vec::new();
    reader.take(total as u64).read_to_end(&mut data)?;
    if data.len() != total {
        return Err(Error::format(
            0,
            format!("IDX data truncated: expected {} bytes, found {}", total, data.len()),
        ));
    }
    Ok(IdxArray { dims, data })
}

/// Reads an unsigned byte IDX array from the file at `path`.
pub fn read_idx_file<P: AsRef<Path>>(path: P) -> Result<IdxArray> {
    let path = path.as_ref();
    let array = read_idx(BufReader::new(File::open(path)?))?;
    debug!("read IDX array {:?} from {}", array.dims(), path.display());
    Ok(array)
}

fn read_header<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => Error::format(0, "IDX header truncated"),
        _ => Error::Io(e),
    })
}

impl IdxArray {
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Interprets a three dimensional array as `[count][height][width]`.
    pub fn into_images(self) -> Result<Images> {
        match self.dims[..] {
            [count, height, width] => Images::new(count, height, width, self.data),
            _ => Err(Error::format(
                0,
                format!("expected 3 image dimensions, found {:?}", self.dims),
            )),
        }
    }

    /// Interprets a one dimensional array as a list of labels.
    pub fn into_labels(self) -> Result<Vec<u8>> {
        match self.dims[..] {
            [_] => Ok(self.data),
            _ => Err(Error::format(
                0,
                format!("expected 1 label dimension, found {:?}", self.dims),
            )),
        }
    }
}

/// A stack of equally sized grayscale images.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Images {
    count: usize,
    height: usize,
    width: usize,
    pixels: Vec<u8>,
}

impl Images {
    /// Wraps `pixels`, which holds `count` images of `height` rows of
    /// `width` bytes each.
    pub fn new(count: usize, height: usize, width: usize, pixels: Vec<u8>) -> Result<Self> {
        let expected = count
            .checked_mul(height)
            .and_then(|n| n.checked_mul(width))
            .ok_or_else(|| Error::invalid("image dimensions overflow"))?;
        if pixels.len() != expected {
            return Err(Error::invalid(format!(
                "{} pixels do not fill {count} images of {height}x{width}",
                pixels.len()
            )));
        }
        Ok(Images {
            count,
            height,
            width,
            pixels,
        })
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Returns image `i` flattened row by row, so pixel `(y, x)` sits at
    /// `y * width + x`.
    ///
    /// Panics if `i >= len`.
    pub fn image(&self, i: usize) -> &[u8] {
        let size = self.height * self.width;
        &self.pixels[i * size..(i + 1) * size]
    }
}
