//! Parsing and loading of textual heightmap files.
//!
//! # Format
//!
//! The first two whitespace-separated tokens are the grid width and height;
//! the remaining `width * height` tokens are decimal heights in row-major
//! order (row 0 first). Any whitespace separates tokens, so one row per line
//! or the whole grid on a single line parse the same:
//!
//! ```text
//! 3 3
//! 0.0 0.0 0.0
//! 0.0 1.0 0.0
//! 0.0 0.0 0.0
//! ```

use heightfield::Heightfield;

extern crate thiserror;

use self::thiserror::Error;

#[non_exhaustive]
#[derive(Error, Clone, Debug, PartialEq)]
pub enum ParseError {
    #[error("Missing grid dimensions.")]
    MissingDimensions,
    #[error("Expected an integer grid dimension, got {src:?}.")]
    Dimension { src: String },
    #[error("A {width}x{height} grid is too small to triangulate.")]
    GridTooSmall { width: usize, height: usize },
    #[error("Expected height sample #{index} to be a number, got {src:?}.")]
    Sample { src: String, index: usize },
    #[error("Expected {expected} height samples, got {found}.")]
    SampleCount { expected: usize, found: usize },
}

/// The loader's error type, separating unreadable files from malformed ones.
#[cfg(feature = "std")]
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read the heightmap: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Format(#[from] ParseError),
}

/// Parses the textual heightmap format into a heightfield.
///
/// Heights are kept exactly as they appear in the file; see
/// [`load_heightfield`](fn.load_heightfield.html) for the normalizing loader.
pub fn parse_heightfield(src: &str) -> Result<Heightfield, ParseError> {
    let mut tokens = src.split_whitespace();

    let width = parse_dimension(tokens.next())?;
    let height = parse_dimension(tokens.next())?;
    if width < 2 || height < 2 {
        return Err(ParseError::GridTooSmall { width, height });
    }

    let expected = width * height;
    let mut data = Vec::with_capacity(expected);
    for (index, token) in tokens.by_ref().take(expected).enumerate() {
        let z = token.parse::<f32>().map_err(|_| ParseError::Sample {
            src: token.into(),
            index,
        })?;
        data.push(z);
    }

    let found = data.len() + tokens.count();
    if found != expected {
        return Err(ParseError::SampleCount { expected, found });
    }

    Ok(Heightfield::from_data(width, height, data))
}

fn parse_dimension(token: Option<&str>) -> Result<usize, ParseError> {
    let token = token.ok_or(ParseError::MissingDimensions)?;
    token
        .parse::<usize>()
        .map_err(|_| ParseError::Dimension { src: token.into() })
}

/// Reads, parses and normalizes a heightmap file.
///
/// On success every height is rescaled into `[0, 1]` by the observed
/// maximum, ready to hand to a terrain patch.
#[cfg(feature = "std")]
pub fn load_heightfield<P: AsRef<std::path::Path>>(path: P) -> Result<Heightfield, LoadError> {
    let src = std::fs::read_to_string(path)?;
    let mut field = parse_heightfield(&src)?;
    field.normalize();

    Ok(field)
}
