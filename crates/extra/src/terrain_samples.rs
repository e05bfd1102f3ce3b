//! Deterministic heightfields for tests and demos.
//!
//! All of them produce heights already inside `[0, 1]`, so they can be fed to
//! a terrain patch without normalization.

use heightfield::Heightfield;

/// A size×size field of zeros.
pub fn flat_heightfield(size: usize) -> Heightfield {
    Heightfield::from_data(size, size, vec![0.0; size * size])
}

/// Flat except for a unit spike in the middle of the grid.
pub fn spike_heightfield(size: usize) -> Heightfield {
    let mut data = vec![0.0; size * size];
    data[size * (size / 2) + size / 2] = 1.0;

    Heightfield::from_data(size, size, data)
}

/// Heights rise linearly from 0 at the left edge to 1 at the right edge.
pub fn ramp_heightfield(size: usize) -> Heightfield {
    let span = (size - 1) as f32;
    let data = (0..size * size).map(|i| (i % size) as f32 / span).collect();

    Heightfield::from_data(size, size, data)
}

/// Irregular terrain from a small integer hash.
///
/// Useful when a test wants a landscape with structure at every scale
/// without dragging data files around; the same size always produces the
/// same heights.
pub fn rough_heightfield(size: usize) -> Heightfield {
    let mut data = Vec::with_capacity(size * size);
    for y in 0..size {
        for x in 0..size {
            let mut h = (x as u32).wrapping_mul(0x9e37_79b9) ^ (y as u32).wrapping_mul(0x85eb_ca6b);
            h ^= h >> 13;
            h = h.wrapping_mul(0xc2b2_ae35);
            h ^= h >> 16;
            data.push((h & 0xffff) as f32 / 65535.0);
        }
    }

    Heightfield::from_data(size, size, data)
}
