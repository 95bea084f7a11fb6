//! Scoring primitives: tf, idf, norms, and the norm byte codec.
//!
//! Scores follow the classic tf·idf / cosine-normalization model. The
//! per-(document, field) norm `boost · 1/√length` is stored as a single
//! byte in a sign-less mini-float format (3-bit mantissa, 5-bit
//! exponent) that piggybacks on the IEEE-754 layout; decoding goes
//! through a precomputed 256-entry table on the scoring path.

use std::fmt::Debug;
use std::sync::OnceLock;

/// Exponent re-bias between the mini-float and IEEE-754 single format.
const EXPONENT_SHIFT: i32 = 63 - 15;

/// Decode a norm byte into the float it represents.
pub fn byte_to_float(b: u8) -> f32 {
    if b == 0 {
        return 0.0;
    }
    f32::from_bits(((b as u32) << 21) + ((EXPONENT_SHIFT as u32) << 24))
}

/// Encode a float as a norm byte, rounding down to the nearest
/// representable value. Values at or below zero encode as 0; positive
/// values too small for the format encode as 1; overflow saturates at
/// 255. `float_to_byte(byte_to_float(b)) == b` for every byte.
pub fn float_to_byte(f: f32) -> u8 {
    let bits = f.to_bits() as i32;
    let small = bits >> 21;
    if small <= EXPONENT_SHIFT << 3 {
        if bits <= 0 {
            0
        } else {
            1
        }
    } else if small >= (EXPONENT_SHIFT << 3) + 0x100 {
        255
    } else {
        (small - (EXPONENT_SHIFT << 3)) as u8
    }
}

static NORM_TABLE: OnceLock<[f32; 256]> = OnceLock::new();

/// The 256-entry norm decode table.
pub fn norm_table() -> &'static [f32; 256] {
    NORM_TABLE.get_or_init(|| {
        let mut table = [0.0f32; 256];
        for (b, slot) in table.iter_mut().enumerate() {
            *slot = byte_to_float(b as u8);
        }
        table
    })
}

/// Numeric scoring primitives.
///
/// A `Similarity` is chosen at searcher construction and consulted by
/// every weight and scorer; implementations are stateless.
pub trait Similarity: Send + Sync + Debug {
    /// Field-length normalization applied at index time.
    fn length_norm(&self, field: &str, num_terms: u32) -> f32;

    /// Cosine normalization of the query vector.
    fn query_norm(&self, sum_of_squared_weights: f32) -> f32;

    /// Term-frequency score component.
    fn tf(&self, freq: f32) -> f32;

    /// Score contribution of a sloppy phrase match at `distance`.
    fn sloppy_freq(&self, distance: u32) -> f32;

    /// Inverse document frequency.
    fn idf(&self, doc_freq: u32, max_doc: u32) -> f32;

    /// Reward for matching `overlap` of `max_overlap` boolean clauses.
    fn coord(&self, overlap: usize, max_overlap: usize) -> f32;

    /// Decode a stored norm byte.
    fn decode_norm(&self, b: u8) -> f32 {
        norm_table()[b as usize]
    }
}

/// The standard tf·idf similarity.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSimilarity;

impl Similarity for DefaultSimilarity {
    fn length_norm(&self, _field: &str, num_terms: u32) -> f32 {
        if num_terms == 0 {
            0.0
        } else {
            1.0 / (num_terms as f32).sqrt()
        }
    }

    fn query_norm(&self, sum_of_squared_weights: f32) -> f32 {
        if sum_of_squared_weights <= 0.0 {
            1.0
        } else {
            1.0 / sum_of_squared_weights.sqrt()
        }
    }

    fn tf(&self, freq: f32) -> f32 {
        freq.sqrt()
    }

    fn sloppy_freq(&self, distance: u32) -> f32 {
        1.0 / (distance as f32 + 1.0)
    }

    fn idf(&self, doc_freq: u32, max_doc: u32) -> f32 {
        (max_doc as f32 / (doc_freq as f32 + 1.0)).ln() + 1.0
    }

    fn coord(&self, overlap: usize, max_overlap: usize) -> f32 {
        if max_overlap == 0 {
            1.0
        } else {
            overlap as f32 / max_overlap as f32
        }
    }
}
