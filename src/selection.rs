//! Reproducible selection of row indices.
//!
//! Every call builds its own generator, so concurrent seeded selections never
//! interfere with each other: the same `(total, count, seed)` always yields
//! the same indices in the same order.

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};

/// How many records a request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleCount {
    /// Every available record, in ascending order.
    #[default]
    All,
    /// A uniformly random subset of exactly this size, drawn without replacement.
    Exactly(usize),
}

impl SampleCount {
    /// Interprets the wire-level `n_samples` value, where `-1` means "all".
    pub fn from_request(n_samples: i64) -> Result<Self> {
        match n_samples {
            -1 => Ok(SampleCount::All),
            n if n < 0 => Err(Error::InvalidRequest(format!(
                "n_samples must be -1 or non-negative, got {n}"
            ))),
            n => usize::try_from(n)
                .map(SampleCount::Exactly)
                .map_err(|_| Error::InvalidRequest(format!("n_samples {n} is too large"))),
        }
    }
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

/// Picks row indices out of `[0, total)`.
///
/// `filename` only labels the [`Error::InsufficientSamples`] message.
///
/// # Examples
///
/// ```rust
/// use gw_samples::selection::{select, SampleCount};
///
/// assert_eq!(select(4, SampleCount::All, None, "x").unwrap(), vec![0, 1, 2, 3]);
///
/// let a = select(100, SampleCount::Exactly(5), Some(42), "x").unwrap();
/// let b = select(100, SampleCount::Exactly(5), Some(42), "x").unwrap();
/// assert_eq!(a, b);
/// ```
pub fn select(
    total: usize,
    count: SampleCount,
    seed: Option<u64>,
    filename: &str,
) -> Result<Vec<usize>> {
    match count {
        SampleCount::All => Ok((0..total).collect()),
        SampleCount::Exactly(requested) if requested > total => Err(Error::InsufficientSamples {
            requested,
            available: total,
            filename: filename.to_string(),
        }),
        SampleCount::Exactly(requested) => {
            let mut rng = make_rng(seed);
            Ok(rand::seq::index::sample(&mut rng, total, requested).into_vec())
        }
    }
}

/// Picks members of an explicit population, returned in ascending order.
///
/// Positions are drawn with [`select`] over `population.len()` and mapped
/// back, so the reproducibility guarantee is the same. `population` must be
/// ascending for the output to be.
pub fn select_from(
    population: &[usize],
    count: SampleCount,
    seed: Option<u64>,
    filename: &str,
) -> Result<Vec<usize>> {
    let mut idxs: Vec<usize> = select(population.len(), count, seed, filename)?
        .into_iter()
        .map(|pos| population[pos])
        .collect();
    idxs.sort_unstable();
    Ok(idxs)
}
