//! Backend selection
//!
//! Uniform random, single shot. No affinity, no round-robin state, no health
//! awareness: every call is an independent draw.
//!
//! The draw comes from the operating system's CSPRNG, so concurrent callers
//! never see correlated picks and outside observers cannot predict them.

use rand::rngs::OsRng;
use rand::{CryptoRng, Rng};

use crate::common::BackendCandidate;

/// Pick one backend uniformly at random. `None` only for an empty slice.
pub fn choose(candidates: &[BackendCandidate]) -> Option<&BackendCandidate> {
    choose_with(&mut OsRng, candidates)
}

/// Same as [`choose`] with an explicit cryptographically strong source
pub fn choose_with<'a, R>(
    rng: &mut R,
    candidates: &'a [BackendCandidate],
) -> Option<&'a BackendCandidate>
where
    R: Rng + CryptoRng,
{
    if candidates.is_empty() {
        return None;
    }
    candidates.get(rng.gen_range(0..candidates.len()))
}
