use rand::{seq::SliceRandom, Rng};

use crate::{models::CatalogTrack, services::candidate_pool::CandidatePool};

pub const DEFAULT_LIMIT: usize = 30;
pub const MIN_LIMIT: usize = 1;
pub const MAX_LIMIT: usize = 100;

/// Parses the raw `limit` query value into the served range
///
/// Missing or non-numeric values fall back to the default. Numbers outside
/// the range are clamped, including ones too large to fit an integer.
pub fn clamp_limit(raw: Option<&str>) -> usize {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_LIMIT;
    };

    match raw.parse::<i64>() {
        Ok(n) if n < MIN_LIMIT as i64 => MIN_LIMIT,
        Ok(n) if n > MAX_LIMIT as i64 => MAX_LIMIT,
        Ok(n) => n as usize,
        Err(_) => overflow_clamp(raw),
    }
}

/// Digit strings that overflow `i64` still clamp by sign
fn overflow_clamp(raw: &str) -> usize {
    let (negative, digits) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return DEFAULT_LIMIT;
    }

    if negative {
        MIN_LIMIT
    } else {
        MAX_LIMIT
    }
}

/// Uniformly shuffles the pool and keeps at most `limit` tracks
pub fn finalize<R>(pool: CandidatePool, limit: usize, rng: &mut R) -> Vec<CatalogTrack>
where
    R: Rng + ?Sized,
{
    let limit = limit.clamp(MIN_LIMIT, MAX_LIMIT);
    let mut tracks = pool.into_tracks();
    tracks.shuffle(rng);
    tracks.truncate(limit);
    tracks
}
