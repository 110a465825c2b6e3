use sha2::{Digest, Sha256};

use super::DIFFICULTY_PREFIX;

/// Difficulty predicate shared by mining and chain validation: the SHA-256
/// hex of the decimal `candidate² - previous²` must start with
/// [`DIFFICULTY_PREFIX`]. The difference may be negative; pairs whose
/// squares overflow `i128` are never accepted.
pub fn satisfies(candidate: u64, previous: u64) -> bool {
    let (p, q) = (i128::from(candidate), i128::from(previous));
    let Some(diff) = p
        .checked_mul(p)
        .zip(q.checked_mul(q))
        .and_then(|(p2, q2)| p2.checked_sub(q2))
    else {
        return false;
    };

    let digest = Sha256::digest(diff.to_string().as_bytes());
    hex::encode(digest).starts_with(DIFFICULTY_PREFIX)
}

/// Brute-force the smallest proof >= 1 accepted for `previous`.
/// Deterministic and unbounded; runs on the caller's thread.
pub fn solve(previous: u64) -> u64 {
    let mut candidate: u64 = 1;
    while !satisfies(candidate, previous) {
        candidate += 1;
    }
    candidate
}
