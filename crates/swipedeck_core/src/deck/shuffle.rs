//! Uniform in-place permutation.

use rand::Rng;

/// Fisher–Yates shuffle: every permutation is equally likely for a
/// uniform `rng`.
pub fn fisher_yates<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
