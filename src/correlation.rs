// correlation.rs - Spin-spin correlation functions over a window of states
//
// Every function here takes the snapshots as an iterator so the controller
// can hand over its ring buffer without copying it.

use crate::chain::Boundary;
use crate::error::{Result, SimError};

/// Running sums for one distance d over all (snapshot, pair) samples.
#[derive(Debug, Clone, Copy, Default)]
struct PairSums {
    products: i64, // Σ s_i s_{i+d}
    left: i64,     // Σ s_i
    right: i64,    // Σ s_{i+d}
    pairs: u64,
}

impl PairSums {
    fn raw(&self) -> f64 {
        self.products as f64 / self.pairs as f64
    }

    fn connected(&self) -> f64 {
        let n = self.pairs as f64;
        let c = self.products as f64 / n - (self.left as f64 / n) * (self.right as f64 / n);
        c.clamp(-1.0, 1.0)
    }
}

/// Partner of site `i` at distance `d`, if the pair exists under `boundary`.
#[inline]
fn partner(i: usize, d: usize, len: usize, boundary: Boundary) -> Option<usize> {
    match boundary {
        Boundary::Periodic => Some((i + d) % len),
        Boundary::Open => (i + d < len).then_some(i + d),
    }
}

fn accumulate<I, S>(states: I, max_distance: usize, boundary: Boundary) -> Result<Vec<PairSums>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[i8]>,
{
    let mut sums: Vec<PairSums> = Vec::new();
    let mut len = None;

    for state in states {
        let s = state.as_ref();
        let l = *len.get_or_insert(s.len());
        if s.len() != l {
            return Err(SimError::config(format!(
                "snapshot length {} does not match chain length {l}",
                s.len()
            )));
        }
        if sums.is_empty() {
            if max_distance >= l {
                return Err(SimError::config(format!(
                    "max distance {max_distance} must be < chain length {l}"
                )));
            }
            sums = vec![PairSums::default(); max_distance + 1];
        }
        for (d, acc) in sums.iter_mut().enumerate() {
            for i in 0..l {
                let Some(j) = partner(i, d, l, boundary) else { break };
                let (a, b) = (s[i] as i64, s[j] as i64);
                acc.products += a * b;
                acc.left += a;
                acc.right += b;
                acc.pairs += 1;
            }
        }
    }

    if len.is_none() {
        return Err(SimError::InsufficientHistory);
    }
    Ok(sums)
}

/// `C(d) = <s_i s_{i+d}>` averaged over every snapshot and every valid pair,
/// for `d` in `0..=max_distance`. `C(0)` is exactly 1.
pub fn raw_correlation<I, S>(states: I, max_distance: usize, boundary: Boundary) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[i8]>,
{
    Ok(accumulate(states, max_distance, boundary)?
        .iter()
        .map(PairSums::raw)
        .collect())
}

/// `G(d) = <s_i s_{i+d}> - <s_i><s_{i+d}>` with both means taken over the
/// same pairs as the product.
pub fn connected_correlation<I, S>(
    states: I,
    max_distance: usize,
    boundary: Boundary,
) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[i8]>,
{
    Ok(accumulate(states, max_distance, boundary)?
        .iter()
        .map(PairSums::connected)
        .collect())
}

/// Average of `s_0 s_i` for every site `i`: correlation measured from the
/// first spin only, without translation averaging.
pub fn reference_correlation<I, S>(states: I) -> Result<Vec<f64>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<[i8]>,
{
    let mut sums: Vec<i64> = Vec::new();
    let mut count = 0u64;
    for state in states {
        let s = state.as_ref();
        if sums.is_empty() {
            sums = vec![0; s.len()];
        } else if s.len() != sums.len() {
            return Err(SimError::config("snapshots have different lengths"));
        }
        for (acc, &si) in sums.iter_mut().zip(s) {
            *acc += (s[0] * si) as i64;
        }
        count += 1;
    }
    if count == 0 {
        return Err(SimError::InsufficientHistory);
    }
    Ok(sums.iter().map(|&x| x as f64 / count as f64).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alternating_ring() {
        // + - + - : neighbours anti-correlated, next-nearest correlated.
        let states = [vec![1i8, -1, 1, -1]];
        let c = raw_correlation(&states, 3, Boundary::Periodic).unwrap();
        assert_eq!(c, vec![1.0, -1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_open_chain_uses_inner_pairs_only() {
        // + + - : d=1 pairs (0,1)=+1, (1,2)=-1 ; d=2 pair (0,2)=-1
        let states = [vec![1i8, 1, -1]];
        let c = raw_correlation(&states, 2, Boundary::Open).unwrap();
        assert_eq!(c, vec![1.0, 0.0, -1.0]);
        let p = raw_correlation(&states, 2, Boundary::Periodic).unwrap();
        // d=1 ring pairs: (0,1)=+1 (1,2)=-1 (2,0)=-1
        assert!((p[1] + 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_connected_vanishes_for_frozen_state() {
        let states = [vec![1i8; 8], vec![1i8; 8]];
        let g = connected_correlation(&states, 7, Boundary::Periodic).unwrap();
        assert!(g.iter().all(|&x| x.abs() < 1e-12));
    }

    #[test]
    fn test_empty_and_too_far() {
        let empty: [Vec<i8>; 0] = [];
        assert_eq!(
            raw_correlation(&empty, 0, Boundary::Periodic),
            Err(SimError::InsufficientHistory)
        );
        let states = [vec![1i8; 4]];
        assert!(matches!(
            raw_correlation(&states, 4, Boundary::Periodic),
            Err(SimError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_reference_correlation_matches_hand_count() {
        let states = [vec![1i8, 1, -1], vec![-1i8, 1, 1]];
        let c = reference_correlation(&states).unwrap();
        assert_eq!(c, vec![1.0, 0.0, -1.0]);
    }
}
