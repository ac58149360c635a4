//! Tie-break helpers, used when every remaining candidate has the same number of votes.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rand::{rngs::StdRng, Rng, SeedableRng};

/// The average of the ranks received by a candidate, kept as a fraction
/// so that two averages can be compared exactly.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub(crate) struct MeanRank {
    sum: u64,
    count: u64,
}

impl MeanRank {
    /// None when the candidate did not receive any explicit rank.
    pub(crate) fn of(ranks: &[u32]) -> Option<MeanRank> {
        if ranks.is_empty() {
            None
        } else {
            Some(MeanRank {
                sum: ranks.iter().map(|r| *r as u64).sum(),
                count: ranks.len() as u64,
            })
        }
    }

    fn cmp_value(&self, other: &MeanRank) -> Ordering {
        (self.sum as u128 * other.count as u128).cmp(&(other.sum as u128 * self.count as u128))
    }
}

/// All the keys sharing the lowest mean rank. Keys without a mean never qualify,
/// so the result is empty when no key has one.
pub(crate) fn lowest_means<K: Copy>(means: &[(K, Option<MeanRank>)]) -> Vec<K> {
    let mut best: Option<MeanRank> = None;
    let mut res: Vec<K> = Vec::new();
    for (key, mean) in means.iter() {
        let mean = match mean {
            Some(m) => *m,
            None => continue,
        };
        match best.map(|b| mean.cmp_value(&b)) {
            Some(Ordering::Greater) => {}
            Some(Ordering::Equal) => res.push(*key),
            Some(Ordering::Less) | None => {
                best = Some(mean);
                res = vec![*key];
            }
        }
    }
    res
}

/// Folds the concatenated names into a number: every distinct character is
/// replaced by its position among the sorted distinct characters, in base 100.
/// The arithmetic wraps around on long names.
pub(crate) fn seed_from_names(sorted_names: &[String]) -> u64 {
    let joined: String = sorted_names.concat();
    let char_to_num: BTreeMap<char, u64> = joined
        .chars()
        .collect::<std::collections::BTreeSet<char>>()
        .into_iter()
        .enumerate()
        .map(|(idx, c)| (c, idx as u64))
        .collect();
    joined.chars().fold(0u64, |acc, c| {
        acc.wrapping_mul(100).wrapping_add(char_to_num[&c])
    })
}

/// Draws an index into the sorted names. The same names always give the same index.
pub(crate) fn draw_index(sorted_names: &[String]) -> usize {
    if sorted_names.len() <= 1 {
        return 0;
    }
    let mut rng = StdRng::seed_from_u64(seed_from_names(sorted_names));
    rng.gen_range(0..sorted_names.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(l: &[&str]) -> Vec<String> {
        l.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn seed_uses_sorted_character_positions() {
        assert_eq!(seed_from_names(&names(&["ab"])), 1);
        assert_eq!(seed_from_names(&names(&["ba"])), 100);
        // A0 B1 a2 e3 h4 l5 p6 t7
        assert_eq!(
            seed_from_names(&names(&["Alpha", "Beta"])),
            506040201030702
        );
    }

    #[test]
    fn seed_wraps_on_long_names() {
        let long = names(&["The Brothers Karamazov", "War and Peace", "Middlemarch"]);
        assert_eq!(seed_from_names(&long), seed_from_names(&long));
    }

    #[test]
    fn draw_is_stable() {
        let l = names(&["Alpha", "Beta"]);
        let first = draw_index(&l);
        assert!(first < 2);
        for _ in 0..10 {
            assert_eq!(draw_index(&l), first);
        }
        assert_eq!(draw_index(&names(&["Solo"])), 0);
    }

    #[test]
    fn lowest_means_compares_fractions() {
        let means = vec![
            ('a', MeanRank::of(&[1, 2])),
            ('b', MeanRank::of(&[2, 1, 1, 2])),
            ('c', MeanRank::of(&[2])),
            ('d', None),
        ];
        assert_eq!(lowest_means(&means), vec!['a', 'b']);

        let means = vec![('a', MeanRank::of(&[1, 3])), ('b', MeanRank::of(&[1, 1, 2]))];
        assert_eq!(lowest_means(&means), vec!['b']);

        let means: Vec<(char, Option<MeanRank>)> = vec![('a', None), ('b', None)];
        assert!(lowest_means(&means).is_empty());
    }
}
