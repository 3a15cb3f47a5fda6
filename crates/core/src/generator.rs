//! Question pool generation.
//!
//! A pool is built in two steps: each operand gets a block of questions with
//! distinct multipliers, then the concatenated blocks are shuffled once.

use rand::Rng;
use rand::seq::{SliceRandom, index};
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

use crate::model::{Question, QuestionPool, SessionConfig};

/// Splits `question_count` across operands in ascending order.
///
/// Every operand but the last gets `question_count / len`; the last one takes
/// whatever is left so the quotas always add up to `question_count`.
#[must_use]
pub fn quotas(operands: &BTreeSet<i32>, question_count: u32) -> Vec<(i32, u32)> {
    let len = operands.len();
    if len == 0 {
        return Vec::new();
    }
    let count = question_count as usize;
    let per_operand = count / len;
    let last_quota = count - per_operand * (len - 1);

    operands
        .iter()
        .enumerate()
        .map(|(idx, &operand)| {
            let quota = if idx + 1 == len { last_quota } else { per_operand };
            (operand, u32::try_from(quota).unwrap_or(u32::MAX))
        })
        .collect()
}

/// Draws up to `quota` distinct multipliers uniformly from `range`.
///
/// Sampling is without replacement and stops once the range is exhausted, so a
/// quota larger than the range yields a short block.
pub fn draw_multipliers<R: Rng + ?Sized>(
    range: RangeInclusive<u32>,
    quota: u32,
    rng: &mut R,
) -> Vec<u32> {
    let candidates: Vec<u32> = range.collect();
    let take = (quota as usize).min(candidates.len());
    index::sample(rng, candidates.len(), take)
        .iter()
        .map(|i| candidates[i])
        .collect()
}

/// Uniformly permutes the pool in place (Fisher–Yates via `SliceRandom`).
pub fn shuffle_pool<R: Rng + ?Sized>(questions: &mut [Question], rng: &mut R) {
    questions.shuffle(rng);
}

/// Generates the shuffled pool for an already validated config.
pub fn generate<R: Rng + ?Sized>(config: &SessionConfig, rng: &mut R) -> QuestionPool {
    let range = config.difficulty().multiplier_range();
    // A pool never outgrows one full range per operand, whatever the count asks for.
    let reachable = config.operands().len().saturating_mul(range.clone().count());
    let mut questions = Vec::with_capacity(reachable.min(config.question_count() as usize));

    for (operand, quota) in quotas(config.operands(), config.question_count()) {
        questions.extend(
            draw_multipliers(range.clone(), quota, rng)
                .into_iter()
                .map(|multiplier| Question::new(operand, multiplier)),
        );
    }

    shuffle_pool(&mut questions, rng);
    QuestionPool::new(questions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Difficulty;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::collections::HashMap;

    fn operands(values: &[i32]) -> BTreeSet<i32> {
        values.iter().copied().collect()
    }

    #[test]
    fn single_operand_normal_pool_has_distinct_multipliers() {
        let config = SessionConfig::new([12], Difficulty::Normal, 5);
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let pool = generate(&config, &mut rng);

            assert_eq!(pool.len(), 5);
            assert!(pool.iter().all(|q| q.operand == 12));
            assert!(pool.iter().all(|q| (1..=10).contains(&q.multiplier)));
            let distinct: BTreeSet<u32> = pool.iter().map(|q| q.multiplier).collect();
            assert_eq!(distinct.len(), 5);
        }
    }

    #[test]
    fn remainder_goes_to_last_operand() {
        assert_eq!(quotas(&operands(&[11, 13]), 5), vec![(11, 2), (13, 3)]);
        assert_eq!(quotas(&operands(&[11, 12, 13]), 10), vec![(11, 3), (12, 3), (13, 4)]);
        assert_eq!(quotas(&operands(&[11, 12, 13]), 2), vec![(11, 0), (12, 0), (13, 2)]);
        assert!(quotas(&BTreeSet::new(), 5).is_empty());
    }

    #[test]
    fn hard_pool_splits_and_stays_in_range() {
        let config = SessionConfig::new([11, 13], Difficulty::Hard, 5);
        let mut rng = StdRng::seed_from_u64(7);
        let pool = generate(&config, &mut rng);

        assert_eq!(pool.len(), 5);
        let mut per_operand: HashMap<i32, usize> = HashMap::new();
        for q in pool.iter() {
            *per_operand.entry(q.operand).or_default() += 1;
            assert!((5..=10).contains(&q.multiplier));
        }
        assert_eq!(per_operand.get(&11), Some(&2));
        assert_eq!(per_operand.get(&13), Some(&3));
    }

    #[test]
    fn pool_length_matches_count_when_range_allows() {
        let mut rng = StdRng::seed_from_u64(99);
        for count in 1..=20 {
            let config = SessionConfig::new([11, 12, 13, 14], Difficulty::Normal, count);
            let pool = generate(&config, &mut rng);
            assert_eq!(pool.len(), count as usize);
            assert!(pool.iter().all(|q| config.operands().contains(&q.operand)));
        }
    }

    #[test]
    fn quota_beyond_range_yields_short_block() {
        let config = SessionConfig::new([12], Difficulty::Hard, 20);
        let mut rng = StdRng::seed_from_u64(3);
        let pool = generate(&config, &mut rng);

        assert_eq!(pool.len(), 6);
        let distinct: BTreeSet<u32> = pool.iter().map(|q| q.multiplier).collect();
        assert_eq!(distinct, (5..=10).collect());
    }

    #[test]
    fn huge_question_count_yields_bounded_pool() {
        let config = SessionConfig::new([12], Difficulty::Normal, u32::MAX);
        assert!(config.validate().is_ok());
        let mut rng = StdRng::seed_from_u64(1);
        let pool = generate(&config, &mut rng);

        assert_eq!(pool.len(), 10);
        let distinct: BTreeSet<u32> = pool.iter().map(|q| q.multiplier).collect();
        assert_eq!(distinct, (1..=10).collect());

        let config = SessionConfig::new([11, 13], Difficulty::Hard, u32::MAX);
        assert_eq!(generate(&config, &mut rng).len(), 6);
    }

    #[test]
    fn draw_multipliers_is_bounded_by_range() {
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(draw_multipliers(1..=10, 0, &mut rng), Vec::<u32>::new());
        assert_eq!(draw_multipliers(5..=10, 100, &mut rng).len(), 6);
    }

    #[test]
    fn shuffle_preserves_multiset() {
        let mut rng = StdRng::seed_from_u64(11);
        let original: Vec<Question> = (1..=10)
            .flat_map(|m| [Question::new(11, m), Question::new(12, m)])
            .collect();
        let mut shuffled = original.clone();
        shuffle_pool(&mut shuffled, &mut rng);

        let mut before = original;
        let mut after = shuffled;
        before.sort();
        after.sort();
        assert_eq!(before, after);
    }

    #[test]
    fn shuffle_is_uniform_over_permutations() {
        const TRIALS: usize = 60_000;
        let mut rng = StdRng::seed_from_u64(2024);
        let base = [Question::new(1, 1), Question::new(1, 2), Question::new(1, 3)];
        let mut counts: HashMap<[u32; 3], usize> = HashMap::new();

        for _ in 0..TRIALS {
            let mut items = base;
            shuffle_pool(&mut items, &mut rng);
            let key = [items[0].multiplier, items[1].multiplier, items[2].multiplier];
            *counts.entry(key).or_default() += 1;
        }

        // 6 permutations, each expected TRIALS / 6 = 10_000 times (sd ~ 91).
        assert_eq!(counts.len(), 6);
        for (perm, seen) in counts {
            assert!((9_500..=10_500).contains(&seen), "{perm:?} seen {seen} times");
        }
    }
}
