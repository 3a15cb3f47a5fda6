use std::collections::{BTreeSet, HashMap};

use drill_core::generator::generate;
use drill_core::model::{Difficulty, Score, SessionConfig, ValidationError};
use drill_core::session::{Action, Event, Phase, SessionState};
use drill_core::time::fixed_now;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn single_table_normal_session_pool() {
    let config = SessionConfig::new([12], Difficulty::Normal, 5);
    let pool = generate(&config, &mut StdRng::seed_from_u64(1));

    assert_eq!(pool.len(), 5);
    assert!(pool.iter().all(|q| q.operand == 12));
    let multipliers: BTreeSet<u32> = pool.iter().map(|q| q.multiplier).collect();
    assert_eq!(multipliers.len(), 5);
    assert!(multipliers.iter().all(|m| (1..=10).contains(m)));
}

#[test]
fn two_table_hard_session_pool() {
    let config = SessionConfig::new([11, 13], Difficulty::Hard, 5);
    let pool = generate(&config, &mut StdRng::seed_from_u64(2));

    let mut split: HashMap<i32, usize> = HashMap::new();
    for q in pool.iter() {
        *split.entry(q.operand).or_default() += 1;
    }
    assert_eq!(split, HashMap::from([(11, 2), (13, 3)]));
    assert!(pool.iter().all(|q| (5..=10).contains(&q.multiplier)));
}

#[test]
fn answering_twelve_times_seven() {
    // Search seeds for a pool that opens on 12 × 7.
    let config = SessionConfig::new([12], Difficulty::Normal, 5);
    let (mut rng, state) = (0..)
        .map(|seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            let (state, _) =
                SessionState::new().reduce(Action::Start(config.clone()), &mut rng, fixed_now());
            (rng, state)
        })
        .find(|(_, state)| state.current_question().map(|q| q.multiplier) == Some(7))
        .expect("some seed starts with 12 × 7");

    let (state, event) = state.reduce(Action::Submit("84".into()), &mut rng, fixed_now());

    assert!(matches!(event, Event::Answered { ref verdict, .. } if verdict.is_correct));
    assert_eq!(state.score(), Score { correct: 1, incorrect: 0 });
    assert!(state.progress()[0].is_correct);
    assert_eq!(state.progress()[0].user_answer, Some(84));
}

#[test]
fn empty_input_is_a_validation_message() {
    let mut rng = StdRng::seed_from_u64(3);
    let (state, _) = SessionState::new().reduce(
        Action::Start(SessionConfig::new([12], Difficulty::Normal, 5)),
        &mut rng,
        fixed_now(),
    );

    let (state, event) = state.reduce(Action::Submit(String::new()), &mut rng, fixed_now());

    assert_eq!(event, Event::Rejected(ValidationError::EmptyAnswer));
    assert_eq!(state.phase(), Phase::InProgress { index: 0 });
    assert_eq!(state.score(), Score::default());
    assert!(state.progress().iter().all(|e| !e.is_answered()));
}

#[test]
fn finishing_produces_one_record() {
    let mut rng = StdRng::seed_from_u64(4);
    let (mut state, _) = SessionState::new().reduce(
        Action::Start(SessionConfig::new([12, 13], Difficulty::Normal, 4)),
        &mut rng,
        fixed_now(),
    );
    let mut records = Vec::new();

    while !state.is_complete() {
        let raw = state.current_question().unwrap().answer().to_string();
        let (next, event) = state.reduce(Action::Submit(raw), &mut rng, fixed_now());
        state = match event {
            Event::Answered { advance, .. } => {
                next.reduce(Action::Advance(advance), &mut rng, fixed_now()).0
            }
            Event::Completed { record, .. } => {
                records.push(record);
                next
            }
            other => panic!("unexpected {other:?}"),
        };
    }

    assert_eq!(records.len(), 1);
    assert_eq!(records[0].progress().len(), 4);
    assert_eq!(records[0].total_questions(), 4);
    assert_eq!(records[0].correct(), 4);
}
