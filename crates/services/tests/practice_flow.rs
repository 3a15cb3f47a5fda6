use std::sync::Arc;

use drill_core::model::{Difficulty, SessionConfig, UserId};
use drill_core::session::Phase;
use drill_core::time::fixed_now;
use services::{
    Clock, DEFAULT_HISTORY_LIMIT, HistoryService, PracticeOptions, PracticeService, SubmitOutcome,
};
use storage::repository::{InMemoryRepository, SessionRecordRepository};

fn practice(repo: &InMemoryRepository, user: &str, seed: u64) -> PracticeService {
    PracticeService::with_options(
        Clock::fixed(fixed_now()),
        Arc::new(repo.clone()),
        PracticeOptions {
            seed: Some(seed),
            identity: Some(UserId::new(user).unwrap()),
            ..PracticeOptions::default()
        },
    )
}

#[tokio::test(start_paused = true)]
async fn finished_sessions_show_up_in_history() {
    let repo = InMemoryRepository::new();
    let service = practice(&repo, "ada", 3);

    for (count, wrong_first) in [(3_u32, true), (4, false)] {
        service
            .start(SessionConfig::new([11, 13], Difficulty::Hard, count))
            .await
            .unwrap();

        let mut first = true;
        loop {
            let question = service.snapshot().question.expect("question on screen");
            let answer = if first && wrong_first {
                "nope".to_owned()
            } else {
                question.answer().to_string()
            };
            first = false;
            match service.submit_answer(&answer).await.unwrap() {
                SubmitOutcome::Scored { .. } => service.settle().await,
                SubmitOutcome::Completed { record, .. } => {
                    assert_eq!(record.progress().len(), count as usize);
                    break;
                }
                SubmitOutcome::Ignored => panic!("answer ignored mid-session"),
            }
        }
        assert!(service.wait_for_persistence().await.is_some());
    }

    let history = HistoryService::new(Arc::new(repo.clone()));
    let items = history
        .history(&UserId::new("ada").unwrap(), DEFAULT_HISTORY_LIMIT)
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].label, "Session 1");
    assert_eq!((items[0].correct, items[0].incorrect, items[0].total), (2, 1, 3));
    assert_eq!((items[1].correct, items[1].incorrect, items[1].total), (4, 0, 4));

    let first = history.record(items[0].id).await.unwrap();
    assert_eq!(first.progress()[0].user_answer, None);
    assert!(!first.progress()[0].is_correct);
    assert_eq!(first.operands(), &[11, 13]);
}

#[tokio::test(start_paused = true)]
async fn abandoned_session_is_never_stored() {
    let repo = InMemoryRepository::new();
    let service = practice(&repo, "grace", 8);

    service
        .start(SessionConfig::new([12], Difficulty::Normal, 5))
        .await
        .unwrap();
    let answer = service.snapshot().question.unwrap().answer().to_string();
    service.submit_answer(&answer).await.unwrap();
    service.restart().await.unwrap();
    service.settle().await;

    assert_eq!(service.snapshot().phase, Phase::InProgress { index: 0 });
    assert_eq!(service.wait_for_persistence().await, None);

    let rows = repo
        .list_for_user(&UserId::new("grace").unwrap(), 10)
        .await
        .unwrap();
    assert!(rows.is_empty());
}
