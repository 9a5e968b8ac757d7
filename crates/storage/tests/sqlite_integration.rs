use chrono::Duration;
use lesson_core::model::{AchievementId, LearnerId, PhaseId, ProgressSnapshot, SectionId, UnitId};
use lesson_core::time::fixed_now;
use storage::repository::{ProgressKey, ProgressRepository, StorageError};
use storage::sqlite::SqliteRepository;

async fn connect(name: &str) -> SqliteRepository {
    let url = format!("sqlite:file:{name}?mode=memory&cache=shared");
    let repo = SqliteRepository::connect(&url).await.expect("connect");
    repo.migrate().await.expect("migrate");
    repo
}

fn sample_snapshot() -> ProgressSnapshot {
    let mut snapshot = ProgressSnapshot::empty(PhaseId::new("concepts"));
    snapshot.completed_units = vec![UnitId::new("ex1"), UnitId::new("ex4")];
    snapshot.completed_sections = vec![SectionId::new("section4")];
    snapshot.unlocked_achievements = vec![
        AchievementId::new("repo-initialized"),
        AchievementId::new("first-commit"),
    ];
    snapshot.completed_phases = vec![PhaseId::new("setup")];
    snapshot
}

#[tokio::test]
async fn sqlite_roundtrip_persists_snapshot() {
    let repo = connect("memdb_roundtrip").await;
    let key = ProgressKey::new("ada", "git-basics");

    assert_eq!(repo.load_snapshot(&key).await.unwrap(), None);

    let snapshot = sample_snapshot();
    repo.save_snapshot(&key, &snapshot, fixed_now()).await.unwrap();
    assert_eq!(repo.load_snapshot(&key).await.unwrap(), Some(snapshot.clone()));

    let mut newer = snapshot;
    newer.completed_units.push(UnitId::new("ex5"));
    repo.save_snapshot(&key, &newer, fixed_now() + Duration::minutes(5))
        .await
        .unwrap();
    assert_eq!(repo.load_snapshot(&key).await.unwrap(), Some(newer));
}

#[tokio::test]
async fn sqlite_migrates_legacy_payloads() {
    let repo = connect("memdb_legacy").await;
    sqlx::query(
        "INSERT INTO progress_snapshots (learner_id, course_id, snapshot_version, payload, updated_at)
         VALUES (?1, ?2, 0, ?3, ?4)",
    )
    .bind("ada")
    .bind("git-basics")
    .bind(r#"{"completedUnits":["ex1"],"completedSections":[],"unlockedAchievements":[],"currentPhase":"setup"}"#)
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let loaded = repo
        .load_snapshot(&ProgressKey::new("ada", "git-basics"))
        .await
        .unwrap()
        .expect("legacy row");
    assert_eq!(loaded.version, 1);
    assert_eq!(loaded.completed_units, vec![UnitId::new("ex1")]);
}

#[tokio::test]
async fn sqlite_reports_corrupt_payloads() {
    let repo = connect("memdb_corrupt").await;
    sqlx::query(
        "INSERT INTO progress_snapshots (learner_id, course_id, snapshot_version, payload, updated_at)
         VALUES ('ada', 'git-basics', 1, '{oops', ?1)",
    )
    .bind(fixed_now())
    .execute(repo.pool())
    .await
    .unwrap();

    let err = repo
        .load_snapshot(&ProgressKey::new("ada", "git-basics"))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Snapshot(_)));
}

#[tokio::test]
async fn sqlite_lists_and_deletes_per_learner() {
    let repo = connect("memdb_listing").await;
    let snapshot = sample_snapshot();
    repo.save_snapshot(&ProgressKey::new("ada", "git-basics"), &snapshot, fixed_now())
        .await
        .unwrap();
    repo.save_snapshot(
        &ProgressKey::new("ada", "html-basics"),
        &snapshot,
        fixed_now() + Duration::hours(2),
    )
    .await
    .unwrap();
    repo.save_snapshot(&ProgressKey::new("grace", "git-basics"), &snapshot, fixed_now())
        .await
        .unwrap();

    let listed = repo.list_progress(&LearnerId::new("ada")).await.unwrap();
    let courses: Vec<_> = listed.iter().map(|e| e.course.as_str()).collect();
    assert_eq!(courses, vec!["html-basics", "git-basics"]);

    assert!(repo
        .delete_snapshot(&ProgressKey::new("ada", "git-basics"))
        .await
        .unwrap());
    assert_eq!(repo.list_progress(&LearnerId::new("ada")).await.unwrap().len(), 1);
    assert_eq!(repo.list_progress(&LearnerId::new("grace")).await.unwrap().len(), 1);
}

#[tokio::test]
async fn migrations_are_idempotent() {
    let repo = connect("memdb_idempotent").await;
    repo.migrate().await.expect("second migrate");
}
