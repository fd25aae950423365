use chrono::Duration;
use checkin_core::model::{
    AnswerValue, CheckIn, CheckInId, CheckInStatus, ClientId, ClientProgress, ClientRosterEntry,
    CoachId, Goal, Measurements, Question, QuestionId, QuestionKind, Response, Template,
    TemplateId, UserId,
};
use checkin_core::time::fixed_now;
use storage::repository::{
    CheckInRepository, RosterRepository, StorageError, TemplateFilter, TemplateRepository,
};
use storage::sqlite::SqliteRepository;

fn build_template(id: &str, is_default: bool, created_days_ago: i64) -> Template {
    Template::from_persisted(
        TemplateId::new(id),
        format!("Template {id}"),
        vec![
            Question::new(QuestionId::new("q1"), QuestionKind::Text, "How was today?", true)
                .unwrap(),
            Question::slider(QuestionId::new("weight"), "Weight (kg)", false, Some(30.0), Some(250.0))
                .unwrap(),
            Question::radio(
                QuestionId::new("q3"),
                "Mood",
                false,
                vec!["good".into(), "bad".into()],
            )
            .unwrap(),
        ],
        UserId::new("coach-1"),
        is_default,
        fixed_now() - Duration::days(created_days_ago),
        fixed_now(),
    )
    .unwrap()
}

fn build_check_in(id: &str, client: &str, days_ago: i64, weight: Option<f64>) -> CheckIn {
    CheckIn::from_persisted(
        CheckInId::new(id),
        ClientId::new(client),
        CoachId::new("coach-1"),
        fixed_now() - Duration::days(days_ago),
        CheckInStatus::Completed,
        100.0,
        vec![
            Response::new(QuestionId::new("q1"), AnswerValue::Text("fine".into())),
            Response::new(QuestionId::new("q3"), AnswerValue::Bool(true)),
        ],
        weight.map_or_else(Measurements::default, Measurements::with_weight),
    )
    .unwrap()
}

#[tokio::test]
async fn sqlite_round_trips_templates_with_questions() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_templates?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let template = build_template("t1", true, 2);
    repo.upsert_template(&template).await.unwrap();

    let fetched = repo.get_template(&TemplateId::new("t1")).await.unwrap();
    assert_eq!(fetched, template);
    assert_eq!(fetched.questions().len(), 3);
    assert_eq!(fetched.questions()[1].slider_bounds(), (30.0, 250.0));

    // Upsert replaces the stored shape.
    let renamed = build_template("t1", false, 2);
    repo.upsert_template(&renamed).await.unwrap();
    let fetched = repo.get_template(&TemplateId::new("t1")).await.unwrap();
    assert!(!fetched.is_default());
}

#[tokio::test]
async fn sqlite_filters_default_templates() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_defaults?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.upsert_template(&build_template("t1", true, 5)).await.unwrap();
    repo.upsert_template(&build_template("t2", true, 1)).await.unwrap();
    repo.upsert_template(&build_template("t3", false, 0)).await.unwrap();

    let defaults = repo.list_templates(&TemplateFilter::defaults()).await.unwrap();
    assert_eq!(defaults.len(), 2);
    // Most recently created first.
    assert_eq!(defaults[0].id(), &TemplateId::new("t2"));
}

#[tokio::test]
async fn sqlite_create_is_conflict_safe_and_windows_by_date() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_checkins?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.create_check_in(&build_check_in("c1", "client-a", 3, Some(70.0)))
        .await
        .unwrap();
    repo.create_check_in(&build_check_in("c2", "client-a", 1, Some(68.0)))
        .await
        .unwrap();
    repo.create_check_in(&build_check_in("c3", "client-b", 2, None))
        .await
        .unwrap();

    let err = repo
        .create_check_in(&build_check_in("c1", "client-a", 0, None))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict));

    let window = repo
        .list_recent_for_coach(&CoachId::new("coach-1"), 2)
        .await
        .unwrap();
    assert_eq!(window.len(), 2);
    assert_eq!(window[0].id(), &CheckInId::new("c2"));
    assert_eq!(window[0].weight(), Some(68.0));
    assert_eq!(window[1].id(), &CheckInId::new("c3"));
    assert_eq!(window[1].weight(), None);

    let client_history = repo
        .list_for_client(&ClientId::new("client-a"), 10)
        .await
        .unwrap();
    assert_eq!(client_history.len(), 2);
    assert_eq!(client_history[0].id(), &CheckInId::new("c2"));
    assert_eq!(client_history[0].responses().len(), 2);
}

#[tokio::test]
async fn sqlite_round_trips_roster_and_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roster?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let entry = ClientRosterEntry {
        client_id: ClientId::new("client-a"),
        name: "Alex".into(),
        coach_id: CoachId::new("coach-1"),
        last_check_in_at: Some(fixed_now() - Duration::days(2)),
        streak_days: 6,
    };
    repo.upsert_entry(&entry).await.unwrap();

    let roster = repo.list_roster(&CoachId::new("coach-1")).await.unwrap();
    assert_eq!(roster, vec![entry]);
    assert!(repo.list_roster(&CoachId::new("coach-2")).await.unwrap().is_empty());

    let missing = repo
        .get_client_progress(&ClientId::new("client-a"))
        .await
        .unwrap_err();
    assert!(matches!(missing, StorageError::NotFound));

    let mut progress = ClientProgress {
        client_id: ClientId::new("client-a"),
        metrics: Default::default(),
        goals: Default::default(),
        last_updated: fixed_now(),
    };
    progress.metrics.insert("weight".into(), vec![70.0, 68.0]);
    progress.goals.insert(
        "weight".into(),
        Goal {
            target: 65.0,
            current: 68.0,
        },
    );
    repo.upsert_client_progress(&progress).await.unwrap();

    let fetched = repo
        .get_client_progress(&ClientId::new("client-a"))
        .await
        .unwrap();
    assert_eq!(fetched, progress);
}
