//! Integration tests for the database adapter against a migrated in-memory
//! SQLite database: user mirroring, message ordering, the atomic counter
//! upserts and the idempotent language rows.

mod common;

use std::time::Duration;

use common::test_db;
use prog_helper_core::domain::{MessageRole, ProfileUpdate, Role, TaskStatus};
use prog_helper_core::ports::{DatabaseService, NewMessage, PortError};

#[tokio::test]
async fn get_or_create_user_is_idempotent_and_promotes_admins() {
    let (db, _pool) = test_db().await;

    let first = db.get_or_create_user("user-1", false).await.unwrap();
    assert_eq!(first.role, Role::User);
    assert!(!first.onboarding_completed);

    // Second sight returns the same row.
    let again = db.get_or_create_user("user-1", false).await.unwrap();
    assert_eq!(again.id, first.id);
    assert_eq!(again.created_at, first.created_at);

    // The admin flag promotes, and the promotion sticks.
    let promoted = db.get_or_create_user("user-1", true).await.unwrap();
    assert_eq!(promoted.role, Role::Admin);
    let still_admin = db.get_or_create_user("user-1", false).await.unwrap();
    assert_eq!(still_admin.role, Role::Admin);
}

#[tokio::test]
async fn blocking_round_trips_and_unknown_users_are_not_found() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    db.set_user_blocked("user-1", true).await.unwrap();
    assert!(db.get_user("user-1").await.unwrap().is_blocked);

    db.set_user_blocked("user-1", false).await.unwrap();
    assert!(!db.get_user("user-1").await.unwrap().is_blocked);

    let err = db.set_user_blocked("nobody", true).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}

#[tokio::test]
async fn profile_updates_leave_absent_fields_untouched() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    let updated = db
        .update_profile(
            "user-1",
            ProfileUpdate {
                experience_level: Some("beginner".to_string()),
                focus_areas: Some(vec!["web".to_string(), "databases".to_string()]),
                preferred_language: Some("python".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.experience_level.as_deref(), Some("beginner"));
    assert_eq!(updated.focus_areas.len(), 2);

    // A partial update only touches what it names.
    let updated = db
        .update_profile(
            "user-1",
            ProfileUpdate {
                experience_level: Some("advanced".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.experience_level.as_deref(), Some("advanced"));
    assert_eq!(updated.focus_areas, vec!["web", "databases"]);
    assert_eq!(updated.preferred_language.as_deref(), Some("python"));
}

#[tokio::test]
async fn messages_read_back_in_insertion_order() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();
    let session = db.create_chat_session("user-1", "Ordering").await.unwrap();

    for content in ["first", "second", "third"] {
        db.append_message(NewMessage {
            user_id: "user-1".to_string(),
            session_id: Some(session.id),
            role: MessageRole::User,
            content: content.to_string(),
            question_type: Some("General Programming".to_string()),
        })
        .await
        .unwrap();
        // Distinct timestamps keep the ordering unambiguous.
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    let messages = db.session_messages("user-1", session.id).await.unwrap();
    let contents: Vec<&str> = messages.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
    assert_eq!(db.count_session_messages(session.id).await.unwrap(), 3);
}

#[tokio::test]
async fn recent_question_types_come_back_newest_first() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();
    let session = db.create_chat_session("user-1", "Labels").await.unwrap();

    for label in ["Code Debugging", "Algorithm Help"] {
        db.append_message(NewMessage {
            user_id: "user-1".to_string(),
            session_id: Some(session.id),
            role: MessageRole::User,
            content: "question".to_string(),
            question_type: Some(label.to_string()),
        })
        .await
        .unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    // Assistant rows never carry a label and never show up here.
    db.append_message(NewMessage {
        user_id: "user-1".to_string(),
        session_id: Some(session.id),
        role: MessageRole::Assistant,
        content: "answer".to_string(),
        question_type: None,
    })
    .await
    .unwrap();

    let recent = db.recent_question_types("user-1", 10).await.unwrap();
    assert_eq!(recent, vec!["Algorithm Help", "Code Debugging"]);
}

#[tokio::test]
async fn record_question_folds_the_incremental_mean() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    let stats = db
        .record_question("user-1", 2.0, "Code Debugging")
        .await
        .unwrap();
    assert_eq!(stats.questions_asked, 1);
    assert!((stats.avg_response_time - 2.0).abs() < 1e-9);

    let stats = db
        .record_question("user-1", 4.0, "Code Debugging")
        .await
        .unwrap();
    assert_eq!(stats.questions_asked, 2);
    assert!((stats.avg_response_time - 3.0).abs() < 1e-9);

    let stats = db
        .record_question("user-1", 6.0, "Algorithm Help")
        .await
        .unwrap();
    assert_eq!(stats.questions_asked, 3);
    assert!((stats.avg_response_time - 4.0).abs() < 1e-9);
    assert_eq!(
        stats.most_frequent_response_type.as_deref(),
        Some("Algorithm Help")
    );
}

#[tokio::test]
async fn task_completions_count_separately_from_questions() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    db.record_question("user-1", 1.0, "Code Debugging")
        .await
        .unwrap();
    let stats = db.record_task_completion("user-1").await.unwrap();
    assert_eq!(stats.questions_asked, 1);
    assert_eq!(stats.tasks_completed, 1);
    assert!((stats.avg_response_time - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn language_rows_are_idempotent_and_additive() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    let languages = vec!["rust".to_string(), "python".to_string()];
    db.ensure_language_rows("user-1", &languages).await.unwrap();
    db.bump_language_progress("user-1", "rust", 1, 0)
        .await
        .unwrap();
    db.bump_language_progress("user-1", "rust", 1, 1)
        .await
        .unwrap();

    // Re-ensuring must not reset accumulated counters.
    db.ensure_language_rows("user-1", &languages).await.unwrap();

    let progress = db.list_language_progress("user-1").await.unwrap();
    assert_eq!(progress.len(), 2);
    let rust = progress.iter().find(|p| p.language == "rust").unwrap();
    assert_eq!(rust.questions_asked, 2);
    assert_eq!(rust.tasks_completed, 1);
    let python = progress.iter().find(|p| p.language == "python").unwrap();
    assert_eq!(python.questions_asked, 0);
}

#[tokio::test]
async fn task_progress_upserts_without_losing_the_solution() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    // Seeded catalog from the migrations.
    let tasks = db.list_tasks(None, None).await.unwrap();
    assert!(!tasks.is_empty());
    let task = &tasks[0];

    assert!(db
        .get_task_progress("user-1", task.id)
        .await
        .unwrap()
        .is_none());

    let progress = db
        .upsert_task_progress("user-1", task.id, TaskStatus::InProgress, None)
        .await
        .unwrap();
    assert_eq!(progress.status, TaskStatus::InProgress);
    assert!(progress.completed_at.is_none());

    let progress = db
        .upsert_task_progress(
            "user-1",
            task.id,
            TaskStatus::Completed,
            Some("my solution"),
        )
        .await
        .unwrap();
    assert_eq!(progress.status, TaskStatus::Completed);
    assert!(progress.completed_at.is_some());

    // A repeat completion without a solution keeps the stored one.
    let progress = db
        .upsert_task_progress("user-1", task.id, TaskStatus::Completed, None)
        .await
        .unwrap();
    assert_eq!(progress.solution.as_deref(), Some("my solution"));
}

#[tokio::test]
async fn assessments_filter_and_return_the_latest_attempt() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();

    let all = db.list_assessment_questions(None, None).await.unwrap();
    assert!(all.len() >= 4);
    let python_only = db
        .list_assessment_questions(Some("python"), None)
        .await
        .unwrap();
    assert!(python_only.iter().all(|q| q.language.as_deref() == Some("python")));

    use prog_helper_core::domain::AssessmentKind;
    assert!(db
        .latest_assessment("user-1", AssessmentKind::Pre)
        .await
        .unwrap()
        .is_none());

    db.save_assessment("user-1", AssessmentKind::Pre, 50.0, 4, "{}")
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    db.save_assessment("user-1", AssessmentKind::Pre, 75.0, 4, "{}")
        .await
        .unwrap();

    let latest = db
        .latest_assessment("user-1", AssessmentKind::Pre)
        .await
        .unwrap()
        .unwrap();
    assert!((latest.score - 75.0).abs() < 1e-9);
    assert!(db
        .latest_assessment("user-1", AssessmentKind::Post)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn global_stats_aggregate_across_users() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();
    db.get_or_create_user("user-2", false).await.unwrap();
    db.get_or_create_user("quiet-user", false).await.unwrap();

    let session_1 = db.create_chat_session("user-1", "One").await.unwrap();
    let session_2 = db.create_chat_session("user-2", "Two").await.unwrap();
    for (user_id, session_id, role) in [
        ("user-1", session_1.id, MessageRole::User),
        ("user-1", session_1.id, MessageRole::Assistant),
        ("user-2", session_2.id, MessageRole::User),
    ] {
        db.append_message(NewMessage {
            user_id: user_id.to_string(),
            session_id: Some(session_id),
            role,
            content: "text".to_string(),
            question_type: None,
        })
        .await
        .unwrap();
    }

    let global = db.global_stats().await.unwrap();
    assert_eq!(global.total_users, 3);
    assert_eq!(global.active_users, 2);
    assert_eq!(global.total_questions, 2);
    assert_eq!(global.total_solutions, 1);
}

#[tokio::test]
async fn deleting_a_session_requires_ownership() {
    let (db, _pool) = test_db().await;
    db.get_or_create_user("user-1", false).await.unwrap();
    db.get_or_create_user("user-2", false).await.unwrap();
    let session = db.create_chat_session("user-1", "Mine").await.unwrap();

    let err = db
        .delete_chat_session("user-2", session.id)
        .await
        .unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));

    db.delete_chat_session("user-1", session.id).await.unwrap();
    let err = db.get_chat_session("user-1", session.id).await.unwrap_err();
    assert!(matches!(err, PortError::NotFound(_)));
}
