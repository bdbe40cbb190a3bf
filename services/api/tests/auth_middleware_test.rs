//! Integration tests for the authentication tiers of the router: token
//! extraction, identity mirroring, blocked-user rejection, and the admin
//! gate. Served over a real listener so the middleware layers run exactly as
//! they do in production.

mod common;

use common::{build_state_with_identity, spawn_app, test_db, TokenIdentity};
use prog_helper_core::domain::Role;
use prog_helper_core::ports::DatabaseService;
use reqwest::StatusCode;

#[tokio::test]
async fn request_without_token_is_unauthorized() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[]);
    let base = spawn_app(build_state_with_identity(db, identity, Vec::new())).await;

    let resp = reqwest::get(format!("{base}/profile/me"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_token_is_unauthorized() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[("tok-real", "user-1", None)]);
    let base = spawn_app(build_state_with_identity(db, identity, Vec::new())).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/profile/me"))
        .bearer_auth("tok-forged")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_bearer_token_reaches_the_handler() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[("tok-1", "user-1", None)]);
    let base = spawn_app(build_state_with_identity(db.clone(), identity, Vec::new())).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/profile/me"))
        .bearer_auth("tok-1")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    // First sight of the identity mirrors it into a local user row.
    let user = db.get_user("user-1").await.expect("mirrored user");
    assert_eq!(user.role, Role::User);
}

#[tokio::test]
async fn session_cookie_is_accepted_as_credentials() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[("tok-cookie", "user-2", None)]);
    let base = spawn_app(build_state_with_identity(db, identity, Vec::new())).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/profile/me"))
        .header("Cookie", "theme=dark; session=tok-cookie")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn blocked_user_is_forbidden() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[("tok-3", "user-3", None)]);
    db.get_or_create_user("user-3", false).await.expect("user");
    db.set_user_blocked("user-3", true).await.expect("block");
    let base = spawn_app(build_state_with_identity(db, identity, Vec::new())).await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/profile/me"))
        .bearer_auth("tok-3")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_email_is_promoted_and_passes_the_admin_gate() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[("tok-admin", "admin-1", Some("admin@example.com"))]);
    let base = spawn_app(build_state_with_identity(
        db.clone(),
        identity,
        vec!["admin@example.com".to_string()],
    ))
    .await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/admin/users"))
        .bearer_auth("tok-admin")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);

    let user = db.get_user("admin-1").await.expect("mirrored admin");
    assert_eq!(user.role, Role::Admin);
}

#[tokio::test]
async fn regular_user_is_forbidden_from_admin_routes() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[("tok-4", "user-4", Some("user@example.com"))]);
    let base = spawn_app(build_state_with_identity(
        db,
        identity,
        vec!["admin@example.com".to_string()],
    ))
    .await;

    let resp = reqwest::Client::new()
        .get(format!("{base}/admin/users"))
        .bearer_auth("tok-4")
        .send()
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn global_stats_needs_no_credentials() {
    let (db, _pool) = test_db().await;
    let identity = TokenIdentity::new(&[]);
    let base = spawn_app(build_state_with_identity(db, identity, Vec::new())).await;

    let resp = reqwest::get(format!("{base}/stats/global"))
        .await
        .expect("request");
    assert_eq!(resp.status(), StatusCode::OK);
}
