//! End-to-end console workflows against a scripted backend.

mod common;

use chrono::Duration;
use common::{list_body, Harness};
use havirkesht_core::api::{ApiError, Method};
use havirkesht_core::console::{ConsoleError, Navigate, UserDraft};
use havirkesht_core::messages::{user_message, Operation};
use havirkesht_core::models::ResourceKind;

// ---------------------------------------------------------------------------
// Login and session lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn login_without_remember_keeps_token_ephemeral() {
    let mut h = Harness::new();
    h.transport.on(
        Method::Post,
        "/token",
        200,
        r#"{"access_token":"t-123","refresh_token":"r-456","expires_in":1800,"token_type":"bearer"}"#,
    );

    let nav = h.console.login(" admin ", "pw-secret", false).await.unwrap();

    assert_eq!(nav, Navigate::Main);
    assert_eq!(h.ephemeral_value("havirkesht_token").as_deref(), Some("t-123"));
    assert_eq!(h.durable_value("havirkesht_token"), None);
    assert_eq!(h.durable_value("havirkesht_refresh_token").as_deref(), Some("r-456"));
    assert_eq!(h.durable_value("havirkesht_username").as_deref(), Some("admin"));
    assert!(h.durable_value("havirkesht_token_expiry").is_some());
    assert!(h.session.is_fresh());

    assert_eq!(h.transport.form_field(0, "grant_type").as_deref(), Some("password"));
    assert_eq!(h.transport.form_field(0, "username").as_deref(), Some("admin"));
    assert_eq!(h.transport.form_field(0, "client_secret").as_deref(), Some("secret-key"));
    assert_eq!(h.transport.requests()[0].bearer, None);
}

#[tokio::test]
async fn login_rejected_stores_nothing() {
    let mut h = Harness::new();
    h.transport.on(Method::Post, "/token", 401, r#"{"detail":"Incorrect username or password"}"#);

    let err = h.console.login("admin", "wrong", true).await.unwrap_err();

    assert_eq!(err, ConsoleError::Api(ApiError::AuthInvalid));
    assert!(user_message(Operation::Login, &err).contains("wrong credentials"));
    assert!(h.durable.is_empty());
    assert!(h.ephemeral.is_empty());
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn blank_login_is_rejected_locally() {
    let mut h = Harness::new();
    let err = h.console.login("   ", "pw", false).await.unwrap_err();

    assert!(matches!(err, ConsoleError::Invalid(_)));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn resume_uses_fresh_session_without_network() {
    let mut h = Harness::logged_in();
    assert_eq!(h.console.resume().await, Navigate::Main);
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn resume_refreshes_stale_session() {
    let mut h = Harness::logged_in();
    h.clock.advance(Duration::minutes(56));
    h.transport.on(
        Method::Post,
        "/refresh-token",
        200,
        r#"{"access_token":"new-token","refresh_token":"refresh-2","expires_in":3600}"#,
    );

    assert_eq!(h.console.resume().await, Navigate::Main);
    assert_eq!(h.transport.log(), vec!["POST /refresh-token?refresh_token=refresh-1"]);
    assert_eq!(h.durable_value("havirkesht_token").as_deref(), Some("new-token"));
    assert_eq!(h.durable_value("havirkesht_refresh_token").as_deref(), Some("refresh-2"));
    assert!(h.session.is_fresh());
}

#[tokio::test]
async fn resume_with_rejected_refresh_goes_to_login() {
    let mut h = Harness::logged_in();
    h.clock.advance(Duration::hours(2));
    h.transport.on(Method::Post, "/refresh-token", 401, "");

    assert_eq!(h.console.resume().await, Navigate::Login);
    assert!(!h.session.is_authenticated());
    assert!(h.durable.is_empty());
}

#[tokio::test]
async fn resume_with_unreachable_refresh_keeps_session() {
    let mut h = Harness::logged_in();
    h.clock.advance(Duration::hours(2));
    h.transport.fail(Method::Post, "/refresh-token", "dns failure");

    assert_eq!(h.console.resume().await, Navigate::Login);
    assert_eq!(h.durable_value("havirkesht_refresh_token").as_deref(), Some("refresh-1"));
    assert_eq!(h.durable_value("havirkesht_username").as_deref(), Some("admin"));
}

#[tokio::test]
async fn resume_with_server_error_on_refresh_keeps_session() {
    let mut h = Harness::logged_in();
    h.clock.advance(Duration::hours(2));
    h.transport.on(Method::Post, "/refresh-token", 503, "");

    assert_eq!(h.console.resume().await, Navigate::Login);
    assert_eq!(h.durable_value("havirkesht_refresh_token").as_deref(), Some("refresh-1"));

    // Next start, with the server back
    h.transport.on(
        Method::Post,
        "/refresh-token",
        200,
        r#"{"access_token":"new-token","refresh_token":"refresh-2","expires_in":3600}"#,
    );
    assert_eq!(h.console.resume().await, Navigate::Main);
    assert_eq!(h.durable_value("havirkesht_token").as_deref(), Some("new-token"));
}

#[tokio::test]
async fn resume_with_bad_refresh_request_clears_session() {
    let mut h = Harness::logged_in();
    h.clock.advance(Duration::hours(2));
    h.transport.on(Method::Post, "/refresh-token", 400, r#"{"detail":"invalid refresh token"}"#);

    assert_eq!(h.console.resume().await, Navigate::Login);
    assert!(!h.session.is_authenticated());
    assert!(h.durable.is_empty());
}

#[tokio::test]
async fn resume_without_session_goes_to_login() {
    let mut h = Harness::new();
    assert_eq!(h.console.resume().await, Navigate::Login);
}

#[tokio::test]
async fn logout_clears_both_tiers_even_if_server_fails() {
    let mut h = Harness::logged_in();
    h.transport.fail(Method::Post, "/logout", "connection reset");

    h.console.logout().await;

    assert!(h.durable.is_empty());
    assert!(h.ephemeral.is_empty());
    assert_eq!(h.transport.log(), vec!["POST /logout?access_token=live-token"]);
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn list_sends_only_non_empty_filters() {
    let mut h = Harness::logged_in();
    h.transport.on(Method::Get, "/city/", 200, &list_body(&["Tabriz"], 1));

    {
        let view = h.console.state_mut().list_mut(ResourceKind::City);
        view.set_search("");
        view.set_parent_filter("5");
    }
    h.console.load(ResourceKind::City, 1).await.unwrap();

    assert_eq!(
        h.transport.log(),
        vec!["GET /city/?page=1&size=10&sort_by=created_at&sort_order=desc&province_id=5"]
    );
    assert_eq!(h.transport.requests()[0].bearer.as_deref(), Some("live-token"));
    let view = h.console.state().list(ResourceKind::City);
    assert_eq!(view.collection().items.len(), 1);
    assert_eq!(view.collection().total, 1);
}

#[tokio::test]
async fn list_without_items_is_an_empty_result() {
    let mut h = Harness::logged_in();
    h.transport.on(Method::Get, "/village/", 200, r#"{"total":0}"#);

    h.console.load(ResourceKind::Village, 1).await.unwrap();

    let view = h.console.state().list(ResourceKind::Village);
    assert!(view.collection().is_empty());
    assert!(view.collection().page_window().is_empty());
    assert!(view.error().is_none());
}

#[tokio::test]
async fn unauthorized_list_tears_down_session() {
    let mut h = Harness::logged_in();
    h.transport.on(Method::Get, "/users/", 401, r#"{"detail":"Not authenticated"}"#);

    let err = h.console.load(ResourceKind::User, 1).await.unwrap_err();

    assert!(err.requires_login());
    assert!(!h.session.is_authenticated());
    assert!(h.durable.is_empty());
}

#[tokio::test]
async fn out_of_order_responses_keep_latest_page() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Get, "/province/", 200, &list_body(&["p3-a", "p3-b"], 40))
        .on(Method::Get, "/province/", 200, &list_body(&["p4-a"], 40));

    let page3 = h.console.begin_load(ResourceKind::Province, 3);
    let page4 = h.console.begin_load(ResourceKind::Province, 4);
    let api = h.console.api().clone();

    let slow = havirkesht_core::Console::finish_load(api.clone(), page3).await;
    let fast = havirkesht_core::Console::finish_load(api, page4).await;

    assert_eq!(h.console.apply_load(&fast.0, fast.1), Ok(true));
    assert_eq!(h.console.apply_load(&slow.0, slow.1), Ok(false));

    let collection = h.console.state().list(ResourceKind::Province).collection();
    assert_eq!(collection.page(), 4);
    assert_eq!(collection.items.len(), 1);
    assert_eq!(collection.row_number(0), 31);
}

#[tokio::test]
async fn failed_load_keeps_previous_rows() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Get, "/province/", 200, &list_body(&["Fars", "Gilan"], 2))
        .on(Method::Get, "/province/", 500, r#"{"detail":"database unavailable"}"#);

    h.console.load(ResourceKind::Province, 1).await.unwrap();
    let err = h.console.reload(ResourceKind::Province).await.unwrap_err();

    assert_eq!(
        err,
        ConsoleError::Api(ApiError::Server {
            status: 500,
            message: "database unavailable".to_string()
        })
    );
    let view = h.console.state().list(ResourceKind::Province);
    assert_eq!(view.collection().items.len(), 2);
    assert_eq!(view.error(), Some("database unavailable"));
}

#[tokio::test]
async fn dashboard_counts_load_independently() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Get, "/province/", 200, &list_body(&["a"], 31))
        .on(Method::Get, "/city/", 200, &list_body(&["a"], 420))
        .on(Method::Get, "/village/", 503, "maintenance")
        .on(Method::Get, "/users/", 200, &list_body(&["a"], 7));

    let result = h.console.refresh_counts().await;

    assert!(matches!(
        result,
        Err(ConsoleError::Api(ApiError::Server { status: 503, .. }))
    ));
    let state = h.console.state();
    assert_eq!(state.count(ResourceKind::Province), Some(31));
    assert_eq!(state.count(ResourceKind::City), Some(420));
    assert_eq!(state.count(ResourceKind::Village), None);
    assert_eq!(state.count(ResourceKind::User), Some(7));
    assert!(h.transport.log().iter().all(|line| line.ends_with("?size=1")));
}

#[tokio::test]
async fn filter_options_populate_parent_choices() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Get, "/province/", 200, r#"{"items":[{"id":1,"province":"Tehran"}],"total":1}"#)
        .on(Method::Get, "/city/", 200, r#"{"items":[{"id":9,"city":"Karaj"}],"total":1}"#);

    h.console.load_filter_options().await.unwrap();

    let state = h.console.state();
    assert_eq!(state.filter_options(ResourceKind::City)[0].label, "Tehran");
    assert_eq!(state.filter_options(ResourceKind::Village)[0].value, "9");
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_triggers_exactly_two_follow_up_reads() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Post, "/city/", 201, "")
        .on(Method::Get, "/city/", 200, &list_body(&["Bonab"], 1))
        .on(Method::Get, "/city/", 200, &list_body(&["Bonab"], 1));

    h.console.create_city("Bonab", "4").await.unwrap();

    let log = h.transport.log();
    assert_eq!(log.len(), 3);
    assert_eq!(log[0], "POST /city/");
    assert!(log[1].starts_with("GET /city/?page=1&size=10"));
    assert_eq!(log[2], "GET /city/?size=1");
    assert_eq!(
        h.transport.json_body(0),
        Some(serde_json::json!({"city": "Bonab", "province_id": 4}))
    );
    assert_eq!(h.console.state().count(ResourceKind::City), Some(1));
}

#[tokio::test]
async fn create_reports_session_lost_during_reload() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Post, "/province/", 201, "")
        .on(Method::Get, "/province/", 401, "")
        .on(Method::Get, "/province/", 401, "");

    let err = h.console.create_province("Fars").await.unwrap_err();

    assert!(err.requires_login());
    assert!(!h.session.is_authenticated());
    assert_eq!(h.transport.log().len(), 2);
}

#[tokio::test]
async fn create_stands_when_reload_is_unreachable() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Post, "/province/", 201, "")
        .fail(Method::Get, "/province/", "connection reset")
        .on(Method::Get, "/province/", 200, &list_body(&["Fars"], 1));

    h.console.create_province("Fars").await.unwrap();

    assert_eq!(h.transport.log().len(), 3);
    assert!(h.session.is_authenticated());
    assert_eq!(h.console.state().count(ResourceKind::Province), Some(1));
}

#[tokio::test]
async fn delete_reports_session_lost_during_reload() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Delete, "/province/Fars", 204, "")
        .on(Method::Get, "/province/", 401, "");

    h.console.request_delete(ResourceKind::Province, "Fars", "Fars");
    let err = h.console.confirm_delete().await.unwrap_err();

    assert!(err.requires_login());
    assert!(h.console.state().delete_intent().is_none());
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn duplicate_province_gets_friendly_message() {
    let mut h = Harness::logged_in();
    h.transport.on(Method::Post, "/province/", 422, r#"{"detail":"already exists"}"#);

    let err = h.console.create_province("Fars").await.unwrap_err();

    assert_eq!(
        user_message(Operation::Create(ResourceKind::Province), &err),
        "Could not add province: the name already exists or is invalid."
    );
    assert_eq!(h.transport.log().len(), 1);
}

#[tokio::test]
async fn create_validation_sends_nothing() {
    let mut h = Harness::logged_in();

    assert!(h.console.create_province("  ").await.is_err());
    assert!(h.console.create_village("Abyaneh", "").await.is_err());
    let draft = UserDraft {
        username: "u".to_string(),
        password: "short".to_string(),
        fullname: "U".to_string(),
        email: "u@example.ir".to_string(),
        role: "user".to_string(),
        ..UserDraft::default()
    };
    assert!(h.console.create_user(&draft).await.is_err());

    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn create_user_posts_to_admin_endpoint() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Post, "/users/admin/", 200, r#"{"id":12,"username":"sara"}"#)
        .on(Method::Get, "/users/", 200, &list_body(&[], 5))
        .on(Method::Get, "/users/", 200, &list_body(&[], 5));

    let draft = UserDraft {
        username: "sara".to_string(),
        password: "longenough".to_string(),
        fullname: "Sara M".to_string(),
        email: "sara@example.ir".to_string(),
        phone_number: "09120000000".to_string(),
        role: "admin".to_string(),
        disabled: false,
    };
    h.console.create_user(&draft).await.unwrap();

    let body = h.transport.json_body(0).unwrap();
    assert_eq!(body["role_id"], 1);
    assert_eq!(body["phone_number"], "09120000000");
    assert_eq!(h.transport.log().len(), 3);
}

#[tokio::test]
async fn delete_intent_is_consumed_once() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Delete, "/village/Kandovan%20Old", 204, "")
        .on(Method::Get, "/village/", 200, &list_body(&[], 0))
        .on(Method::Get, "/village/", 200, &list_body(&[], 0));

    h.console.request_delete(ResourceKind::Village, "Kandovan Old", "Kandovan Old");
    let deleted = h.console.confirm_delete().await.unwrap();

    assert_eq!(deleted.id, "Kandovan Old");
    assert!(h.console.state().delete_intent().is_none());
    assert_eq!(h.transport.log()[0], "DELETE /village/Kandovan%20Old");
    assert_eq!(h.transport.log().len(), 3);

    let again = h.console.confirm_delete().await.unwrap_err();
    assert_eq!(again, ConsoleError::NoDeleteIntent);
    assert_eq!(h.transport.log().len(), 3);
}

#[tokio::test]
async fn village_in_use_cannot_be_deleted() {
    let mut h = Harness::logged_in();
    h.transport.on(Method::Delete, "/village/Masuleh", 400, r#"{"detail":"referenced"}"#);

    h.console.request_delete(ResourceKind::Village, "Masuleh", "Masuleh");
    let err = h.console.confirm_delete().await.unwrap_err();

    assert!(user_message(Operation::Delete(ResourceKind::Village), &err).contains("in use"));
    assert!(h.console.state().delete_intent().is_none());
    assert_eq!(h.transport.log().len(), 1);
}

#[tokio::test]
async fn cancelled_delete_sends_nothing() {
    let mut h = Harness::logged_in();
    h.console.request_delete(ResourceKind::User, "12", "sara");
    h.console.cancel_delete();

    assert_eq!(h.console.confirm_delete().await, Err(ConsoleError::NoDeleteIntent));
    assert!(h.transport.requests().is_empty());
}

#[tokio::test]
async fn password_change_ends_session() {
    let mut h = Harness::logged_in();
    h.transport
        .on(Method::Post, "/changepassword/", 200, r#"{"message":"ok"}"#)
        .on(Method::Post, "/logout", 200, "{}");

    let nav = h.console.change_password("old-pass", "new-pass", "new-pass").await.unwrap();

    assert_eq!(nav, Navigate::Login);
    assert_eq!(
        h.transport.json_body(0),
        Some(serde_json::json!({"current_password": "old-pass", "new_password": "new-pass"}))
    );
    assert!(!h.session.is_authenticated());
}

#[tokio::test]
async fn password_change_validation() {
    let mut h = Harness::logged_in();

    let mismatch = h.console.change_password("old-pass", "new-pass", "other-pass").await;
    assert!(matches!(mismatch, Err(ConsoleError::Invalid(_))));
    let short = h.console.change_password("old-pass", "abc", "abc").await;
    assert!(matches!(short, Err(ConsoleError::Invalid(_))));

    assert!(h.transport.requests().is_empty());
    assert!(h.session.is_authenticated());
}
