//! Integration tests for Jellyfin system and user endpoints.

mod common;

use common::TestHarness;

// ---------------------------------------------------------------------------
// System info
// ---------------------------------------------------------------------------

#[tokio::test]
async fn system_info_public() {
    let h = TestHarness::start().await;
    let resp = h.client.get(h.url("/System/Info/Public")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["ServerName"], "notflix");
    assert_eq!(json["ProductName"], "Jellyfin Server");
    assert_eq!(json["Id"], h.ctx.config.jellyfin.server_id.as_str());
    assert!(json["Version"].is_string());
}

#[tokio::test]
async fn system_info_requires_token() {
    let h = TestHarness::start().await;
    let resp = h.client.get(h.url("/System/Info")).send().await.unwrap();
    assert_eq!(resp.status(), 401);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["code"], "unauthorized");

    let token = h.login().await;
    let json = h.get_json(&token, "/System/Info").await;
    assert_eq!(json["ServerName"], "notflix");
}

#[tokio::test]
async fn ping_get_and_post() {
    let h = TestHarness::start().await;
    let get = h.client.get(h.url("/System/Ping")).send().await.unwrap();
    assert_eq!(get.status(), 200);
    let post = h.client.post(h.url("/System/Ping")).send().await.unwrap();
    assert_eq!(post.status(), 200);
}

// ---------------------------------------------------------------------------
// Users and authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn public_users_is_empty() {
    let h = TestHarness::start().await;
    let resp = h.client.get(h.url("/Users/Public")).send().await.unwrap();
    assert_eq!(resp.status(), 200);
    let users: Vec<serde_json::Value> = resp.json().await.unwrap();
    assert!(users.is_empty());
}

#[tokio::test]
async fn authenticate_by_name_returns_session() {
    let h = TestHarness::start().await;
    let resp = h
        .client
        .post(h.url("/Users/AuthenticateByName"))
        .header(
            "X-Emby-Authorization",
            r#"MediaBrowser Client="Swiftfin", Device="iPhone", DeviceId="abc", Version="1.0""#,
        )
        .json(&serde_json::json!({ "Username": "alice", "Pw": "secret" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert!(!json["AccessToken"].as_str().unwrap().is_empty());
    assert_eq!(json["User"]["Name"], "alice");
    assert_eq!(json["SessionInfo"]["Client"], "Swiftfin");
    assert_eq!(json["SessionInfo"]["DeviceId"], "abc");
    assert_eq!(json["ServerId"], h.ctx.config.jellyfin.server_id.as_str());
}

#[tokio::test]
async fn each_login_gets_its_own_token() {
    let h = TestHarness::start().await;
    let first = h.login().await;
    let second = h.login().await;
    assert_ne!(first, second);
    h.get_json(&first, "/Users/Me").await;
    h.get_json(&second, "/Users/Me").await;
}

#[tokio::test]
async fn logout_revokes_only_that_token() {
    let h = TestHarness::start().await;
    let first = h.login().await;
    let second = h.login().await;

    let resp = h
        .client
        .post(h.url("/Sessions/Logout"))
        .header("X-Emby-Token", &first)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    assert_eq!(h.get(&first, "/Users/Me").await.status(), 401);
    h.get_json(&second, "/Users/Me").await;
}

#[tokio::test]
async fn malformed_login_body_is_400() {
    let h = TestHarness::start().await;
    let resp = h
        .client
        .post(h.url("/Users/AuthenticateByName"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn configured_username_is_enforced() {
    let h = TestHarness::start_with(|c| c.jellyfin.username = Some("Ripley".into())).await;

    let rejected = h
        .client
        .post(h.url("/Users/AuthenticateByName"))
        .json(&serde_json::json!({ "Username": "ash", "Pw": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(rejected.status(), 401);

    let accepted = h
        .client
        .post(h.url("/Users/AuthenticateByName"))
        .json(&serde_json::json!({ "Username": "ripley", "Pw": "" }))
        .send()
        .await
        .unwrap();
    assert_eq!(accepted.status(), 200);
}

#[tokio::test]
async fn unknown_token_is_rejected() {
    let h = TestHarness::start().await;
    let resp = h.get("not-a-token", "/Users/Me").await;
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn token_in_authorization_header_and_query() {
    let h = TestHarness::start().await;
    let token = h.login().await;

    let resp = h
        .client
        .get(h.url("/Users/Me"))
        .header(
            "Authorization",
            format!(r#"MediaBrowser Client="Infuse", Token="{token}""#),
        )
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let resp = h
        .client
        .get(h.url(&format!("/Users/Me?api_key={token}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn get_user_by_id() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let me = h.get_json(&token, "/Users/Me").await;
    let id = me["Id"].as_str().unwrap().to_string();

    let user = h.get_json(&token, &format!("/Users/{id}")).await;
    assert_eq!(user["Name"], "tester");

    let resp = h.get(&token, "/Users/someone-else").await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn unmatched_path_is_json_404() {
    let h = TestHarness::start().await;
    let resp = h.client.get(h.url("/Branding/Whatever")).send().await.unwrap();
    assert_eq!(resp.status(), 404);
    let json: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(json["path"], "/Branding/Whatever");
}
