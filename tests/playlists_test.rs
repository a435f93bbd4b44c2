//! Integration tests for playlists.

mod common;

use common::TestHarness;

async fn create(h: &TestHarness, token: &str, body: serde_json::Value) -> String {
    let resp = h
        .client
        .post(h.url("/Playlists"))
        .header("X-Emby-Token", token)
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    json["Id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn create_and_list_playlist() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let alien = h.item_id("Alien");
    let episode = h.episode_id(1, 1);

    let id = create(
        &h,
        &token,
        serde_json::json!({ "Name": "Friday", "Ids": [alien, episode] }),
    )
    .await;
    assert!(id.starts_with("playlist_"));

    let items = h
        .get_json(&token, &format!("/Playlists/{id}/Items"))
        .await;
    assert_eq!(items["TotalRecordCount"], 2);
    assert_eq!(items["Items"][0]["Name"], "Alien");
    assert_eq!(items["Items"][1]["Type"], "Episode");
    assert!(items["Items"][0]["PlaylistItemId"].is_string());

    let playlist = h.get_json(&token, &format!("/Items/{id}")).await;
    assert_eq!(playlist["Name"], "Friday");
    assert_eq!(playlist["Type"], "Playlist");
}

#[tokio::test]
async fn playlist_folder_lists_own_playlists() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    create(&h, &token, serde_json::json!({ "Name": "One" })).await;
    create(&h, &token, serde_json::json!({ "Name": "Two" })).await;

    let views = h.get_json(&token, "/UserViews").await;
    let folder = views["Items"]
        .as_array()
        .unwrap()
        .iter()
        .find(|v| v["CollectionType"] == "playlists")
        .unwrap()
        .clone();
    let folder_id = folder["Id"].as_str().unwrap();

    let lists = h
        .get_json(&token, &format!("/Items?parentId={folder_id}"))
        .await;
    assert_eq!(lists["TotalRecordCount"], 2);
}

#[tokio::test]
async fn add_and_remove_entries() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let alien = h.item_id("Alien");
    let blade = h.item_id("Blade Runner");
    let id = create(&h, &token, serde_json::json!({ "Name": "Queue", "Ids": [alien] })).await;

    let resp = h
        .client
        .post(h.url(&format!("/Playlists/{id}/Items?ids={blade},{alien}")))
        .header("X-Emby-Token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let items = h
        .get_json(&token, &format!("/Playlists/{id}/Items"))
        .await;
    assert_eq!(items["TotalRecordCount"], 3);
    let entry = items["Items"][0]["PlaylistItemId"].as_str().unwrap().to_string();

    let resp = h
        .client
        .delete(h.url(&format!("/Playlists/{id}/Items?entryIds={entry}")))
        .header("X-Emby-Token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 204);

    let items = h
        .get_json(&token, &format!("/Playlists/{id}/Items?limit=1"))
        .await;
    assert_eq!(items["TotalRecordCount"], 2);
    assert_eq!(items["Items"].as_array().unwrap().len(), 1);
    assert_eq!(items["Items"][0]["Name"], "Blade Runner");
}

#[tokio::test]
async fn create_from_query_string() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let alien = h.item_id("Alien");
    let resp = h
        .client
        .post(h.url(&format!("/Playlists?name=Quick&ids={alien}")))
        .header("X-Emby-Token", &token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn create_without_name_is_400() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let resp = h
        .client
        .post(h.url("/Playlists"))
        .header("X-Emby-Token", &token)
        .json(&serde_json::json!({ "Ids": [] }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn unknown_playlist_is_404() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let resp = h.get(&token, "/Playlists/playlist_missing/Items").await;
    assert_eq!(resp.status(), 404);
}
