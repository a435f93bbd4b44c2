//! Integration tests for playback info and direct streaming.

mod common;

use common::{TestHarness, VIDEO_SIZE};

#[tokio::test]
async fn playback_info_describes_one_source() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.item_id("Alien");

    let resp = h
        .client
        .post(h.url(&format!("/Items/{id}/PlaybackInfo")))
        .header("X-Emby-Token", &token)
        .json(&serde_json::json!({}))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let json: serde_json::Value = resp.json().await.unwrap();
    let sources = json["MediaSources"].as_array().unwrap();
    assert_eq!(sources.len(), 1);
    // Source ids hash the video path; they are distinct from the item id.
    let video = h
        .ctx
        .library
        .snapshot()
        .all_items()
        .find(|e| e.item.id == id)
        .and_then(|e| e.item.video.clone())
        .unwrap();
    let expected = nf_core::ids::id_hash(&video.to_string_lossy());
    assert_eq!(sources[0]["Id"], expected.as_str());
    assert_ne!(sources[0]["Id"], id.as_str());
    assert_eq!(sources[0]["SupportsDirectPlay"], true);
    assert!(json["PlaySessionId"].as_str().is_some_and(|s| !s.is_empty()));
}

#[tokio::test]
async fn playback_info_for_episode() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.episode_id(1, 1);
    let json = h
        .get_json(&token, &format!("/Items/{id}/PlaybackInfo"))
        .await;
    assert_eq!(json["MediaSources"][0]["Size"], VIDEO_SIZE as u64);
}

#[tokio::test]
async fn playback_info_for_show_is_404() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.item_id("The Expanse");
    let resp = h.get(&token, &format!("/Items/{id}/PlaybackInfo")).await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn stream_whole_file() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.item_id("Alien");

    let resp = h.get(&token, &format!("/Videos/{id}/stream?static=true")).await;
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "video/mp4");
    assert_eq!(resp.headers()["accept-ranges"], "bytes");
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), VIDEO_SIZE);
}

#[tokio::test]
async fn stream_byte_range() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.episode_id(1, 2);

    let resp = h
        .client
        .get(h.url(&format!("/Videos/{id}/stream")))
        .header("X-Emby-Token", &token)
        .header("Range", "bytes=100-199")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers()["content-range"],
        format!("bytes 100-199/{VIDEO_SIZE}").as_str()
    );
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.len(), 100);
    assert_eq!(body[0], 100);
}

#[tokio::test]
async fn unsatisfiable_range_is_416() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.item_id("Alien");

    let resp = h
        .client
        .get(h.url(&format!("/Videos/{id}/stream")))
        .header("X-Emby-Token", &token)
        .header("Range", format!("bytes={}-", VIDEO_SIZE + 10))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 416);
}

#[tokio::test]
async fn stream_with_api_key_query() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let id = h.item_id("Blade Runner");

    let resp = h
        .client
        .get(h.url(&format!("/Items/{id}/Download?api_key={token}")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "video/x-matroska");
}

#[tokio::test]
async fn stream_requires_token() {
    let h = TestHarness::start().await;
    let id = h.item_id("Alien");
    let resp = h
        .client
        .get(h.url(&format!("/Videos/{id}/stream")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
