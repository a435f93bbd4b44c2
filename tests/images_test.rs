//! Integration tests for the image endpoint.

mod common;

use common::TestHarness;

const ONE_MONTH: &str = "max-age=2592000";

#[tokio::test]
async fn poster_is_served_without_token() {
    let h = TestHarness::start().await;
    let id = h.item_id("Alien");

    let resp = h
        .client
        .get(h.url(&format!("/Items/{id}/Images/Primary")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["content-type"], "image/jpeg");
    assert_eq!(resp.headers()["cache-control"], ONE_MONTH);
    let body = resp.bytes().await.unwrap();
    let img = image::load_from_memory(&body).unwrap();
    assert_eq!((img.width(), img.height()), (60, 90));
}

#[tokio::test]
async fn poster_transform_is_cached() {
    let h = TestHarness::start().await;
    let id = h.item_id("Alien");
    let url = h.url(&format!("/Items/{id}/Images/Primary/0"));

    let first = h.client.get(&url).send().await.unwrap().bytes().await.unwrap();
    let second = h.client.get(&url).send().await.unwrap().bytes().await.unwrap();
    assert_eq!(first, second);

    let cached = std::fs::read_dir(h.media_path("cache")).unwrap().count();
    assert_eq!(cached, 1);
}

#[tokio::test]
async fn backdrop_is_served_as_is() {
    let h = TestHarness::start().await;
    let id = h.item_id("Alien");

    let resp = h
        .client
        .get(h.url(&format!("/Items/{id}/Images/Backdrop/0")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.unwrap();
    let original = std::fs::read(h.media_path("movies/Alien (1979)/fanart.jpg")).unwrap();
    assert_eq!(body.as_ref(), original.as_slice());
}

#[tokio::test]
async fn missing_image_is_404_without_cache_control() {
    let h = TestHarness::start().await;
    let id = h.item_id("Blade Runner");

    let resp = h
        .client
        .get(h.url(&format!("/Items/{id}/Images/Primary")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
    assert!(resp.headers().get("cache-control").is_none());

    let resp = h
        .client
        .get(h.url(&format!("/Items/{id}/Images/Logo")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn redirect_tag() {
    let h = TestHarness::start().await;
    let resp = h
        .client
        .get(h.url(
            "/Items/anything/Images/Primary?tag=redirect_https://image.example.org/a.jpg",
        ))
        .send()
        .await
        .unwrap();
    assert!(resp.status().is_redirection());
    assert_eq!(resp.headers()["location"], "https://image.example.org/a.jpg");
    assert_eq!(resp.headers()["cache-control"], ONE_MONTH);
}

#[tokio::test]
async fn file_tag_inside_collection_is_served() {
    let h = TestHarness::start().await;
    let poster = h.media_path("shows/The Expanse (2015)/poster.jpg");
    let resp = h
        .client
        .get(h.url("/Items/anything/Images/Primary"))
        .query(&[("tag", format!("file_{}", poster.display()))])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body = resp.bytes().await.unwrap();
    assert_eq!(body.as_ref(), std::fs::read(&poster).unwrap().as_slice());
}

#[tokio::test]
async fn file_tag_outside_collections_is_refused() {
    let h = TestHarness::start().await;
    let outside = tempfile::NamedTempFile::new().unwrap();
    std::fs::write(outside.path(), b"secret").unwrap();

    let resp = h
        .client
        .get(h.url("/Items/anything/Images/Primary"))
        .query(&[("tag", format!("file_{}", outside.path().display()))])
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn season_poster_falls_back_to_404() {
    let h = TestHarness::start().await;
    let token = h.login().await;
    let show_id = h.item_id("The Expanse");
    let seasons = h
        .get_json(&token, &format!("/Shows/{show_id}/Seasons"))
        .await;
    let season_id = seasons["Items"][0]["Id"].as_str().unwrap().to_string();

    let resp = h
        .client
        .get(h.url(&format!("/Items/{season_id}/Images/Primary")))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
