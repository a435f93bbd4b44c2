//! Shared test harness for integration tests.
//!
//! [`TestHarness::start`] lays out a small media tree in a temp directory,
//! scans it, and serves the full router on a random port. Tests talk to it
//! over HTTP with reqwest, the way real clients do.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use nf_core::config::{CollectionConfig, CollectionKind, Config};
use nf_library::LibraryHandle;
use nf_server::context::AppContext;
use nf_server::router::build_router;
use tempfile::TempDir;

pub const MOVIES_ID: u32 = 1;
pub const SHOWS_ID: u32 = 2;

/// Size of every fake video file, in bytes.
pub const VIDEO_SIZE: usize = 4096;

pub struct TestHarness {
    pub ctx: AppContext,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    /// Keeps the media tree alive for the lifetime of the test.
    pub media: TempDir,
}

impl TestHarness {
    /// Serve the default fixture tree with default settings.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Serve the default fixture tree after letting the test adjust the
    /// configuration.
    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let media = tempfile::tempdir().expect("failed to create media dir");
        build_media_tree(media.path());

        let mut config = Config::default();
        config.collections = vec![
            CollectionConfig {
                name: "Movies".into(),
                kind: CollectionKind::Movies,
                id: MOVIES_ID,
                directory: media.path().join("movies"),
            },
            CollectionConfig {
                name: "TV Shows".into(),
                kind: CollectionKind::Shows,
                id: SHOWS_ID,
                directory: media.path().join("shows"),
            },
        ];
        config.server.cache_dir = Some(media.path().join("cache"));
        config.library.rescan_interval_secs = 0;
        configure(&mut config);

        let library = nf_library::scan(&config.collections);
        let ctx = AppContext::new(config, LibraryHandle::new(library));
        let app = build_router(ctx.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            ctx,
            addr,
            client: reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .expect("failed to build client"),
            media,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Log in and return the access token.
    pub async fn login(&self) -> String {
        let resp = self
            .client
            .post(self.url("/Users/AuthenticateByName"))
            .header(
                "Authorization",
                r#"MediaBrowser Client="Infuse-Direct", Device="Apple TV", DeviceId="test-device", Version="8.0""#,
            )
            .json(&serde_json::json!({ "Username": "tester", "Pw": "" }))
            .send()
            .await
            .expect("login request failed");
        assert_eq!(resp.status(), 200, "login should succeed");
        let body: serde_json::Value = resp.json().await.expect("login body");
        body["AccessToken"]
            .as_str()
            .expect("AccessToken in login response")
            .to_string()
    }

    /// Authenticated GET.
    pub async fn get(&self, token: &str, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .header("X-Emby-Token", token)
            .send()
            .await
            .expect("request failed")
    }

    /// Authenticated GET returning the JSON body; panics on a non-200.
    pub async fn get_json(&self, token: &str, path: &str) -> serde_json::Value {
        let resp = self.get(token, path).await;
        assert_eq!(resp.status(), 200, "GET {path}");
        resp.json().await.expect("json body")
    }

    /// External id of the catalog item with this name.
    pub fn item_id(&self, name: &str) -> String {
        self.ctx
            .library
            .snapshot()
            .all_items()
            .find(|e| e.item.name == name)
            .map(|e| e.item.id.clone())
            .unwrap_or_else(|| panic!("no item named {name}"))
    }

    /// External id of an episode of the fixture show.
    pub fn episode_id(&self, season_no: u32, episode_no: u32) -> String {
        let library = self.ctx.library.snapshot();
        let show = library
            .all_items()
            .find(|e| e.item.is_show())
            .expect("fixture show");
        let episode = show
            .item
            .seasons
            .iter()
            .find(|s| s.season_no == season_no)
            .and_then(|s| s.episodes.iter().find(|e| e.episode_no == episode_no))
            .expect("fixture episode");
        format!("episode_{}", episode.id)
    }

    pub fn media_path(&self, rel: &str) -> PathBuf {
        self.media.path().join(rel)
    }
}

/// Movies: Alien (with artwork and descriptor), Blade Runner (bare).
/// Shows: The Expanse, season 1 with two episodes.
fn build_media_tree(root: &Path) {
    let alien = root.join("movies/Alien (1979)");
    std::fs::create_dir_all(&alien).unwrap();
    std::fs::write(alien.join("Alien.mp4"), video_bytes()).unwrap();
    write_jpeg(&alien.join("poster.jpg"), 60, 90);
    write_jpeg(&alien.join("fanart.jpg"), 96, 54);
    std::fs::write(
        alien.join("movie.nfo"),
        r#"<?xml version="1.0" encoding="UTF-8"?>
<movie>
  <title>Alien</title>
  <plot>In space no one can hear you scream.</plot>
  <year>1979</year>
  <rating>8.5</rating>
  <mpaa>R</mpaa>
  <genre>Horror</genre>
  <studio>20th Century Fox</studio>
  <actor><name>Sigourney Weaver</name><role>Ripley</role></actor>
</movie>"#,
    )
    .unwrap();

    let blade = root.join("movies/Blade Runner (1982)");
    std::fs::create_dir_all(&blade).unwrap();
    std::fs::write(blade.join("Blade Runner.mkv"), video_bytes()).unwrap();

    let show = root.join("shows/The Expanse (2015)");
    let season = show.join("Season 1");
    std::fs::create_dir_all(&season).unwrap();
    write_jpeg(&show.join("poster.jpg"), 60, 90);
    std::fs::write(
        show.join("tvshow.nfo"),
        r#"<tvshow><title>The Expanse</title><mpaa>TV-14</mpaa><genre>Drama</genre></tvshow>"#,
    )
    .unwrap();
    std::fs::write(season.join("The Expanse S01E01 Dulcinea.mkv"), video_bytes()).unwrap();
    std::fs::write(season.join("The Expanse S01E02 The Big Empty.mkv"), video_bytes()).unwrap();
}

fn video_bytes() -> Vec<u8> {
    (0..VIDEO_SIZE).map(|i| (i % 251) as u8).collect()
}

fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 4) as u8, (y * 2) as u8, 128])
    });
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageFormat::Jpeg)
        .unwrap();
    std::fs::write(path, buf.into_inner()).unwrap();
}
