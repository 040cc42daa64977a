use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use draft_downloader::config::PipelineConfig;
use draft_downloader::downloader::Downloader;
use draft_downloader::progress::ProgressSender;
use draft_downloader::types::{AssetKind, DownloadTask, EditorVariant};
use std::fs;
use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn spawn_server(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

fn test_config(dir: &std::path::Path) -> PipelineConfig {
    let mut config = PipelineConfig::new(
        "http://unused.invalid",
        "test-key",
        dir.join("drafts"),
        dir.join("templates"),
        EditorVariant::Capcut,
    );
    config.max_retries = 1;
    config
}

fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<draft_downloader::ProgressEvent>) -> Vec<draft_downloader::ProgressEvent> {
    let mut events = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        events.push(ev);
    }
    events
}

#[tokio::test]
async fn test_local_file_source_is_copied_without_network() {
    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("already-here.mp3");
    fs::write(&source, b"local audio bytes").unwrap();

    let dest = dir.path().join("drafts/d1/assets/audio/already-here.mp3");
    let task = DownloadTask {
        kind: AssetKind::Audio,
        source: source.to_string_lossy().into_owned(),
        destination: dest.clone(),
        file_type: None,
    };

    let downloader = Downloader::new(&test_config(dir.path())).unwrap();
    let (progress, mut rx) = ProgressSender::channel();
    let downloaded = downloader.download_all(vec![task], &progress).await;

    assert_eq!(downloaded, vec![dest.clone()]);
    assert_eq!(fs::read(&dest).unwrap(), b"local audio bytes");
    assert!(drain(&mut rx).iter().all(|ev| ev.percent >= 0));
}

#[tokio::test]
async fn test_successful_remote_download_streams_to_destination() {
    let body = vec![0x5Au8; 64 * 1024];
    let expected = body.clone();
    let app = Router::new().route("/voice.mp3", get(move || {
        let body = body.clone();
        async move { body }
    }));
    let base = spawn_server(app).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("drafts/d1/assets/audio/voice.mp3");
    let task = DownloadTask {
        kind: AssetKind::Audio,
        source: format!("{}/voice.mp3", base),
        destination: dest.clone(),
        file_type: None,
    };

    let downloader = Downloader::new(&test_config(dir.path())).unwrap();
    let (progress, _rx) = ProgressSender::channel();
    let downloaded = downloader.download_all(vec![task], &progress).await;

    assert_eq!(downloaded.len(), 1);
    assert_eq!(fs::read(&dest).unwrap(), expected);
}

#[tokio::test]
async fn test_failed_task_reports_sentinel_and_leaves_run_alive() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();
    let app = Router::new().route("/gone.mp4", get(move || {
        let hits = handler_hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            (StatusCode::INTERNAL_SERVER_ERROR, "boom")
        }
    }));
    let base = spawn_server(app).await;

    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.mp3");
    fs::write(&good, b"fine").unwrap();

    let bad_dest = dir.path().join("drafts/d1/assets/video/gone.mp4");
    let good_dest = dir.path().join("drafts/d1/assets/audio/good.mp3");
    let tasks = vec![
        DownloadTask {
            kind: AssetKind::Video,
            source: format!("{}/gone.mp4", base),
            destination: bad_dest.clone(),
            file_type: None,
        },
        DownloadTask {
            kind: AssetKind::Audio,
            source: good.to_string_lossy().into_owned(),
            destination: good_dest.clone(),
            file_type: None,
        },
    ];

    let mut config = test_config(dir.path());
    config.max_retries = 2;
    let downloader = Downloader::new(&config).unwrap();
    let (progress, mut rx) = ProgressSender::channel();
    let downloaded = downloader.download_all(tasks, &progress).await;

    // Both attempts hit the server, then the task gave up.
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(downloaded, vec![good_dest]);
    assert!(!bad_dest.exists());

    let events = drain(&mut rx);
    let sentinel: Vec<_> = events.iter().filter(|ev| ev.percent == -1).collect();
    assert_eq!(sentinel.len(), 1);
    assert!(sentinel[0].message.contains("gone.mp4"));
}

#[tokio::test]
async fn test_undersized_image_gets_exactly_one_fallback_fetch() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();
    // Every response is a 512-byte stub, below the plausibility floor.
    let app = Router::new().route("/tiny.jpg", get(move || {
        let hits = handler_hits.clone();
        async move {
            hits.fetch_add(1, Ordering::SeqCst);
            vec![0u8; 512]
        }
    }));
    let base = spawn_server(app).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("drafts/d1/assets/image/tiny.jpg");
    let task = DownloadTask {
        kind: AssetKind::Image,
        source: format!("{}/tiny.jpg", base),
        destination: dest.clone(),
        file_type: None,
    };

    let mut config = test_config(dir.path());
    config.max_retries = 3;
    let downloader = Downloader::new(&config).unwrap();
    let (progress, mut rx) = ProgressSender::channel();
    let downloaded = downloader.download_all(vec![task], &progress).await;

    // Primary fetch succeeded on the first try, so only the single
    // fallback attempt follows; the primary path is never retried.
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(downloaded.is_empty());
    assert!(drain(&mut rx).iter().any(|ev| ev.percent == -1));
}

#[tokio::test]
async fn test_fallback_fetch_can_rescue_an_image() {
    let hits = Arc::new(AtomicUsize::new(0));
    let handler_hits = hits.clone();
    // First hit serves a stub, the fallback identity gets the real file.
    let app = Router::new().route("/cover.jpg", get(move || {
        let hits = handler_hits.clone();
        async move {
            if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                vec![0u8; 512]
            } else {
                vec![0xFFu8; 4096]
            }
        }
    }));
    let base = spawn_server(app).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("drafts/d1/assets/image/cover.jpg");
    let task = DownloadTask {
        kind: AssetKind::Image,
        source: format!("{}/cover.jpg", base),
        destination: dest.clone(),
        file_type: None,
    };

    let downloader = Downloader::new(&test_config(dir.path())).unwrap();
    let (progress, _rx) = ProgressSender::channel();
    let downloaded = downloader.download_all(vec![task], &progress).await;

    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert_eq!(downloaded, vec![dest.clone()]);
    assert_eq!(fs::metadata(&dest).unwrap().len(), 4096);
}

fn bundle_bytes() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    writer.start_file("effect/config.json", options).unwrap();
    writer.write_all(b"{\"id\":1}").unwrap();
    writer.start_file("__MACOSX/._config.json", options).unwrap();
    writer.write_all(b"resource fork junk").unwrap();
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn test_bundle_is_unpacked_and_cleaned() {
    let body = bundle_bytes();
    let app = Router::new().route("/pack.zip", get(move || {
        let body = body.clone();
        async move { body }
    }));
    let base = spawn_server(app).await;

    let dir = tempfile::tempdir().unwrap();
    let dest = dir.path().join("drafts/d1/assets/video/pack.zip");
    let task = DownloadTask {
        kind: AssetKind::Video,
        source: format!("{}/pack.zip", base),
        destination: dest.clone(),
        file_type: Some("zip".to_string()),
    };

    let downloader = Downloader::new(&test_config(dir.path())).unwrap();
    let (progress, _rx) = ProgressSender::channel();
    let downloaded = downloader.download_all(vec![task], &progress).await;

    assert_eq!(downloaded.len(), 1);
    let unpacked = dest.parent().unwrap();
    assert_eq!(
        fs::read(unpacked.join("effect/config.json")).unwrap(),
        b"{\"id\":1}"
    );
    assert!(!unpacked.join("__MACOSX").exists());
    assert!(!dest.exists());
}
