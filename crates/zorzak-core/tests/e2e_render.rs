//! End-to-end tests for the SnakeViz renderer with a stand-in backend.
//!
//! `sh` plays the part of `snakeviz`: it gets the same argument templates
//! treatment and prints a URL the way the real server does, so the whole
//! path (port allocation, staging, launch, URL discovery, embed HTML) runs
//! for real without Python installed.
#![cfg(unix)]

use std::net::TcpListener;
use std::time::Duration;
use zorzak_core::capture::{is_redirected, CaptureError};
use zorzak_core::config::{DashboardConfig, PortRange};
use zorzak_core::model::{AnalysisFile, AnalysisFileCategory};
use zorzak_core::render::{render_file, renderer_for, RenderError};

static SERIAL: parking_lot::Mutex<()> = parking_lot::const_mutex(());

// ── Helpers ──────────────────────────────────────────────────────────────────

fn sh_config(script: &str, timeout_ms: u64) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.ports = PortRange {
        min: 28_300,
        max: 28_400,
    };
    config.launch.timeout_ms = timeout_ms;
    config.launch.poll_interval_ms = 20;
    config.backend.program = "sh".into();
    config.backend.args = vec!["-c".into(), script.into()];
    config
}

fn sample_file() -> AnalysisFile {
    AnalysisFile::new("run.pstats", AnalysisFileCategory::Pstats, b"abcdef".to_vec())
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[test]
fn backend_url_becomes_an_iframe() {
    let _serial = SERIAL.lock();
    // The URL path carries the staged file's size, proving the content was
    // written before the backend started.
    let config = sh_config(
        "test -s {file} || exit 9; \
         echo 'snakeviz web server started on {host}:{port}'; \
         echo \"http://{host}:{port}/snakeviz/$(wc -c < {file} | tr -d ' ')\"; \
         sleep 1",
        5_000,
    );

    let view = render_file(&sample_file(), &config).unwrap();

    assert!(view.url.starts_with("http://127.0.0.1:28"), "url was {}", view.url);
    assert!(view.url.ends_with("/snakeviz/6"), "url was {}", view.url);
    assert!(view.html.starts_with("<iframe src=\""));
    assert!(view.html.contains(&view.url));
    assert!(!is_redirected());
}

#[test]
fn each_render_gets_its_own_port() {
    let _serial = SERIAL.lock();
    let config = sh_config("echo http://{host}:{port}/; sleep 1", 5_000);
    let renderer = renderer_for(AnalysisFileCategory::Pstats, &config);

    let first = renderer.render(&sample_file()).unwrap();
    let second = renderer.render(&sample_file()).unwrap();
    assert_ne!(first.url, second.url);
}

#[test]
fn backend_exiting_with_an_error_is_a_launch_failure() {
    let _serial = SERIAL.lock();
    let config = sh_config("echo 'No module named snakeviz' >&2; exit 3", 5_000);

    let err = render_file(&sample_file(), &config).unwrap_err();
    match err {
        RenderError::Launch(CaptureError::TaskFailed { source, .. }) => {
            assert!(source.to_string().contains("exited with"), "{source}");
        }
        other => panic!("expected a launch failure, got {other:?}"),
    }
    assert!(!is_redirected());
}

#[test]
fn missing_backend_program_is_a_launch_failure() {
    let _serial = SERIAL.lock();
    let mut config = sh_config("", 5_000);
    config.backend.program = "zorzak-no-such-backend".into();

    let err = render_file(&sample_file(), &config).unwrap_err();
    assert!(matches!(
        err,
        RenderError::Launch(CaptureError::TaskFailed { .. })
    ));
}

#[test]
fn silent_backend_times_out() {
    let _serial = SERIAL.lock();
    let config = sh_config("echo starting; sleep 1", 200);

    let err = render_file(&sample_file(), &config).unwrap_err();
    match err {
        RenderError::UrlNotFound { name, timeout } => {
            assert_eq!(name, "run.pstats");
            assert_eq!(timeout, Duration::from_millis(200));
        }
        other => panic!("expected UrlNotFound, got {other:?}"),
    }
    assert!(!is_redirected());
}

#[test]
fn occupied_port_range_is_reported() {
    let _serial = SERIAL.lock();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = sh_config("echo http://{host}:{port}/", 5_000);
    config.ports = PortRange {
        min: port,
        max: port + 1,
    };

    let err = render_file(&sample_file(), &config).unwrap_err();
    assert!(matches!(err, RenderError::Ports(_)));
}
