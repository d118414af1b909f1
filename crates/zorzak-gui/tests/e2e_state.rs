/// End-to-end tests for `AppState`: the dashboard state machine.
///
/// These exercise uploads, the store subscription, selection and the render
/// worker without opening a window. Renders use a stand-in backend (`sh`)
/// or a program that does not exist, so no Python is needed.
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use zorzak_core::config::{DashboardConfig, PortRange};
use zorzak_core::model::AnalysisFileCategory;
use zorzak_gui::state::{AppState, ViewState};
use zorzak_gui::ZorzakState;

// Renders redirect the process-wide console, so tests that render run one
// at a time.
static SERIAL: parking_lot::Mutex<()> = parking_lot::const_mutex(());

// ── Helpers ───────────────────────────────────────────────────────────────────

fn serial() -> parking_lot::MutexGuard<'static, ()> {
    SERIAL.lock()
}

fn config_with_backend(program: &str, script: &str) -> DashboardConfig {
    let mut config = DashboardConfig::default();
    config.ports = PortRange {
        min: 29_300,
        max: 29_400,
    };
    config.launch.timeout_ms = 5_000;
    config.launch.poll_interval_ms = 20;
    config.backend.program = program.into();
    config.backend.args = vec!["-c".into(), script.into()];
    config
}

/// A config whose backend can never start.
fn broken_config() -> DashboardConfig {
    config_with_backend("zorzak-no-such-backend", "")
}

fn write_profile(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// Pump `process_render_messages()` until nothing is rendering or the
/// deadline expires.
fn pump_until_rendered(state: &mut AppState) {
    let deadline = Instant::now() + Duration::from_secs(15);
    while state.is_rendering() {
        assert!(
            Instant::now() < deadline,
            "render did not complete within 15 seconds"
        );
        state.process_render_messages();
        std::thread::sleep(Duration::from_millis(10));
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[test]
fn uploaded_file_reaches_the_ui_list() {
    let _serial = serial();
    let mut state = AppState::new(broken_config());
    assert!(state.files.is_empty());

    let added = state.add_file("a.pstats", AnalysisFileCategory::Pstats, b"abc".to_vec());
    // Nothing shows until the frame drains the subscription.
    assert!(state.files.is_empty());

    assert!(state.process_file_messages());
    assert_eq!(state.files.len(), 1);
    assert!(std::sync::Arc::ptr_eq(&state.files[0], &added));
    assert_eq!(state.store.list(None).len(), 1);

    // The first file is selected and queued for rendering.
    assert_eq!(state.selected, Some(0));
    assert!(state.is_rendering());
    pump_until_rendered(&mut state);
}

#[test]
fn upload_from_disk_infers_name_and_category() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let path = write_profile(&dir, "run.pstats", b"\x00\x01profile");

    let mut state = AppState::new(broken_config());
    state.upload_path = path.display().to_string();
    state.submit_upload();

    assert!(state.last_error.is_none());
    assert!(state.upload_path.is_empty(), "form is cleared after upload");
    state.process_file_messages();
    let file = &state.files[0];
    assert_eq!(file.name(), "run.pstats");
    assert_eq!(file.category(), AnalysisFileCategory::Pstats);
    assert_eq!(file.content(), b"\x00\x01profile");
    pump_until_rendered(&mut state);
}

#[test]
fn missing_upload_path_reports_an_error() {
    let dir = TempDir::new().unwrap();
    let mut state = AppState::new(broken_config());
    state.upload_path = dir.path().join("gone.pstats").display().to_string();
    state.submit_upload();

    let error = state.last_error.clone().expect("error must be reported");
    assert!(error.contains("gone.pstats"), "{error}");
    assert!(!state.upload_path.is_empty(), "path is kept for correction");
    assert!(!state.process_file_messages());
    assert!(state.files.is_empty());
}

#[test]
fn empty_upload_path_is_rejected() {
    let mut state = AppState::new(broken_config());
    state.upload_path = "   ".into();
    state.submit_upload();
    assert!(state.last_error.is_some());
    assert!(state.store.is_empty());
}

#[test]
fn failed_render_is_recorded_and_retryable() {
    let _serial = serial();
    let mut state = AppState::new(broken_config());
    state.add_file("a.pstats", AnalysisFileCategory::Pstats, b"abc".to_vec());
    state.process_file_messages();
    pump_until_rendered(&mut state);

    assert!(matches!(state.selected_view(), Some(ViewState::Failed(_))));
    let error = state.last_error.clone().unwrap();
    assert!(error.starts_with("a.pstats:"), "{error}");
    let ports_before = state.ports_in_use();
    assert!(ports_before >= 1, "the first render claimed a port");

    state.request_render(0);
    assert!(matches!(state.selected_view(), Some(ViewState::Rendering)));
    pump_until_rendered(&mut state);
    assert!(matches!(state.selected_view(), Some(ViewState::Failed(_))));
    // Each render claims its own port; none is given back.
    assert_eq!(state.ports_in_use(), ports_before + 1);
}

#[cfg(unix)]
#[test]
fn successful_render_produces_a_view() {
    let _serial = serial();
    let config = config_with_backend("sh", "echo http://{host}:{port}/snakeviz/view; sleep 1");
    let mut state = AppState::new(config);
    state.add_file("a.pstats", AnalysisFileCategory::Pstats, b"abc".to_vec());
    state.process_file_messages();
    pump_until_rendered(&mut state);

    match state.selected_view() {
        Some(ViewState::Ready(view)) => {
            assert!(view.url.starts_with("http://127.0.0.1:29"), "{}", view.url);
            assert!(view.url.ends_with("/snakeviz/view"));
            assert!(view.html.contains(&view.url));
        }
        other => panic!("expected a ready view, got {other:?}"),
    }
    assert!(state.last_error.is_none());
}

#[test]
fn selecting_out_of_range_is_ignored() {
    let mut state = AppState::new(broken_config());
    state.select(3);
    assert_eq!(state.selected, None);
    assert!(state.views.is_empty());
}

#[test]
fn category_filter_limits_visible_files() {
    let _serial = serial();
    let mut state = AppState::new(broken_config());
    state.add_file("a.pstats", AnalysisFileCategory::Pstats, Vec::new());
    state.add_file("b.pstats", AnalysisFileCategory::Pstats, Vec::new());
    state.process_file_messages();

    state.category_filter = Some(AnalysisFileCategory::Pstats);
    let names: Vec<String> = state
        .visible_files()
        .iter()
        .map(|(_, f)| f.name().to_owned())
        .collect();
    assert_eq!(names, vec!["a.pstats", "b.pstats"]);

    state.category_filter = None;
    assert_eq!(state.visible_files().len(), 2);
    pump_until_rendered(&mut state);
}

#[test]
fn build_preloads_files_and_reports_bad_paths() {
    let _serial = serial();
    let dir = TempDir::new().unwrap();
    let good = write_profile(&dir, "good.pstats", b"1234");
    let bad = dir.path().join("bad.pstats");

    let mut built = ZorzakState::build(broken_config(), &[good, bad]);
    let state = built.state();
    assert_eq!(state.files.len(), 1);
    assert_eq!(state.files[0].name(), "good.pstats");
    assert_eq!(state.selected, Some(0));
    let error = state.last_error.as_deref().unwrap();
    assert!(error.contains("bad.pstats"), "{error}");

    pump_until_rendered(built.state_mut());
}
