/// Router tests.
///
/// Tests first-match-wins resolution, the single-active invariant, history
/// integration (push, pop fast path, back/forward), and stale-render
/// suppression across navigations.
mod common;

use std::sync::{Arc, Mutex};

use serde_json::json;

use common::{Event, RecordingSink};
use reachard::router::{
    ActivationContext, History, MemoryHistory, Router, RouterError, StaticView, View,
    ViewBehavior,
};

type Activations = Arc<Mutex<Vec<(String, Vec<String>)>>>;

/// Records every activation and keeps the latest context.
struct Tracker {
    id: &'static str,
    log: Activations,
    last_ctx: Arc<Mutex<Option<ActivationContext>>>,
}

impl ViewBehavior for Tracker {
    fn activate(&mut self, ctx: &ActivationContext, params: &[String]) -> anyhow::Result<()> {
        self.log
            .lock()
            .unwrap()
            .push((self.id.to_string(), params.to_vec()));
        *self.last_ctx.lock().unwrap() = Some(ctx.clone());
        Ok(())
    }
}

struct Fixture {
    router: Router,
    sink: Arc<RecordingSink>,
    log: Activations,
    last_ctx: Arc<Mutex<Option<ActivationContext>>>,
}

fn fixture(location: &str, routes: &[(&'static str, &str)]) -> Fixture {
    let sink = Arc::new(RecordingSink::new());
    let log: Activations = Arc::default();
    let last_ctx = Arc::new(Mutex::new(None));
    let mut router = Router::new(Box::new(MemoryHistory::new(location)), sink.clone());
    for &(id, pattern) in routes {
        let tracker = Tracker {
            id,
            log: Arc::clone(&log),
            last_ctx: Arc::clone(&last_ctx),
        };
        router
            .register(View::new(id, &format!("{id} title"), pattern, tracker).unwrap())
            .unwrap();
    }
    Fixture {
        router,
        sink,
        log,
        last_ctx,
    }
}

const DASHBOARD_ROUTES: &[(&str, &str)] = &[
    ("home", "^/$"),
    ("targets", r"^/targets/?$"),
    ("target", r"^/target/(\d+)/?$"),
    ("profile", r"^/profile/?$"),
];

fn active_count(router: &Router) -> usize {
    router.views().iter().filter(|v| v.is_active()).count()
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

#[test]
fn earliest_registered_match_wins() {
    let mut f = fixture("/targets", &[("targets", r"^/targets/?$"), ("catch-all", "^/.*$")]);
    assert!(f.router.resolve_from_location());
    assert_eq!(f.router.active_id(), Some("targets"));

    assert!(f.router.navigate_to_path("/elsewhere"));
    assert_eq!(f.router.active_id(), Some("catch-all"));
}

#[test]
fn catch_all_registered_first_shadows_everything() {
    let mut f = fixture("/targets", &[("catch-all", "^/.*$"), ("targets", r"^/targets/?$")]);
    f.router.start();
    assert_eq!(f.router.active_id(), Some("catch-all"));
}

#[test]
fn captures_become_params() {
    let mut f = fixture("/target/42", DASHBOARD_ROUTES);
    f.router.start();
    assert_eq!(f.router.active_id(), Some("target"));
    assert_eq!(f.router.active_params(), ["42".to_string()]);
    assert_eq!(
        f.log.lock().unwrap().last().unwrap(),
        &("target".to_string(), vec!["42".to_string()])
    );
}

#[test]
fn unmatched_location_leaves_current_view() {
    let mut f = fixture("/profile", DASHBOARD_ROUTES);
    f.router.start();
    assert!(!f.router.navigate_to_path("/nope"));
    assert_eq!(f.router.active_id(), Some("profile"));
    assert_eq!(f.log.lock().unwrap().len(), 1);
}

#[test]
fn start_falls_back_to_first_view() {
    let mut f = fixture("/does/not/exist", DASHBOARD_ROUTES);
    f.router.start();
    assert_eq!(f.router.active_id(), Some("home"));
    assert_eq!(active_count(&f.router), 1);
    assert_eq!(f.router.location(), "/does/not/exist");
}

#[test]
fn start_sets_the_title() {
    let mut f = fixture("/profile", DASHBOARD_ROUTES);
    f.router.start();
    assert_eq!(f.sink.events(), vec![Event::Title("profile title".to_string())]);
}

// ---------------------------------------------------------------------------
// Explicit navigation
// ---------------------------------------------------------------------------

#[test]
fn navigate_pushes_history() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    f.router.navigate("target", "/target/7").unwrap();
    assert_eq!(f.router.location(), "/target/7");
    assert_eq!(f.router.active_params(), ["7".to_string()]);
}

#[test]
fn navigate_rejects_mismatched_path() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    let err = f.router.navigate("target", "/targets").unwrap_err();
    assert_eq!(
        err,
        RouterError::RouteMismatch {
            view_id: "target".to_string(),
            path: "/targets".to_string()
        }
    );
    assert_eq!(f.router.active_id(), Some("home"));
    assert_eq!(f.router.location(), "/");
}

#[test]
fn navigate_rejects_unknown_view() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    assert_eq!(
        f.router.navigate("settings", "/settings").unwrap_err(),
        RouterError::UnknownView("settings".to_string())
    );
}

#[test]
fn duplicate_ids_are_rejected() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    let dup = View::new("home", "again", "^/home$", StaticView).unwrap();
    assert_eq!(
        f.router.register(dup).unwrap_err(),
        RouterError::DuplicateView("home".to_string())
    );
}

#[test]
fn refresh_reactivates_without_history() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    f.router.navigate("target", "/target/3").unwrap();
    f.router.refresh();

    let log = f.log.lock().unwrap();
    assert_eq!(log.len(), 3);
    assert_eq!(log[2], ("target".to_string(), vec!["3".to_string()]));
    drop(log);
    assert!(f.router.back());
    assert_eq!(f.router.location(), "/");
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

#[test]
fn back_and_forward_restore_views() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    f.router.navigate("targets", "/targets").unwrap();
    f.router.navigate("target", "/target/9").unwrap();

    assert!(f.router.back());
    assert_eq!(f.router.active_id(), Some("targets"));
    assert!(f.router.back());
    assert_eq!(f.router.active_id(), Some("home"));
    assert!(!f.router.back());

    assert!(f.router.forward());
    assert!(f.router.forward());
    assert_eq!(f.router.active_id(), Some("target"));
    assert_eq!(f.router.active_params(), ["9".to_string()]);
    assert!(!f.router.forward());
}

#[test]
fn popped_entry_is_trusted_over_location() {
    let mut f = fixture("/profile", DASHBOARD_ROUTES);
    f.router.start();

    let state = json!({"view_id": "target", "params": ["5"]});
    assert!(f.router.on_history_popped(Some(&state)));
    assert_eq!(f.router.active_id(), Some("target"));
    assert_eq!(f.router.active_params(), ["5".to_string()]);
}

#[test]
fn malformed_pop_state_resolves_from_location() {
    let mut f = fixture("/profile", DASHBOARD_ROUTES);
    f.router.start();
    f.router.navigate("targets", "/targets").unwrap();

    for state in [json!("garbage"), json!({"view_id": "missing"}), json!(null)] {
        assert!(f.router.on_history_popped(Some(&state)));
        assert_eq!(f.router.active_id(), Some("targets"));
    }
    assert!(f.router.on_history_popped(None));
    assert_eq!(f.router.active_id(), Some("targets"));
}

#[test]
fn exactly_one_view_stays_active() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    assert_eq!(active_count(&f.router), 1);

    let _ = f.router.navigate("targets", "/targets");
    assert_eq!(active_count(&f.router), 1);
    let _ = f.router.navigate("target", "/nope");
    assert_eq!(active_count(&f.router), 1);
    f.router.navigate_to_path("/target/1");
    assert_eq!(active_count(&f.router), 1);
    f.router.navigate_to_path("/unmatched");
    assert_eq!(active_count(&f.router), 1);
    f.router.back();
    assert_eq!(active_count(&f.router), 1);
    f.router.on_history_popped(Some(&json!({"view_id": "profile"})));
    assert_eq!(active_count(&f.router), 1);
    f.router.resolve_from_location();
    assert_eq!(active_count(&f.router), 1);
    f.router.forward();
    assert_eq!(active_count(&f.router), 1);
}

#[test]
fn history_stack_matches_navigation() {
    let mut history = MemoryHistory::new("/");
    history.push(json!({"view_id": "targets", "params": []}), "/targets");
    let sink = Arc::new(RecordingSink::new());
    let mut router = Router::new(Box::new(history), sink);
    for (id, pattern) in DASHBOARD_ROUTES {
        router
            .register(View::new(id, id, pattern, StaticView).unwrap())
            .unwrap();
    }
    router.start();
    assert_eq!(router.active_id(), Some("targets"));
    assert!(router.back());
    assert_eq!(router.active_id(), Some("home"));
}

// ---------------------------------------------------------------------------
// Stale renders
// ---------------------------------------------------------------------------

#[test]
fn superseded_context_cannot_render() {
    let mut f = fixture("/target/1", DASHBOARD_ROUTES);
    f.router.start();
    let stale = f.last_ctx.lock().unwrap().clone().unwrap();
    assert!(stale.is_current());

    f.router.navigate("profile", "/profile").unwrap();
    assert!(!stale.is_current());
    assert!(stale.epoch() < f.router.epoch());

    f.sink.take();
    let drew = stale.render(|sink| sink.show_profile(true));
    assert!(!drew);
    assert!(f.sink.events().is_empty());

    let fresh = f.last_ctx.lock().unwrap().clone().unwrap();
    assert!(fresh.render(|sink| sink.show_profile(true)));
    assert_eq!(f.sink.events(), vec![Event::Profile(true)]);
}

#[test]
fn widgets_run_in_background_and_are_joined() {
    let mut f = fixture("/", DASHBOARD_ROUTES);
    f.router.start();
    let ctx = f.last_ctx.lock().unwrap().clone().unwrap();
    ctx.spawn_widget("late-chart", |ctx| {
        ctx.render(|sink| sink.show_no_targets());
    });
    f.router.wait_for_widgets();
    assert_eq!(f.sink.count(&Event::NoTargets), 1);
}
