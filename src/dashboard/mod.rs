/// Dashboard: wires the auth cache, backend, router, and views together.
///
/// Registers the stock views in priority order:
///
/// | id           | path            | shows                               |
/// |--------------|-----------------|-------------------------------------|
/// | `home`       | `/`             | target list                         |
/// | `targets`    | `/targets`      | target list                         |
/// | `add-target` | `/targets/add`  | add-target instructions             |
/// | `target`     | `/target/{id}`  | target detail + incident/latency    |
/// | `profile`    | `/profile`      | session state                       |
///
/// Session and target mutations go through here so that the views depending
/// on them are refreshed afterwards. The auth cache itself never triggers a
/// refresh.
pub mod views;

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use thiserror::Error;
use tracing::{info, warn};

use crate::api::{ApiError, Backend, NewTarget, Target};
use crate::auth::AuthCache;
use crate::config::schema::ChartsConfig;
use crate::render::RenderSink;
use crate::router::{History, Router, View};
use crate::store::StoreError;

pub use views::{AddTargetView, ProfileView, TargetDetailView, TargetListView};

/// Source of "now" in epoch seconds.
pub type Clock = fn() -> i64;

fn system_clock() -> i64 {
    Utc::now().timestamp()
}

/// Path of the detail view for target `id`.
pub fn target_path(id: i64) -> String {
    format!("/target/{id}")
}

/// Failure of a dashboard operation.
#[derive(Debug, Error)]
pub enum DashboardError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Knobs for [`Dashboard::new`].
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub charts: ChartsConfig,
    pub clock: Clock,
    /// Restrict target lists to the caller's own targets.
    pub own_targets_only: bool,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            charts: ChartsConfig::default(),
            clock: system_clock,
            own_targets_only: false,
        }
    }
}

pub struct Dashboard {
    router: Router,
    auth: AuthCache,
    backend: Arc<dyn Backend>,
    own_targets_only: bool,
}

impl Dashboard {
    /// Build the dashboard and register its views. Call [`start`](Self::start)
    /// to activate the initial view.
    pub fn new(
        auth: AuthCache,
        backend: Arc<dyn Backend>,
        history: Box<dyn History>,
        sink: Arc<dyn RenderSink>,
        options: DashboardOptions,
    ) -> anyhow::Result<Self> {
        let mut router = Router::new(history, sink);
        let own = options.own_targets_only;

        let views = [
            View::new("home", "Reachard", "^/$", TargetListView::new(Arc::clone(&backend), own)),
            View::new(
                "targets",
                "Targets | Reachard",
                "^/targets/?$",
                TargetListView::new(Arc::clone(&backend), own),
            ),
            View::new(
                "add-target",
                "Add target | Reachard",
                "^/targets/add/?$",
                AddTargetView::new(auth.clone()),
            ),
            View::new(
                "target",
                "Target | Reachard",
                r"^/target/(\d+)/?$",
                TargetDetailView::new(Arc::clone(&backend), options.charts.clone(), options.clock),
            ),
            View::new("profile", "Profile | Reachard", "^/profile/?$", ProfileView::new(auth.clone())),
        ];

        for view in views {
            router.register(view.context("invalid view pattern")?)?;
        }

        Ok(Self {
            router,
            auth,
            backend,
            own_targets_only: own,
        })
    }

    pub fn start(&mut self) {
        self.router.start();
    }

    /// Follow an in-app link. Unknown paths leave the current view in place.
    pub fn open(&mut self, path: &str) -> bool {
        self.router.navigate_to_path(path)
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn router_mut(&mut self) -> &mut Router {
        &mut self.router
    }

    pub fn auth(&self) -> &AuthCache {
        &self.auth
    }

    pub fn is_logged_in(&self) -> bool {
        self.auth.is_logged_in()
    }

    /// Exchange credentials for a session token, persist it, and refresh
    /// the current view.
    pub fn log_in(&mut self, username: &str, password: &str) -> Result<(), DashboardError> {
        let token = self.backend.log_in(username, password)?;
        self.auth.set_token(&token)?;
        info!(%username, "logged in");
        self.router.refresh();
        Ok(())
    }

    /// Invalidate the session on the server (best effort), forget the token,
    /// and refresh the current view. A no-op when already logged out.
    pub fn log_out(&mut self) -> Result<(), DashboardError> {
        if !self.auth.is_logged_in() {
            return Ok(());
        }
        if let Err(e) = self.backend.log_out() {
            warn!(error = %e, "server-side logout failed; clearing local session anyway");
        }
        self.auth.clear_token()?;
        info!("logged out");
        self.router.refresh();
        Ok(())
    }

    pub fn list_targets(&self) -> Result<Vec<Target>, DashboardError> {
        Ok(self.backend.list_targets(self.own_targets_only)?)
    }

    pub fn add_target(&mut self, target: &NewTarget) -> Result<(), DashboardError> {
        self.backend.add_target(target)?;
        self.refresh_if_listing();
        Ok(())
    }

    pub fn delete_target(&mut self, id: i64) -> Result<(), DashboardError> {
        self.backend.delete_target(id)?;
        self.refresh_if_listing();
        Ok(())
    }

    /// Block until background chart loads have finished.
    pub fn wait_for_widgets(&self) {
        self.router.wait_for_widgets();
    }

    fn refresh_if_listing(&mut self) {
        if matches!(self.router.active_id(), Some("home" | "targets")) {
            self.router.refresh();
        }
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("router", &self.router)
            .field("own_targets_only", &self.own_targets_only)
            .finish_non_exhaustive()
    }
}
