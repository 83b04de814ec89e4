//! Behaviours of the stock dashboard views.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use super::Clock;
use crate::api::{ApiError, Backend};
use crate::auth::AuthCache;
use crate::config::schema::ChartsConfig;
use crate::router::{ActivationContext, ViewBehavior};
use crate::timeseries::{BUCKET_COUNT, incident_buckets};

const SECONDS_PER_HOUR: i64 = 3600;

// ---------------------------------------------------------------------------
// Target list
// ---------------------------------------------------------------------------

/// Lists targets. An empty list renders the "no targets" indicator.
pub struct TargetListView {
    backend: Arc<dyn Backend>,
    own: bool,
}

impl TargetListView {
    pub fn new(backend: Arc<dyn Backend>, own: bool) -> Self {
        Self { backend, own }
    }
}

impl ViewBehavior for TargetListView {
    fn activate(&mut self, ctx: &ActivationContext, _params: &[String]) -> Result<()> {
        let targets = match self.backend.list_targets(self.own) {
            Ok(targets) => targets,
            Err(ApiError::NotLoggedIn) => {
                debug!("target list needs a session");
                ctx.render(|sink| sink.show_profile(false));
                return Ok(());
            }
            Err(e) => return Err(e).context("failed to list targets"),
        };

        ctx.render(|sink| {
            sink.show_targets(&targets);
            if targets.is_empty() {
                sink.show_no_targets();
            }
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Add target
// ---------------------------------------------------------------------------

/// Shows how to add a target when logged in.
pub struct AddTargetView {
    auth: AuthCache,
}

impl AddTargetView {
    pub fn new(auth: AuthCache) -> Self {
        Self { auth }
    }
}

impl ViewBehavior for AddTargetView {
    fn activate(&mut self, ctx: &ActivationContext, _params: &[String]) -> Result<()> {
        let logged_in = self.auth.is_logged_in();
        ctx.render(|sink| {
            if logged_in {
                sink.show_add_target_form();
            } else {
                sink.show_profile(false);
            }
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Target detail
// ---------------------------------------------------------------------------

/// Shows one target, then loads its incident and latency charts in the
/// background.
pub struct TargetDetailView {
    backend: Arc<dyn Backend>,
    charts: ChartsConfig,
    clock: Clock,
}

impl TargetDetailView {
    pub fn new(backend: Arc<dyn Backend>, charts: ChartsConfig, clock: Clock) -> Self {
        Self {
            backend,
            charts,
            clock,
        }
    }
}

impl ViewBehavior for TargetDetailView {
    fn activate(&mut self, ctx: &ActivationContext, params: &[String]) -> Result<()> {
        let raw_id = params.first().context("target view needs an id")?;
        let id: i64 = raw_id
            .parse()
            .with_context(|| format!("invalid target id '{raw_id}'"))?;

        let target = match self.backend.target(id) {
            Ok(target) => target,
            Err(ApiError::NotLoggedIn) => {
                ctx.render(|sink| sink.show_profile(false));
                return Ok(());
            }
            Err(e) => return Err(e).with_context(|| format!("failed to load target {id}")),
        };
        ctx.render(|sink| sink.show_target(&target));

        let now = (self.clock)();
        let age = target.age(now);

        let backend = Arc::clone(&self.backend);
        ctx.spawn_widget("incidents", move |ctx| {
            let since = now.saturating_sub(BUCKET_COUNT as i64 * SECONDS_PER_HOUR);
            match backend.incidents(id, since) {
                Ok(timestamps) => {
                    let row = incident_buckets(&timestamps, now, age);
                    if !ctx.render(|sink| sink.show_incidents(id, &row)) {
                        debug!(target_id = id, "discarding stale incident chart");
                    }
                }
                Err(e) => warn!(target_id = id, error = %e, "failed to load incidents"),
            }
        });

        let backend = Arc::clone(&self.backend);
        let step = self.charts.latency_step_seconds;
        let window = self.charts.latency_window_hours.saturating_mul(SECONDS_PER_HOUR);
        ctx.spawn_widget("latencies", move |ctx| {
            match backend.latencies(id, now.saturating_sub(window), step) {
                Ok(series) => {
                    let gaps = series.gaps(step);
                    if !ctx.render(|sink| sink.show_latencies(id, &series, &gaps)) {
                        debug!(target_id = id, "discarding stale latency chart");
                    }
                }
                Err(e) => warn!(target_id = id, error = %e, "failed to load latencies"),
            }
        });

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Profile
// ---------------------------------------------------------------------------

/// Shows whether a session is active.
pub struct ProfileView {
    auth: AuthCache,
}

impl ProfileView {
    pub fn new(auth: AuthCache) -> Self {
        Self { auth }
    }
}

impl ViewBehavior for ProfileView {
    fn activate(&mut self, ctx: &ActivationContext, _params: &[String]) -> Result<()> {
        let logged_in = self.auth.is_logged_in();
        ctx.render(|sink| sink.show_profile(logged_in));
        Ok(())
    }
}
