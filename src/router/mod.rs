/// View router: maps pathnames to views and keeps history in sync.
///
/// # State machine
///
/// ```text
///  start() ──▶ resolve_from_location() ──▶ first registered match wins
///                      │ (no match)
///                      ▼
///              first registered view
///
///  navigate(id, path) ──▶ match path against the view's own pattern
///                          ├─ mismatch → RouteMismatch (contract violation)
///                          └─ deactivate old, activate new, push entry
///
///  back()/forward() ──▶ on_history_popped(state)
///                          ├─ well-formed NavigationEntry → activate directly
///                          └─ otherwise → resolve_from_location()
/// ```
///
/// Exactly one view is active once the router has started. An unmatched
/// location leaves the current view in place.
///
/// Every activation bumps a navigation epoch. Views render through an
/// [`ActivationContext`] that drops writes from superseded epochs, so
/// background widget loads cannot overwrite a newer view.
pub mod history;
pub mod pattern;
pub mod view;

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::render::RenderSink;

pub use history::{History, HistoryRecord, MemoryHistory, NavigationEntry};
pub use pattern::PathPattern;
pub use view::{ActivationContext, StaticView, View, ViewBehavior, ViewState};
use view::{EpochCell, WidgetHandles};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Router contract violations. These indicate a caller bug (a link to a
/// view with a path its pattern does not accept), not a user error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
    #[error("no view registered with id '{0}'")]
    UnknownView(String),

    #[error("path '{path}' does not match the pattern of view '{view_id}'")]
    RouteMismatch { view_id: String, path: String },

    #[error("view id '{0}' is already registered")]
    DuplicateView(String),
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub struct Router {
    views: Vec<View>,
    active: Option<usize>,
    active_params: Vec<String>,
    history: Box<dyn History>,
    sink: Arc<dyn RenderSink>,
    epoch: EpochCell,
    widgets: WidgetHandles,
}

impl Router {
    pub fn new(history: Box<dyn History>, sink: Arc<dyn RenderSink>) -> Self {
        Self {
            views: Vec::new(),
            active: None,
            active_params: Vec::new(),
            history,
            sink,
            epoch: Arc::new(Mutex::new(0)),
            widgets: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a view. Registration order is match priority.
    pub fn register(&mut self, view: View) -> Result<(), RouterError> {
        if self.views.iter().any(|v| v.id() == view.id()) {
            return Err(RouterError::DuplicateView(view.id().to_string()));
        }
        self.views.push(view);
        Ok(())
    }

    /// Activate the initial view from the current location.
    ///
    /// Falls back to the first registered view when nothing matches, so a
    /// started router always has exactly one active view.
    pub fn start(&mut self) {
        if self.resolve_from_location() {
            return;
        }
        if self.views.is_empty() {
            warn!("router started with no registered views");
            return;
        }
        info!(
            location = %self.history.location(),
            fallback = %self.views[0].id(),
            "initial location matches no view"
        );
        self.activate(0, Vec::new(), None);
    }

    /// Navigate to `view_id` at `path` and record it in history.
    pub fn navigate(&mut self, view_id: &str, path: &str) -> Result<(), RouterError> {
        let index = self.index_of(view_id).ok_or_else(|| {
            error!(view = %view_id, "navigation to unregistered view");
            RouterError::UnknownView(view_id.to_string())
        })?;

        let params = self.views[index].pattern().captures(path).ok_or_else(|| {
            error!(view = %view_id, %path, "navigation path does not match view pattern");
            RouterError::RouteMismatch {
                view_id: view_id.to_string(),
                path: path.to_string(),
            }
        })?;

        self.activate(index, params, Some(path));
        Ok(())
    }

    /// Navigate to whichever view matches `path` first, recording it in
    /// history. Returns `false` (and stays put) when nothing matches.
    pub fn navigate_to_path(&mut self, path: &str) -> bool {
        match self.match_path(path) {
            Some((index, params)) => {
                self.activate(index, params, Some(path));
                true
            }
            None => {
                debug!(%path, "no view matches path");
                false
            }
        }
    }

    /// Activate the first registered view matching the current location.
    /// Returns `false` (and stays put) when nothing matches.
    pub fn resolve_from_location(&mut self) -> bool {
        let location = self.history.location();
        match self.match_path(&location) {
            Some((index, params)) => {
                self.activate(index, params, None);
                true
            }
            None => {
                debug!(%location, "no view matches location");
                false
            }
        }
    }

    /// Handle a history pop carrying `state`.
    ///
    /// A well-formed [`NavigationEntry`] for a registered view is trusted
    /// over the URL; anything else re-resolves from the location.
    pub fn on_history_popped(&mut self, state: Option<&Value>) -> bool {
        let entry = state.and_then(NavigationEntry::from_state);
        if let Some(entry) = entry
            && let Some(index) = self.index_of(&entry.view_id)
        {
            self.activate(index, entry.params, None);
            return true;
        }
        self.resolve_from_location()
    }

    /// Go back one history entry. Returns `false` at the start of history.
    pub fn back(&mut self) -> bool {
        match self.history.back() {
            Some(record) => {
                self.on_history_popped(record.state.as_ref());
                true
            }
            None => false,
        }
    }

    /// Go forward one history entry. Returns `false` at the end of history.
    pub fn forward(&mut self) -> bool {
        match self.history.forward() {
            Some(record) => {
                self.on_history_popped(record.state.as_ref());
                true
            }
            None => false,
        }
    }

    /// Re-activate the current view with its current parameters, without
    /// touching history. Used after state the view depends on has changed.
    pub fn refresh(&mut self) {
        if let Some(index) = self.active {
            let params = self.active_params.clone();
            self.activate(index, params, None);
        }
    }

    /// Block until every widget spawned so far has finished.
    pub fn wait_for_widgets(&self) {
        let handles: Vec<_> = self
            .widgets
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        for handle in handles {
            if handle.join().is_err() {
                warn!("widget loader panicked");
            }
        }
    }

    pub fn active_view(&self) -> Option<&View> {
        self.active.map(|i| &self.views[i])
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_view().map(View::id)
    }

    pub fn active_params(&self) -> &[String] {
        &self.active_params
    }

    pub fn views(&self) -> &[View] {
        &self.views
    }

    pub fn location(&self) -> String {
        self.history.location()
    }

    /// Current navigation epoch; increases with every activation.
    pub fn epoch(&self) -> u64 {
        *self.epoch.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // -- Internal --

    fn index_of(&self, view_id: &str) -> Option<usize> {
        self.views.iter().position(|v| v.id() == view_id)
    }

    fn match_path(&self, path: &str) -> Option<(usize, Vec<String>)> {
        self.views
            .iter()
            .enumerate()
            .find_map(|(i, view)| view.pattern().captures(path).map(|params| (i, params)))
    }

    fn activate(&mut self, index: usize, params: Vec<String>, push_path: Option<&str>) {
        let epoch = {
            let mut current = self.epoch.lock().unwrap_or_else(PoisonError::into_inner);
            *current += 1;
            *current
        };

        if let Some(previous) = self.active.take() {
            let view = &mut self.views[previous];
            view.behavior.deactivate();
            view.set_state(ViewState::Inactive);
        }

        let view = &mut self.views[index];
        view.set_state(ViewState::Active);
        self.active = Some(index);
        self.active_params = params.clone();

        self.sink.set_title(view.title());
        if let Some(path) = push_path {
            let entry = NavigationEntry::new(view.id(), params.clone());
            self.history.push(entry.to_state(), path);
        }
        debug!(view = %view.id(), ?params, epoch, "view activated");

        let ctx = ActivationContext::new(
            epoch,
            Arc::clone(&self.epoch),
            Arc::clone(&self.sink),
            Arc::clone(&self.widgets),
        );
        if let Err(e) = view.behavior.activate(&ctx, &params) {
            warn!(view = %view.id(), error = %format!("{e:#}"), "view activation failed");
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("views", &self.views)
            .field("active", &self.active_id())
            .field("active_params", &self.active_params)
            .finish_non_exhaustive()
    }
}
