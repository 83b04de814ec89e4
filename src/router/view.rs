//! Routable views and the activation context handed to them.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::JoinHandle;

use tracing::warn;

use super::pattern::PathPattern;
use crate::render::RenderSink;

/// Whether a view is the one currently shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Inactive,
    Active,
}

/// What a view does when it is shown or hidden.
///
/// Each view carries its own behaviour value; there is no view hierarchy.
pub trait ViewBehavior {
    /// Render the view for `params`. Errors are logged by the router and do
    /// not roll back the navigation.
    fn activate(&mut self, ctx: &ActivationContext, params: &[String]) -> anyhow::Result<()>;

    fn deactivate(&mut self) {}
}

/// Behaviour that only sets the title.
#[derive(Debug, Default)]
pub struct StaticView;

impl ViewBehavior for StaticView {
    fn activate(&mut self, _ctx: &ActivationContext, _params: &[String]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// A registered, routable view.
pub struct View {
    id: String,
    title: String,
    pattern: PathPattern,
    state: ViewState,
    pub(super) behavior: Box<dyn ViewBehavior>,
}

impl View {
    pub fn new(
        id: &str,
        title: &str,
        pattern: &str,
        behavior: impl ViewBehavior + 'static,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            id: id.to_string(),
            title: title.to_string(),
            pattern: PathPattern::new(pattern)?,
            state: ViewState::Inactive,
            behavior: Box::new(behavior),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn state(&self) -> ViewState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == ViewState::Active
    }

    pub(super) fn set_state(&mut self, state: ViewState) {
        self.state = state;
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("pattern", &self.pattern)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

pub(super) type WidgetHandles = Arc<Mutex<Vec<JoinHandle<()>>>>;

/// Navigation epoch shared between the router and activation contexts.
///
/// Bumped under the lock on every activation; renders hold the lock while
/// drawing so a bump cannot interleave with a stale write.
pub(super) type EpochCell = Arc<Mutex<u64>>;

/// Handle given to a view for one activation.
///
/// Remembers the navigation epoch it was created in. Once the router moves
/// on, [`render`](Self::render) silently drops writes, so a slow fetch from
/// a superseded activation never overwrites the current view.
#[derive(Clone)]
pub struct ActivationContext {
    epoch: u64,
    current: EpochCell,
    sink: Arc<dyn RenderSink>,
    widgets: WidgetHandles,
}

impl ActivationContext {
    pub(super) fn new(
        epoch: u64,
        current: EpochCell,
        sink: Arc<dyn RenderSink>,
        widgets: WidgetHandles,
    ) -> Self {
        Self {
            epoch,
            current,
            sink,
            widgets,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// True while no later navigation has happened.
    pub fn is_current(&self) -> bool {
        *self.current.lock().unwrap_or_else(PoisonError::into_inner) == self.epoch
    }

    /// Run `draw` against the sink if this activation is still current.
    /// Returns whether it ran.
    pub fn render(&self, draw: impl FnOnce(&dyn RenderSink)) -> bool {
        let current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        if *current != self.epoch {
            return false;
        }
        draw(self.sink.as_ref());
        true
    }

    /// Load a widget on a background thread without blocking navigation.
    ///
    /// The thread receives a clone of this context and must render through
    /// it. The router joins finished widgets in
    /// [`Router::wait_for_widgets`](super::Router::wait_for_widgets).
    pub fn spawn_widget<F>(&self, name: &str, load: F)
    where
        F: FnOnce(ActivationContext) + Send + 'static,
    {
        let ctx = self.clone();
        let spawned = std::thread::Builder::new()
            .name(format!("widget-{name}"))
            .spawn(move || load(ctx));

        match spawned {
            Ok(handle) => self
                .widgets
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(handle),
            Err(e) => warn!(widget = %name, error = %e, "failed to spawn widget loader"),
        }
    }
}

impl fmt::Debug for ActivationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivationContext")
            .field("epoch", &self.epoch)
            .field("current", &self.is_current())
            .finish_non_exhaustive()
    }
}
