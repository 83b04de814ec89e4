//! Shared fixtures: a sink that records what it was asked to draw and an
//! in-process backend.
#![allow(dead_code)]

use std::sync::mpsc::Receiver;
use std::sync::{Mutex, PoisonError};

use reachard::api::{ApiError, Backend, NewTarget, Target};
use reachard::auth::AuthCache;
use reachard::render::RenderSink;
use reachard::timeseries::{Gap, IncidentRow, LatencySeries};

// ---------------------------------------------------------------------------
// Recording sink
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Title(String),
    Targets(Vec<i64>),
    NoTargets,
    Target(i64),
    AddTargetForm,
    Profile(bool),
    Incidents(i64, IncidentRow),
    Latencies(i64, Vec<Gap>),
}

#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.lock().clone()
    }

    pub fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.lock())
    }

    pub fn count(&self, wanted: &Event) -> usize {
        self.lock().iter().filter(|e| *e == wanted).count()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Event>> {
        self.events.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, event: Event) {
        self.lock().push(event);
    }
}

impl RenderSink for RecordingSink {
    fn set_title(&self, title: &str) {
        self.record(Event::Title(title.to_string()));
    }

    fn show_targets(&self, targets: &[Target]) {
        self.record(Event::Targets(targets.iter().map(|t| t.id).collect()));
    }

    fn show_no_targets(&self) {
        self.record(Event::NoTargets);
    }

    fn show_target(&self, target: &Target) {
        self.record(Event::Target(target.id));
    }

    fn show_add_target_form(&self) {
        self.record(Event::AddTargetForm);
    }

    fn show_profile(&self, logged_in: bool) {
        self.record(Event::Profile(logged_in));
    }

    fn show_incidents(&self, target_id: i64, row: &IncidentRow) {
        self.record(Event::Incidents(target_id, *row));
    }

    fn show_latencies(&self, target_id: i64, _series: &LatencySeries, gaps: &[Gap]) {
        self.record(Event::Latencies(target_id, gaps.to_vec()));
    }
}

// ---------------------------------------------------------------------------
// Fake backend
// ---------------------------------------------------------------------------

/// Backend that serves fixed data and checks the session like the server
/// would.
pub struct FakeBackend {
    auth: AuthCache,
    pub token: String,
    pub targets: Mutex<Vec<Target>>,
    pub incidents: Vec<i64>,
    pub latencies: LatencySeries,
    /// When set, `incidents` blocks until a message arrives.
    pub incident_gate: Mutex<Option<Receiver<()>>>,
    pub logged_out: Mutex<bool>,
}

impl FakeBackend {
    pub fn new(auth: AuthCache) -> Self {
        Self {
            auth,
            token: "session-token".to_string(),
            targets: Mutex::new(Vec::new()),
            incidents: Vec::new(),
            latencies: LatencySeries::default(),
            incident_gate: Mutex::new(None),
            logged_out: Mutex::new(false),
        }
    }

    fn require_session(&self) -> Result<(), ApiError> {
        if self.auth.is_logged_in() {
            Ok(())
        } else {
            Err(ApiError::NotLoggedIn)
        }
    }
}

impl Backend for FakeBackend {
    fn log_in(&self, username: &str, password: &str) -> Result<String, ApiError> {
        if username == "alice" && password == "secret" {
            Ok(self.token.clone())
        } else {
            Err(ApiError::Status {
                url: "/v0/session/".to_string(),
                status: 401,
            })
        }
    }

    fn log_out(&self) -> Result<(), ApiError> {
        self.require_session()?;
        *self.logged_out.lock().unwrap() = true;
        Ok(())
    }

    fn list_targets(&self, _own: bool) -> Result<Vec<Target>, ApiError> {
        self.require_session()?;
        Ok(self.targets.lock().unwrap().clone())
    }

    fn target(&self, id: i64) -> Result<Target, ApiError> {
        self.require_session()?;
        self.targets
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or_else(|| ApiError::Status {
                url: format!("/v0/targets/{id}/"),
                status: 404,
            })
    }

    fn add_target(&self, target: &NewTarget) -> Result<(), ApiError> {
        self.require_session()?;
        let mut targets = self.targets.lock().unwrap();
        let id = targets.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        targets.push(Target {
            id,
            name: target.name.clone(),
            url: target.url.clone(),
            interval_seconds: target.interval_seconds,
            time_added: 0,
        });
        Ok(())
    }

    fn delete_target(&self, id: i64) -> Result<(), ApiError> {
        self.require_session()?;
        self.targets.lock().unwrap().retain(|t| t.id != id);
        Ok(())
    }

    fn incidents(&self, _id: i64, _since: i64) -> Result<Vec<i64>, ApiError> {
        self.require_session()?;
        if let Some(gate) = self.incident_gate.lock().unwrap().as_ref() {
            let _ = gate.recv();
        }
        Ok(self.incidents.clone())
    }

    fn latencies(&self, _id: i64, _since: i64, _step: i64) -> Result<LatencySeries, ApiError> {
        self.require_session()?;
        Ok(self.latencies.clone())
    }
}

pub fn target(id: i64, time_added: i64) -> Target {
    Target {
        id,
        name: format!("target-{id}"),
        url: format!("https://example.com/{id}"),
        interval_seconds: 60,
        time_added,
    }
}
