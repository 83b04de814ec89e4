/// Rendering sink: where processed dashboard data ends up.
///
/// The router and views never format output themselves; they hand
/// well-formed data to a [`RenderSink`]. [`TerminalRenderer`] draws to the
/// terminal; tests substitute a recording sink.
mod terminal;

use crate::api::Target;
use crate::timeseries::{Gap, IncidentRow, LatencySeries};

pub use terminal::{TerminalRenderer, sparkline};

/// Consumer of dashboard output.
///
/// Shared between the router thread and widget loader threads.
pub trait RenderSink: Send + Sync {
    fn set_title(&self, title: &str);

    /// Replace the target list with `targets` (possibly zero rows).
    fn show_targets(&self, targets: &[Target]);

    /// Indicator shown once after an empty list.
    fn show_no_targets(&self);

    fn show_target(&self, target: &Target);

    fn show_add_target_form(&self);

    fn show_profile(&self, logged_in: bool);

    fn show_incidents(&self, target_id: i64, row: &IncidentRow);

    fn show_latencies(&self, target_id: i64, series: &LatencySeries, gaps: &[Gap]);
}
