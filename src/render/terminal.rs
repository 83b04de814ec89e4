use chrono::{TimeZone, Utc};
use colored::Colorize;

use super::RenderSink;
use crate::api::Target;
use crate::timeseries::{Bucket, Gap, IncidentRow, LatencySeries, summarize};

const SPARK_LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// Draws dashboard output to stdout.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl RenderSink for TerminalRenderer {
    fn set_title(&self, title: &str) {
        println!();
        println!("{}", title.bold().cyan());
        println!("{}", "=".repeat(title.chars().count().max(20)));
    }

    fn show_targets(&self, targets: &[Target]) {
        if targets.is_empty() {
            return;
        }
        println!(
            "  {:>5}  {:<20} {:>8}  URL",
            "ID", "Name", "Interval"
        );
        println!("  {}", "-".repeat(58));
        for (i, target) in targets.iter().enumerate() {
            let line = format!(
                "  {:>5}  {:<20} {:>7}s  {}",
                target.id,
                truncate(&target.name, 20),
                target.interval_seconds,
                target.url,
            );
            if i % 2 == 0 {
                println!("{line}");
            } else {
                println!("{}", line.dimmed());
            }
        }
    }

    fn show_no_targets(&self) {
        println!("{}", "No targets.".yellow());
    }

    fn show_target(&self, target: &Target) {
        let added = Utc
            .timestamp_opt(target.time_added, 0)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M UTC").to_string())
            .unwrap_or_else(|| target.time_added.to_string());
        println!("  {} {}", "Name:    ".bold(), target.label());
        println!("  {} {}", "URL:     ".bold(), target.url);
        println!("  {} {}s", "Interval:".bold(), target.interval_seconds);
        println!("  {} {}", "Added:   ".bold(), added);
    }

    fn show_add_target_form(&self) {
        println!("  Add a target with:");
        println!(
            "    {}",
            "reachard targets add --name <NAME> --url <URL> --interval <SECONDS>".bold()
        );
    }

    fn show_profile(&self, logged_in: bool) {
        if logged_in {
            println!("  {}", "Logged in.".green());
            println!("  Log out with {}", "reachard logout".bold());
        } else {
            println!("  {}", "Logged out.".yellow());
            println!("  Log in with {}", "reachard login --username <USER>".bold());
        }
    }

    fn show_incidents(&self, target_id: i64, row: &IncidentRow) {
        let (unknown, healthy, incident) = summarize(row);
        let strip = strip_for(row, colored::control::SHOULD_COLORIZE.should_colorize());
        println!();
        println!("{}", format!("Incidents, target {target_id} (24h)").bold().cyan());
        println!("  -24h {strip} now");
        println!(
            "  {} incident, {} healthy, {} before target existed",
            incident, healthy, unknown
        );
    }

    fn show_latencies(&self, target_id: i64, series: &LatencySeries, gaps: &[Gap]) {
        println!();
        println!("{}", format!("Latency, target {target_id}").bold().cyan());
        if series.is_empty() {
            println!("  {}", "No samples.".yellow());
            return;
        }
        println!("  {}", sparkline(series, gaps));
        if let Some((min, max, mean)) = series.stats() {
            println!(
                "  min {:.1} ms  max {:.1} ms  mean {:.1} ms  ({} samples, {} gaps)",
                min,
                max,
                mean,
                series.len(),
                gaps.len()
            );
        }
    }
}

/// Incident strip, oldest hour first. Without colour the bucket kinds must
/// stay distinguishable, so the plain glyphs are used.
fn strip_for(row: &IncidentRow, colorize: bool) -> String {
    if !colorize {
        return incident_strip(row);
    }
    row.iter()
        .rev()
        .map(|bucket| match bucket {
            Bucket::Healthy => "■".green().to_string(),
            Bucket::Incident => "■".red().to_string(),
            Bucket::Unknown => "·".dimmed().to_string(),
        })
        .collect()
}

/// Plain-text incident strip, oldest hour first: `#` incident, `=`
/// healthy, `.` unknown.
fn incident_strip(row: &IncidentRow) -> String {
    row.iter()
        .rev()
        .map(|bucket| match bucket {
            Bucket::Healthy => '=',
            Bucket::Incident => '#',
            Bucket::Unknown => '.',
        })
        .collect()
}

/// Sparkline of the series. Nulls draw as spaces and a space is inserted
/// wherever a gap separates two drawn samples.
pub fn sparkline(series: &LatencySeries, gaps: &[Gap]) -> String {
    let Some((min, max, _)) = series.stats() else {
        return " ".repeat(series.len());
    };
    let span = max - min;

    let mut out = String::with_capacity(series.len() * 2);
    for (i, value) in series.values().iter().enumerate() {
        if i > 0 && gaps.iter().any(|g| g.start == i - 1 && g.end == i) {
            out.push(' ');
        }
        match value {
            Some(v) => {
                let level = if span <= f64::EPSILON {
                    0
                } else {
                    (((v - min) / span) * (SPARK_LEVELS.len() - 1) as f64).round() as usize
                };
                out.push(SPARK_LEVELS[level.min(SPARK_LEVELS.len() - 1)]);
            }
            None => out.push(' '),
        }
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
