use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use crate::stream::{FrameReport, Presence};
use crate::trend::TrendStatus;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    fn use_pretty(&self) -> bool {
        self.is_tty && !matches!(self.mode, UiMode::Plain)
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.use_pretty() {
            let spinner = spinner();
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner))
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None)
        }
    }

    /// Live status display for the frame loop.
    pub fn status(&self) -> StatusLine {
        StatusLine {
            spinner: self.use_pretty().then(spinner),
        }
    }
}

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_draw_target(ProgressDrawTarget::stderr());
    spinner.enable_steady_tick(Duration::from_millis(120));
    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(style);
    spinner
}

pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
        }
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", self.name, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

/// Per-frame status: a single updating spinner line on a TTY, plain lines
/// otherwise (only for frames that have something to say).
pub struct StatusLine {
    spinner: Option<ProgressBar>,
}

impl StatusLine {
    pub fn show(&self, report: &FrameReport) {
        let lines = render_report(report);
        match &self.spinner {
            Some(spinner) => spinner.set_message(format!(
                "frame {}  {}",
                report.frame_index,
                lines.join(" | ")
            )),
            None => {
                for line in lines {
                    eprintln!("[{}] {}", report.frame_index, line);
                }
            }
        }
    }

    pub fn finish(self) {
        if let Some(spinner) = self.spinner {
            spinner.finish_and_clear();
        }
    }
}

/// Human-readable lines for one frame: the summary, the tracked object's
/// score and trend, or the search state.
pub fn render_report(report: &FrameReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.summary.text.is_empty() {
        lines.push(format!("detections: {}", report.summary.text));
    }
    match (&report.tracked, report.presence) {
        (Some(tracked), _) => {
            lines.push(format!(
                "{} detected! proximity score: {:.2}",
                tracked.label, tracked.score
            ));
            let marker = match tracked.trend.status {
                TrendStatus::Approaching => "! ",
                TrendStatus::MovingAway => "~ ",
                TrendStatus::Stable | TrendStatus::InsufficientData => "",
            };
            lines.push(format!("{}{}", marker, tracked.trend.label));
        }
        (None, Presence::Searching) => {
            lines.push(format!("searching for {}...", report.tracked_class))
        }
        (None, _) => {}
    }
    lines
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stream::TrackedObject;
    use crate::summary::FrameSummary;
    use crate::trend::TrendReading;

    fn report(tracked: Option<TrackedObject>, presence: Presence) -> FrameReport {
        FrameReport {
            frame_index: 7,
            width: 640,
            height: 480,
            tracked_class: "cat".to_string(),
            summary: FrameSummary {
                class_counts: vec![("cat".to_string(), 1)],
                text: "0: 640x480 1 cat".to_string(),
            },
            tracked,
            presence,
        }
    }

    #[test]
    fn renders_tracked_cat() {
        let tracked = TrackedObject {
            label: "cat".to_string(),
            instances: 1,
            score: 130.208,
            trend: TrendReading {
                label: "approaching (+15.0%)".to_string(),
                status: TrendStatus::Approaching,
                change_percent: Some(15.0),
            },
        };
        assert_eq!(
            render_report(&report(Some(tracked), Presence::Tracking)),
            vec![
                "detections: 0: 640x480 1 cat".to_string(),
                "cat detected! proximity score: 130.21".to_string(),
                "! approaching (+15.0%)".to_string(),
            ]
        );
    }

    #[test]
    fn renders_search_state_only_when_searching() {
        let searching = render_report(&report(None, Presence::Searching));
        assert_eq!(
            searching.last().map(String::as_str),
            Some("searching for cat...")
        );
        assert_eq!(render_report(&report(None, Presence::Idle)).len(), 1);
    }

    #[test]
    fn plain_mode_never_uses_spinner() {
        let ui = Ui::from_args(Some("plain"), true);
        assert!(!ui.use_pretty());
        assert!(Ui::from_args(None, true).use_pretty());
        assert!(!Ui::from_args(Some("pretty"), false).use_pretty());
    }
}
