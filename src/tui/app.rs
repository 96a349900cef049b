use crate::cache::FeedOrigin;
use crate::config::Config;
use crate::events::UiEvent;
use crate::range::DateRange;
use crate::table::TableSummary;
use std::path::PathBuf;

// ── Screens ─────────────────────────────────────────────────────────────────

#[derive(PartialEq, Clone)]
pub enum Screen {
    Config,
    Dashboard,
}

#[derive(PartialEq, Clone)]
pub enum RunState {
    Idle,
    Running,
    Finished,
}

#[derive(PartialEq, Clone)]
pub enum Phase {
    Apod,
    Feed,
    Export,
    Done,
}

// ── Config field ────────────────────────────────────────────────────────────

#[derive(PartialEq, Clone, Copy)]
pub enum FieldKind {
    Text,
    /// yes/no, toggled with Enter instead of edited.
    Toggle,
}

pub struct ConfigField {
    pub label: &'static str,
    pub value: String,
    pub hint: &'static str,
    pub kind: FieldKind,
}

impl ConfigField {
    /// Value as drawn on the form. `cursor` is set while the field is being edited.
    pub fn display(&self, cursor: Option<usize>) -> String {
        match (self.kind, cursor) {
            (FieldKind::Toggle, _) => format!("[{}]", self.value),
            (FieldKind::Text, Some(at)) => {
                let at = at.min(self.value.len());
                let (before, after) = self.value.split_at(at);
                format!("{}▏{}", before, after)
            }
            (FieldKind::Text, None) => self.value.clone(),
        }
    }

    pub fn is_on(&self) -> bool {
        self.kind == FieldKind::Toggle && is_yes(&self.value)
    }
}

const API_KEY: usize = 0;
const START_DATE: usize = 1;
const END_DATE: usize = 2;
const CACHE_DIR: usize = 3;
const OUTPUT_CSV: usize = 4;
const FETCH_APOD: usize = 5;
const FETCH_IMAGE: usize = 6;

/// Picture-of-the-day metadata as shown on the dashboard.
pub struct ApodView {
    pub title: String,
    pub date: String,
    pub explanation: String,
    pub image_url: Option<String>,
}

// ── App state ───────────────────────────────────────────────────────────────

pub struct App {
    pub screen: Screen,

    // Config screen
    pub fields: Vec<ConfigField>,
    pub selected: usize,
    pub editing: bool,
    pub edit_cursor: usize,
    pub validation_error: Option<String>,

    // Dashboard state
    pub run_state: RunState,
    pub phase: Phase,
    pub range_label: String,

    // Image download
    pub dl_total: u64,
    pub dl_read: u64,
    pub image_path: Option<PathBuf>,

    pub apod: Option<ApodView>,

    // Feed
    pub feed_origin: Option<FeedOrigin>,
    pub feed_path: Option<PathBuf>,
    pub dates: usize,
    pub records: usize,

    // Table
    pub table: Option<TableSummary>,
    pub exported: Option<PathBuf>,

    pub failures: usize,

    // Logs
    pub logs: Vec<String>,
    pub log_scroll: usize,

    pub should_quit: bool,
}

impl App {
    pub fn new() -> Self {
        let defaults = Config::default_week();
        Self {
            screen: Screen::Config,
            fields: vec![
                text_field("API Key", defaults.api_key.clone(), "DEMO_KEY is rate limited"),
                text_field("Start Date", defaults.range.start_iso(), "YYYY-MM-DD"),
                text_field("End Date", defaults.range.end_iso(), "YYYY-MM-DD, at most 7 days after start"),
                text_field("Cache Directory", defaults.cache_dir.display().to_string(), "feed responses and images"),
                text_field("Output CSV", defaults.output_csv.display().to_string(), "overwritten on each run"),
                toggle_field("Fetch APOD", defaults.fetch_apod, "picture of the day metadata"),
                toggle_field("Download Image", defaults.fetch_apod_image, "saved into the cache directory"),
            ],
            selected: 0,
            editing: false,
            edit_cursor: 0,
            validation_error: None,

            run_state: RunState::Idle,
            phase: Phase::Apod,
            range_label: String::new(),

            dl_total: 0,
            dl_read: 0,
            image_path: None,
            apod: None,
            feed_origin: None,
            feed_path: None,
            dates: 0,
            records: 0,
            table: None,
            exported: None,
            failures: 0,

            logs: Vec::new(),
            log_scroll: 0,

            should_quit: false,
        }
    }

    /// Total config fields + 1 for the Start button.
    pub fn total_items(&self) -> usize {
        self.fields.len() + 1
    }

    pub fn is_on_start_button(&self) -> bool {
        self.selected == self.fields.len()
    }

    pub fn add_log(&mut self, msg: String) {
        self.logs.push(msg);
        // Auto-scroll to bottom
        let visible = 8usize; // approximate visible log lines
        if self.logs.len() > visible {
            self.log_scroll = self.logs.len() - visible;
        }
    }

    /// Clear everything the previous run left on the dashboard.
    pub fn reset_run(&mut self) {
        self.run_state = RunState::Idle;
        self.phase = Phase::Apod;
        self.dl_total = 0;
        self.dl_read = 0;
        self.image_path = None;
        self.apod = None;
        self.feed_origin = None;
        self.feed_path = None;
        self.dates = 0;
        self.records = 0;
        self.table = None;
        self.exported = None;
        self.failures = 0;
        self.logs.clear();
        self.log_scroll = 0;
    }

    /// Process a pipeline event.
    pub fn handle_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => {
                if !msg.starts_with('=') {
                    self.add_log(msg);
                }
            }
            UiEvent::Section(title) => {
                if title.contains("NeoWs") {
                    self.phase = Phase::Feed;
                } else if title.contains("Pre-processing") {
                    self.phase = Phase::Export;
                }
                self.add_log(format!("--- {} ---", title));
            }

            UiEvent::ApodRetrieved { title, date, explanation, image_url } => {
                self.add_log(format!("APOD: {} ({})", title, date));
                self.apod = Some(ApodView { title, date, explanation, image_url });
            }

            UiEvent::DownloadStarted { total_bytes } => {
                self.dl_total = total_bytes;
                self.dl_read = 0;
            }
            UiEvent::DownloadProgress { bytes_read } => {
                self.dl_read = bytes_read;
            }
            UiEvent::DownloadComplete { size_bytes, path } => {
                self.dl_read = size_bytes;
                if self.dl_total == 0 {
                    self.dl_total = size_bytes;
                }
                self.add_log(format!("Image saved: {} ({})", path.display(), fmt_bytes(size_bytes)));
                self.image_path = Some(path);
            }

            UiEvent::FeedLoaded { range, origin, path } => {
                let how = match origin {
                    FeedOrigin::Cache => "loaded from cache",
                    FeedOrigin::Network => "fetched and cached",
                };
                self.add_log(format!("Feed {} {}", range, how));
                self.feed_origin = Some(origin);
                self.feed_path = Some(path);
            }
            UiEvent::Flattened { dates, records } => {
                self.dates = dates;
                self.records = records;
                self.add_log(format!("Flattened {} objects across {} dates", records, dates));
            }
            UiEvent::TableBuilt(summary) => {
                self.table = Some(summary);
            }
            UiEvent::TableExported { path, rows } => {
                self.add_log(format!("Exported {} rows to {}", rows, path.display()));
                self.exported = Some(path);
            }

            UiEvent::Failure(msg) => {
                self.failures += 1;
                self.add_log(format!("ERROR: {}", msg));
            }
            UiEvent::Finished => {
                self.phase = Phase::Done;
                self.run_state = RunState::Finished;
                self.add_log("=== Run complete ===".into());
            }
        }
    }

    /// Validate config fields and build a Config struct.
    pub fn build_config(&self) -> Result<Config, String> {
        let api_key = self.fields[API_KEY].value.trim().to_string();
        if api_key.is_empty() {
            return Err("API key cannot be empty".into());
        }

        let range = DateRange::parse(&self.fields[START_DATE].value, &self.fields[END_DATE].value)
            .map_err(|e| e.to_string())?;

        let cache_dir = self.fields[CACHE_DIR].value.trim();
        if cache_dir.is_empty() {
            return Err("Cache directory cannot be empty".into());
        }
        let output_csv = self.fields[OUTPUT_CSV].value.trim();
        if output_csv.is_empty() {
            return Err("Output CSV path cannot be empty".into());
        }

        let defaults = Config::default_week();
        Ok(Config {
            api_key,
            cache_dir: PathBuf::from(cache_dir),
            output_csv: PathBuf::from(output_csv),
            range,
            fetch_apod: self.fields[FETCH_APOD].is_on(),
            fetch_apod_image: self.fields[FETCH_IMAGE].is_on(),
            ..defaults
        })
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

fn text_field(label: &'static str, value: String, hint: &'static str) -> ConfigField {
    ConfigField { label, value, hint, kind: FieldKind::Text }
}

fn toggle_field(label: &'static str, on: bool, hint: &'static str) -> ConfigField {
    ConfigField { label, value: yes_no(on).into(), hint, kind: FieldKind::Toggle }
}

pub fn yes_no(on: bool) -> &'static str {
    if on { "yes" } else { "no" }
}

fn is_yes(value: &str) -> bool {
    value == "yes"
}

pub fn fmt_bytes(n: u64) -> String {
    if n >= 1_073_741_824 { format!("{:.1} GB", n as f64 / 1_073_741_824.0) }
    else if n >= 1_048_576 { format!("{:.1} MB", n as f64 / 1_048_576.0) }
    else if n >= 1024 { format!("{:.1} KB", n as f64 / 1024.0) }
    else { format!("{} B", n) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_config_validates_range() {
        let mut app = App::new();
        app.fields[START_DATE].value = "2025-01-01".into();
        app.fields[END_DATE].value = "2025-01-07".into();
        app.fields[FETCH_IMAGE].value = "no".into();
        let config = app.build_config().unwrap();
        assert_eq!(config.range.start_iso(), "2025-01-01");
        assert!(config.fetch_apod);
        assert!(!config.fetch_apod_image);

        app.fields[END_DATE].value = "2025-02-01".into();
        assert!(app.build_config().unwrap_err().contains("at most 7"));

        app.fields[END_DATE].value = "tomorrow".into();
        assert!(app.build_config().unwrap_err().contains("YYYY-MM-DD"));
    }

    #[test]
    fn test_failures_do_not_end_the_run() {
        let mut app = App::new();
        app.run_state = RunState::Running;
        app.handle_event(UiEvent::Failure("APOD retrieval: HTTP 500: down".into()));
        assert_eq!(app.failures, 1);
        assert!(app.run_state == RunState::Running);

        app.handle_event(UiEvent::Finished);
        assert!(app.run_state == RunState::Finished);
        assert!(app.logs.iter().any(|l| l.starts_with("ERROR: APOD retrieval")));
    }

    #[test]
    fn test_reset_clears_previous_run() {
        let mut app = App::new();
        app.handle_event(UiEvent::Flattened { dates: 7, records: 120 });
        app.handle_event(UiEvent::Finished);
        app.reset_run();
        assert_eq!(app.records, 0);
        assert!(app.logs.is_empty());
        assert!(app.run_state == RunState::Idle);
    }

    #[test]
    fn test_field_display_by_kind() {
        let app = App::new();
        let toggle = &app.fields[FETCH_APOD];
        assert_eq!(toggle.display(Some(0)), "[yes]");
        assert!(toggle.is_on());

        let text = text_field("Start Date", "2025-01-01".into(), "");
        assert_eq!(text.display(None), "2025-01-01");
        assert_eq!(text.display(Some(4)), "2025▏-01-01");
        assert_eq!(text.display(Some(99)), "2025-01-01▏");
        assert!(!text.is_on());
    }
}
