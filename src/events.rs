use crate::cache::FeedOrigin;
use crate::range::DateRange;
use crate::table::{TableSummary, HEADERS};
use indicatif::{ProgressBar, ProgressStyle};
use std::cell::RefCell;
use std::path::PathBuf;

// ── Events from pipeline to UI ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum UiEvent {
    Log(String),
    Section(String),

    ApodRetrieved {
        title: String,
        date: String,
        explanation: String,
        image_url: Option<String>,
    },

    DownloadStarted { total_bytes: u64 },
    DownloadProgress { bytes_read: u64 },
    DownloadComplete { size_bytes: u64, path: PathBuf },

    FeedLoaded { range: DateRange, origin: FeedOrigin, path: PathBuf },
    Flattened { dates: usize, records: usize },
    TableBuilt(TableSummary),
    TableExported { path: PathBuf, rows: usize },

    /// A reported, non-fatal failure. The run continues with a fallback value.
    Failure(String),
    Finished,
}

// ── EventSink trait ─────────────────────────────────────────────────────────

/// Abstraction for reporting pipeline progress. Runs are single-threaded,
/// so sinks use interior mutability rather than locks.
pub trait EventSink {
    fn send(&self, event: UiEvent);
}

// ── Console sink (headless mode) ────────────────────────────────────────────

pub struct ConsoleSink {
    pb: RefCell<Option<ProgressBar>>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self { pb: RefCell::new(None) }
    }

    fn make_pb(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        if let Ok(style) = ProgressStyle::default_bar().template(
            "  DL {spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, ETA: {eta})",
        ) {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    }

    fn print_summary(summary: &TableSummary) {
        println!("\n--- Cleaned Asteroids Data Info ---");
        println!("  {} entries, {} columns", summary.rows, HEADERS.len());
        for (i, (header, non_null)) in HEADERS.iter().zip(summary.non_null).enumerate() {
            println!("  {:>2}  {:<45} {} non-null", i, header, non_null);
        }

        println!("\n--- Cleaned Asteroids Data (first {} rows) ---", summary.preview.len());
        if summary.preview.is_empty() {
            println!("  (empty)");
        }
        for row in &summary.preview {
            println!("  {}", row.join(" | "));
        }
    }
}

impl EventSink for ConsoleSink {
    fn send(&self, event: UiEvent) {
        match event {
            UiEvent::Log(msg) => println!("  {}", msg),
            UiEvent::Section(title) => println!("\n--- {} ---", title),

            UiEvent::ApodRetrieved { title, date, explanation, image_url } => {
                println!("  Title: {}", title);
                println!("  Date: {}", date);
                println!("  Explanation: {}", explanation);
                match image_url {
                    Some(url) => println!("  Image URL: {}", url),
                    None => println!("  No image URL found for today's APOD."),
                }
            }

            UiEvent::DownloadStarted { total_bytes } => {
                *self.pb.borrow_mut() = Some(Self::make_pb(total_bytes));
            }
            UiEvent::DownloadProgress { bytes_read } => {
                if let Some(pb) = self.pb.borrow().as_ref() {
                    pb.set_position(bytes_read);
                }
            }
            UiEvent::DownloadComplete { size_bytes, path } => {
                if let Some(pb) = self.pb.borrow_mut().take() {
                    pb.finish_and_clear();
                }
                println!(
                    "  Image saved to {} ({:.1} KB)",
                    path.display(),
                    size_bytes as f64 / 1024.0
                );
            }

            UiEvent::FeedLoaded { range, origin, path } => match origin {
                FeedOrigin::Cache => {
                    println!("  Loaded asteroid data for {} from cache: {}", range, path.display())
                }
                FeedOrigin::Network => {
                    println!("  Fetched and cached asteroid data for {}: {}", range, path.display())
                }
            },
            UiEvent::Flattened { dates, records } => {
                println!("  Flattened {} objects across {} dates", records, dates);
            }
            UiEvent::TableBuilt(summary) => Self::print_summary(&summary),
            UiEvent::TableExported { path, rows } => {
                println!("\n  Asteroids data ({} rows) exported to '{}'", rows, path.display());
            }

            UiEvent::Failure(msg) => {
                if let Some(pb) = self.pb.borrow_mut().take() {
                    pb.finish_and_clear();
                }
                eprintln!("  ERROR: {}", msg);
            }
            UiEvent::Finished => {
                println!("\n{}\n", "=".repeat(80));
                println!("Script execution complete.");
            }
        }
    }
}

// ── Recording sink (tests) ──────────────────────────────────────────────────

#[cfg(test)]
pub struct RecordingSink {
    pub events: RefCell<Vec<UiEvent>>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self { events: RefCell::new(Vec::new()) }
    }

    pub fn failures(&self) -> Vec<String> {
        self.events
            .borrow()
            .iter()
            .filter_map(|e| match e {
                UiEvent::Failure(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn send(&self, event: UiEvent) {
        self.events.borrow_mut().push(event);
    }
}
