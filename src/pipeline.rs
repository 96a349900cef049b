use crate::apod::Apod;
use crate::cache::{FeedCache, FeedClient, FeedOrigin, Fetched};
use crate::config::Config;
use crate::events::{ConsoleSink, EventSink, UiEvent};
use crate::flatten::flatten;
use crate::http::{Transport, UreqTransport};
use crate::table;
use std::fmt::Display;
use std::fs;
use std::path::PathBuf;

/// What a run produced. Failures are counted, never propagated.
#[derive(Debug, Default)]
pub struct RunSummary {
    pub apod: Option<Apod>,
    pub feed_origin: Option<FeedOrigin>,
    pub records: usize,
    pub exported: Option<PathBuf>,
    pub failures: usize,
}

/// Run both flows in headless mode (console output).
pub fn run(config: &Config) -> anyhow::Result<()> {
    let sink = ConsoleSink::new();
    sink.send(UiEvent::Log(format!("Cache: {}", config.cache_dir.display())));
    sink.send(UiEvent::Log(format!("Range: {} ({} days)", config.range, config.range.day_count())));
    sink.send(UiEvent::Log(format!("Output: {}", config.output_csv.display())));

    let transport = UreqTransport::new();
    let summary = run_with(config, &transport, &sink);
    log::info!(
        "apod: {}, feed: {:?}, {} records exported to {:?}",
        summary.apod.as_ref().map_or("-", |a| a.title.as_deref().unwrap_or("N/A")),
        summary.feed_origin,
        summary.records,
        summary.exported,
    );
    if summary.failures > 0 {
        log::warn!("run finished with {} reported failures", summary.failures);
    }
    Ok(())
}

/// Run both flows against `transport`, reporting through `sink` (used by both
/// headless and TUI). Always runs to completion and always attempts the CSV.
pub fn run_with(config: &Config, transport: &dyn Transport, sink: &dyn EventSink) -> RunSummary {
    let mut summary = RunSummary::default();

    ensure_cache_dir(config, sink, &mut summary);

    if config.fetch_apod {
        summary.apod = picture_of_the_day(config, transport, sink, &mut summary.failures);
        sink.send(UiEvent::Log("=".repeat(80)));
    }

    // Cache-or-fetch
    sink.send(UiEvent::Section("Retrieving Asteroids - NeoWs Data".into()));
    let client = FeedClient::new(
        transport,
        FeedCache::new(&config.cache_dir),
        &config.feed_url,
        &config.api_key,
    );
    let fetched: Option<Fetched> = match client.get(&config.range) {
        Ok(fetched) => {
            sink.send(UiEvent::FeedLoaded {
                range: config.range,
                origin: fetched.origin,
                path: fetched.path.clone(),
            });
            summary.feed_origin = Some(fetched.origin);
            Some(fetched)
        }
        Err(e) => {
            report(
                sink,
                &mut summary.failures,
                &format!("NeoWs retrieval for {}", config.range),
                &e,
            );
            None
        }
    };

    // Flatten
    let response = fetched.as_ref().map(|f| &f.response);
    let records = flatten(response);
    summary.records = records.len();
    match response {
        Some(response) => {
            log::debug!("feed reports {:?} elements", response.element_count);
            sink.send(UiEvent::Flattened {
                dates: response.near_earth_objects.len(),
                records: records.len(),
            })
        }
        None => sink.send(UiEvent::Log(
            "No asteroid data retrieved due to API errors or no data available for the specified range.".into(),
        )),
    }

    // Export
    sink.send(UiEvent::Section("Pre-processing Asteroids Data".into()));
    match table::export(&records, &config.output_csv) {
        Ok(table) => {
            if table.is_empty() {
                sink.send(UiEvent::Log("The table is empty; only the header row was written.".into()));
            }
            sink.send(UiEvent::TableBuilt(table.summary()));
            sink.send(UiEvent::TableExported {
                path: config.output_csv.clone(),
                rows: table.len(),
            });
            summary.exported = Some(config.output_csv.clone());
        }
        Err(e) => report(
            sink,
            &mut summary.failures,
            &format!("CSV export to {}", config.output_csv.display()),
            &e,
        ),
    }

    sink.send(UiEvent::Finished);
    summary
}

// ── Helpers ──────────────────────────────────────────────────────────────────

fn report(sink: &dyn EventSink, failures: &mut usize, operation: &str, err: &dyn Display) {
    log::warn!("{} failed: {}", operation, err);
    sink.send(UiEvent::Failure(format!("{}: {}", operation, err)));
    *failures += 1;
}

fn ensure_cache_dir(config: &Config, sink: &dyn EventSink, summary: &mut RunSummary) {
    if config.cache_dir.is_dir() {
        return;
    }
    match fs::create_dir_all(&config.cache_dir) {
        Ok(()) => sink.send(UiEvent::Log(format!(
            "Created cache directory: {}",
            config.cache_dir.display()
        ))),
        Err(e) => report(sink, &mut summary.failures, "Creating cache directory", &e),
    }
}

fn picture_of_the_day(
    config: &Config,
    transport: &dyn Transport,
    sink: &dyn EventSink,
    failures: &mut usize,
) -> Option<Apod> {
    sink.send(UiEvent::Section("Retrieving Astronomy Picture of the Day (APOD)".into()));

    let apod = match Apod::fetch(transport, &config.apod_url, &config.api_key) {
        Ok(apod) => apod,
        Err(e) => {
            report(sink, failures, "APOD retrieval", &e);
            return None;
        }
    };

    sink.send(UiEvent::ApodRetrieved {
        title: apod.title_or_na(),
        date: apod.date_or_na(),
        explanation: apod.explanation_preview(),
        image_url: apod.image_url().map(str::to_string),
    });

    if let (true, Some(url)) = (config.fetch_apod_image, apod.image_url()) {
        if apod.is_image() {
            let dest = config.image_path(apod.date.as_deref(), url);
            if let Err(e) = transport.download(url, &dest, sink) {
                report(sink, failures, "APOD image download", &e);
            }
        } else {
            sink.send(UiEvent::Log(format!(
                "APOD media type is '{}', skipping image download.",
                apod.media_type.as_deref().unwrap_or("unknown")
            )));
        }
    }

    Some(apod)
}
