use crate::range::DateRange;
use chrono::NaiveDate;
use std::path::PathBuf;

pub const DEFAULT_API_KEY: &str = "DEMO_KEY";
pub const APOD_URL: &str = "https://api.nasa.gov/planetary/apod";
pub const FEED_URL: &str = "https://api.nasa.gov/neo/rest/v1/feed";

/// Main configuration for one run, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Credential sent as `api_key` on every request.
    pub api_key: String,
    pub apod_url: String,
    pub feed_url: String,
    /// Directory holding cached feed responses and downloaded images.
    pub cache_dir: PathBuf,
    /// Destination of the exported asteroid table.
    pub output_csv: PathBuf,
    /// Date range requested from the feed (at most 7 days wide).
    pub range: DateRange,
    pub fetch_apod: bool,
    pub fetch_apod_image: bool,
}

impl Config {
    /// Defaults: the week starting today, `nasa_api_cache/` and
    /// `nasa_asteroids_data.csv` in the working directory.
    /// A non-empty `NASA_API_KEY` environment variable replaces the demo key.
    pub fn default_week() -> Self {
        let today = chrono::Local::now().date_naive();
        Self {
            api_key: api_key_from_env().unwrap_or_else(|| DEFAULT_API_KEY.into()),
            apod_url: APOD_URL.into(),
            feed_url: FEED_URL.into(),
            cache_dir: PathBuf::from("nasa_api_cache"),
            output_csv: PathBuf::from("nasa_asteroids_data.csv"),
            range: DateRange::week_from(today),
            fetch_apod: true,
            fetch_apod_image: true,
        }
    }

    /// Where the picture-of-the-day image for `date` is stored. `date` comes
    /// from the remote response; anything but a `YYYY-MM-DD` date is stored as
    /// `unknown` so the file always lands directly in `cache_dir`.
    pub fn image_path(&self, date: Option<&str>, url: &str) -> PathBuf {
        let stamp = date
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map_or_else(|| "unknown".to_string(), |d| d.format("%Y-%m-%d").to_string());
        self.cache_dir.join(format!("apod_{}.{}", stamp, image_extension(url)))
    }
}

fn api_key_from_env() -> Option<String> {
    std::env::var("NASA_API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

/// Extension of the last path segment of `url`, `jpg` when there is none.
fn image_extension(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            ext.to_ascii_lowercase()
        }
        _ => "jpg".into(),
    }
}
