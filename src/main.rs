mod apod;
mod cache;
mod config;
mod download;
mod error;
mod events;
mod feed;
mod flatten;
mod http;
mod pipeline;
mod range;
mod table;
mod tui;

#[derive(Debug, PartialEq)]
enum Mode {
    /// The week starting today, console output.
    Headless { fetch_apod: bool },
    /// Interactive config + dashboard.
    Tui,
}

fn mode(args: &[String]) -> Mode {
    if args.iter().any(|a| a == "--headless") {
        Mode::Headless { fetch_apod: !args.iter().any(|a| a == "--no-apod") }
    } else {
        Mode::Tui
    }
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();

    match mode(&args) {
        Mode::Headless { fetch_apod } => {
            // Headless only. Log lines on stderr corrupt the TUI's alternate screen.
            env_logger::init();
            let mut config = config::Config::default_week();
            config.fetch_apod = fetch_apod;
            pipeline::run(&config)
        }
        Mode::Tui => tui::run(),
    }
}
