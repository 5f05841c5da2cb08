use std::{
    path::PathBuf,
    sync::Arc,
    time::{Duration, Instant},
};

use clap::{Parser, Subcommand};
use colored::Colorize;
use flipbook::{
    EngineOptions, PlaybackEngine, PlaybackEvent, PlaybackListener, PlaybackState, SourceLoader,
    SourceLocator, metadata,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  flipbook inspect spinner.gif\n  flipbook inspect https://example.com/banner.png --json\n  flipbook play spinner.gif --loops 3 --progress\n  flipbook play slow.gif --window 8 --threads 4 --verbose";

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "Inspect and play animated images (GIF, APNG) from disk or URL",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long)]
    verbose: bool,

    /// Extra directory to search when a local source path does not exist.
    #[arg(long)]
    search_path: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print animation metadata without decoding any pixels (alias: probe).
    #[command(
        about = "Print animation metadata",
        visible_alias = "probe",
        visible_alias = "info",
        after_help = "Examples:\n  flipbook inspect spinner.gif\n  flipbook inspect spinner.gif --json"
    )]
    Inspect {
        /// Input image path or URL.
        input: String,

        /// Output metadata as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Decode and play an animation headlessly against the real clock.
    #[command(
        about = "Play an animation headlessly",
        after_help = "Examples:\n  flipbook play spinner.gif\n  flipbook play spinner.gif --loops 5 --window 8 --progress"
    )]
    Play {
        /// Input image path or URL.
        input: String,

        /// Number of loops to play (0 loops forever).
        #[arg(long, default_value_t = 1)]
        loops: u32,

        /// Look-ahead buffer window in frames.
        #[arg(long, default_value_t = flipbook::DEFAULT_BUFFER_WINDOW)]
        window: usize,

        /// Decode worker thread count.
        #[arg(long, default_value_t = 2)]
        threads: usize,

        /// Show a progress bar of rendered frames.
        #[arg(long)]
        progress: bool,
    },
}

/// Prints engine lifecycle events to stderr.
struct TerminalListener;

impl PlaybackListener for TerminalListener {
    fn on_event(&self, event: &PlaybackEvent) {
        match event {
            PlaybackEvent::LoadStart => eprintln!("{} load started", "event".cyan().bold()),
            PlaybackEvent::Loaded {
                width,
                height,
                frame_count,
            } => eprintln!(
                "{} loaded {width}x{height}, {frame_count} frame(s)",
                "event".cyan().bold()
            ),
            PlaybackEvent::LoadEnd => eprintln!("{} load ended", "event".cyan().bold()),
            PlaybackEvent::Error(reason) => {
                eprintln!("{} {}", "error:".red().bold(), reason.red());
            }
            _ => {}
        }
    }
}

fn init_logging(global: &GlobalOptions) {
    let level = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global);

    match cli.command {
        Commands::Inspect { input, json } => {
            let loader = SourceLoader::new().with_search_paths(cli.global.search_path.clone());
            let bytes = loader.load(&SourceLocator::parse(&input))?;
            let meta = metadata::extract(&bytes)?;

            if json {
                let payload = json!({
                    "width": meta.width(),
                    "height": meta.height(),
                    "frame_count": meta.frame_count(),
                    "animated": meta.is_animated(),
                    "total_duration_ms": meta.total_duration().as_millis(),
                    "frame_durations_ms": meta
                        .frame_durations()
                        .iter()
                        .map(|d| d.as_millis())
                        .collect::<Vec<_>>(),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Dimensions: {}x{}", meta.width(), meta.height());
                println!("Frames: {}", meta.frame_count());
                println!("Animated: {}", meta.is_animated());
                println!(
                    "Total duration: {:.3}s",
                    meta.total_duration().as_secs_f64()
                );
            }
        }
        Commands::Play {
            input,
            loops,
            window,
            threads,
            progress,
        } => {
            let mut options = EngineOptions::new()
                .with_loop_count(loops)
                .with_buffer_window(window)
                .with_worker_threads(threads)
                .with_listener(Arc::new(TerminalListener));
            for path in &cli.global.search_path {
                options = options.with_search_path(path);
            }

            let mut engine = PlaybackEngine::new(options);
            engine.set_source(SourceLocator::parse(&input));

            let mut progress_bar: Option<ProgressBar> = None;
            let mut rendered = 0_u64;
            let mut last = Instant::now();

            loop {
                let now = Instant::now();
                let delta = now - last;
                last = now;

                if engine.tick(delta) {
                    rendered += 1;
                    if let Some(pb) = &progress_bar {
                        pb.inc(1);
                    } else if cli.global.verbose {
                        eprintln!("frame {}", engine.current_index());
                    }
                }

                match engine.state() {
                    PlaybackState::Stopped => break,
                    PlaybackState::Failed => {
                        return Err(format!("playback of {input} failed").into());
                    }
                    PlaybackState::Playing if progress && progress_bar.is_none() => {
                        if let Some(meta) = engine.current_metadata() {
                            let total = meta.frame_count() as u64 * u64::from(loops.max(1));
                            let pb = ProgressBar::new(total);
                            let style = ProgressStyle::with_template(
                                "{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}",
                            )?;
                            pb.set_style(style.progress_chars("##-"));
                            progress_bar = Some(pb);
                        }
                    }
                    _ => {}
                }

                std::thread::sleep(Duration::from_millis(5));
            }

            if let Some(pb) = progress_bar {
                pb.finish_with_message("done");
            }

            println!(
                "{} {}",
                "success:".green().bold(),
                format!(
                    "Played {rendered} frame(s), {} loop(s)",
                    engine.loops_completed()
                )
                .green()
            );
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
