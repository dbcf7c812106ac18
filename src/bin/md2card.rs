//! CLI binary for md2card.
//!
//! A thin shim over the library crate: `serve` runs the HTTP service, `card`
//! and `carousel` render to disk. Flags map onto `CardConfig` /
//! `CarouselSettings`.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use md2card::carousel::write_slides;
use md2card::pipeline::input::resolve_input;
use md2card::{
    generate_card_to_file, generate_carousel, serve, CardConfig, CardStyle, CarouselProgressCallback,
    CarouselSettings, DecorativePattern, FinalSlideKind, FinalSlideSettings, FontSource,
    NoopProgressCallback, ServerConfig,
};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress callback: a live bar plus one log line per slide.
struct CliProgressCallback {
    bar: ProgressBar,
    slide_started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} slides  ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Rendering");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            slide_started: Mutex::new(None),
        }
    }

    fn slide_elapsed(&self) -> f64 {
        self.slide_started
            .lock()
            .ok()
            .and_then(|mut t| t.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }
}

impl CarouselProgressCallback for CliProgressCallback {
    fn on_carousel_start(&self, total_slides: usize) {
        self.bar.set_length(total_slides as u64);
    }

    fn on_slide_start(&self, _slide: usize, _total: usize) {
        if let Ok(mut t) = self.slide_started.lock() {
            *t = Some(Instant::now());
        }
    }

    fn on_slide_complete(&self, slide: usize, total: usize, png_bytes: usize) {
        let secs = self.slide_elapsed();
        self.bar.println(format!(
            "  {} Slide {:>2}/{:<2}  {}  {}",
            green("✓"),
            slide,
            total,
            dim(&format!("{:>7} bytes", png_bytes)),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.inc(1);
    }

    fn on_slide_error(&self, slide: usize, total: usize, error: &str) {
        let secs = self.slide_elapsed();
        self.bar.println(format!(
            "  {} Slide {:>2}/{:<2}  {}  {}",
            red("✗"),
            slide,
            total,
            red(error),
            dim(&format!("{secs:.1}s")),
        ));
        self.bar.abandon();
    }

    fn on_carousel_complete(&self, _total_slides: usize) {
        self.bar.finish_and_clear();
    }
}

// ── Arguments ────────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the HTTP service on port 8080
  md2card serve --port 8080

  # Render one card
  md2card card post.md -o card.png --style modern --username acme

  # Render a carousel from a URL, with a closing call-to-action slide
  md2card carousel https://example.com/thread.md -o slides/ --final-slide cta

  # Read Markdown from stdin
  cat post.md | md2card card - -o card.png

ENVIRONMENT VARIABLES:
  MD2CARD_HOST          Bind address for `serve`
  PORT                  Port for `serve`
  MD2CARD_FONTS_DIR     Directory holding Inter-Regular.ttf and Inter-Bold.ttf
  MD2CARD_CORS_ORIGINS  Comma-separated allowed origins for `serve`
  RUST_LOG              Overrides the log filter
"#;

/// Render Markdown into PNG cards and carousels.
#[derive(Parser, Debug)]
#[command(
    name = "md2card",
    version,
    about = "Render Markdown into styled PNG cards and carousels",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Directory holding Inter-Regular.ttf and Inter-Bold.ttf.
    #[arg(long, global = true, env = "MD2CARD_FONTS_DIR", default_value = "./assets/fonts")]
    fonts_dir: PathBuf,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "MD2CARD_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "MD2CARD_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP service.
    Serve(ServeArgs),
    /// Render a single card to a PNG file.
    Card(CardArgs),
    /// Render a carousel into a directory of PNG files.
    Carousel(CarouselArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Bind address.
    #[arg(long, env = "MD2CARD_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Listen port.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Allowed CORS origin (repeatable).
    #[arg(
        long = "cors-origin",
        env = "MD2CARD_CORS_ORIGINS",
        value_delimiter = ',',
        default_values_t = md2card::server::DEFAULT_CORS_ORIGINS.map(String::from)
    )]
    cors_origins: Vec<String>,
}

#[derive(Args, Debug)]
struct CardArgs {
    /// Markdown file path, HTTP/HTTPS URL, or `-` for stdin.
    input: String,

    /// Output PNG path.
    #[arg(short, long)]
    output: PathBuf,

    /// Layout template.
    #[arg(long, value_enum, default_value = "instagram")]
    style: StyleArg,

    /// Handle shown in the header (without `@`).
    #[arg(long)]
    username: Option<String>,

    /// Signature shown in the footer.
    #[arg(long)]
    author: Option<String>,

    /// Decorative background pattern.
    #[arg(long, value_enum)]
    pattern: Option<PatternArg>,

    /// Output width in px (100–4096).
    #[arg(long, default_value_t = 1080)]
    width: u32,

    /// Output height in px (100–4096).
    #[arg(long, default_value_t = 1350)]
    height: u32,

    /// Disable hanging punctuation.
    #[arg(long)]
    no_hanging_punctuation: bool,

    /// Disable widow/orphan control.
    #[arg(long)]
    no_widow_control: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, default_value_t = 30)]
    download_timeout: u64,
}

#[derive(Args, Debug)]
struct CarouselArgs {
    /// Markdown file path, HTTP/HTTPS URL, or `-` for stdin.
    input: String,

    /// Output directory for slide-01.png, slide-02.png, …
    #[arg(short, long)]
    output: PathBuf,

    /// Layout template for every slide.
    #[arg(long, value_enum)]
    style: Option<StyleArg>,

    /// Handle shown in the header (without `@`).
    #[arg(long)]
    username: Option<String>,

    /// Signature shown in the footer.
    #[arg(long)]
    author: Option<String>,

    /// Brand colour: primary, accent and accent-slide background.
    #[arg(long)]
    brand_color: Option<String>,

    /// Append a closing slide.
    #[arg(long, value_enum)]
    final_slide: Option<FinalSlideArg>,

    /// Print the carousel JSON (slides, images, metadata) to stdout.
    #[arg(long)]
    json: bool,

    /// HTTP download timeout in seconds.
    #[arg(long, default_value_t = 30)]
    download_timeout: u64,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum StyleArg {
    Instagram,
    Modern,
    Classic,
}

impl From<StyleArg> for CardStyle {
    fn from(v: StyleArg) -> Self {
        match v {
            StyleArg::Instagram => CardStyle::Instagram,
            StyleArg::Modern => CardStyle::Modern,
            StyleArg::Classic => CardStyle::Classic,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PatternArg {
    Dots,
    Lines,
    Grid,
    Diagonal,
    Curves,
}

impl From<PatternArg> for DecorativePattern {
    fn from(v: PatternArg) -> Self {
        match v {
            PatternArg::Dots => DecorativePattern::Dots,
            PatternArg::Lines => DecorativePattern::Lines,
            PatternArg::Grid => DecorativePattern::Grid,
            PatternArg::Diagonal => DecorativePattern::Diagonal,
            PatternArg::Curves => DecorativePattern::Curves,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum FinalSlideArg {
    Cta,
    Contact,
    Brand,
}

impl From<FinalSlideArg> for FinalSlideKind {
    fn from(v: FinalSlideArg) -> Self {
        match v {
            FinalSlideArg::Cta => FinalSlideKind::Cta,
            FinalSlideArg::Contact => FinalSlideKind::Contact,
            FinalSlideArg::Brand => FinalSlideKind::Brand,
        }
    }
}

// ── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The carousel progress bar replaces INFO logs; everything else logs at
    // INFO by default.
    let show_progress = matches!(&cli.command, Command::Carousel(a) if !a.json) && !cli.quiet;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let fonts = FontSource::from_dir(&cli.fonts_dir);
    match cli.command {
        Command::Serve(args) => run_serve(args, fonts).await,
        Command::Card(args) => run_card(args, fonts, cli.quiet).await,
        Command::Carousel(args) => run_carousel(args, fonts, cli.quiet, show_progress).await,
    }
}

async fn run_serve(args: ServeArgs, fonts: FontSource) -> Result<()> {
    let config = ServerConfig {
        host: args.host,
        port: args.port,
        fonts,
        cors_origins: args.cors_origins,
    };
    serve(config).await.context("HTTP server failed")
}

async fn run_card(args: CardArgs, fonts: FontSource, quiet: bool) -> Result<()> {
    let start = Instant::now();
    let (source, markdown) = resolve_input(&args.input, args.download_timeout)
        .await
        .context("Failed to read input")?;

    let mut builder = CardConfig::builder()
        .style(args.style.into())
        .dimensions(args.width, args.height)
        .pattern(args.pattern.map(Into::into))
        .hanging_punctuation(!args.no_hanging_punctuation)
        .widow_orphan_control(!args.no_widow_control);
    if let Some(username) = args.username {
        builder = builder.username(username);
    }
    if let Some(author) = args.author {
        builder = builder.author_name(author);
    }
    let config = builder.build().context("Invalid card options")?;

    let bytes = generate_card_to_file(&markdown, &args.output, &config, &fonts)
        .await
        .context("Card generation failed")?;

    if !quiet {
        eprintln!(
            "{}  {}  →  {}  {}",
            green("✔"),
            source,
            bold(&args.output.display().to_string()),
            dim(&format!("{} bytes, {}ms", bytes, start.elapsed().as_millis())),
        );
    }
    Ok(())
}

async fn run_carousel(args: CarouselArgs, fonts: FontSource, quiet: bool, show_progress: bool) -> Result<()> {
    let (source, text) = resolve_input(&args.input, args.download_timeout)
        .await
        .context("Failed to read input")?;

    let settings = CarouselSettings {
        username: args.username,
        author_name: args.author,
        brand_color: args.brand_color,
        style: args.style.map(Into::into),
        final_slide: args.final_slide.map(|k| FinalSlideSettings::new(k.into())),
    };

    let progress: Box<dyn CarouselProgressCallback> = if show_progress {
        Box::new(CliProgressCallback::new())
    } else {
        Box::new(NoopProgressCallback)
    };
    let output = generate_carousel(&text, &settings, &fonts, progress.as_ref())
        .await
        .context("Carousel generation failed")?;

    let paths = write_slides(&output, &args.output)
        .await
        .context("Failed to write slides")?;

    if args.json {
        let json = serde_json::to_string_pretty(&output).context("Failed to serialise output")?;
        println!("{json}");
    }
    if !quiet {
        eprintln!(
            "{}  {}  →  {} slides in {}  {}",
            green("✔"),
            source,
            bold(&paths.len().to_string()),
            bold(&args.output.display().to_string()),
            dim(&format!("{}ms", output.metadata.processing_time)),
        );
    }
    Ok(())
}
