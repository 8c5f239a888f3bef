use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use clap::{Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use flipbook::{
    ConversionConfig, Converter, DimensionBound, DocumentOptions, ExtractOptions, FfmpegLogLevel,
    FrameSampler, FrameSource, OperationType, PageSize, ProgressCallback, ProgressInfo,
    SampleConfig, UploadLimits, VideoSource,
};

const CLI_AFTER_HELP: &str = "Examples:\n  flipbook convert lecture.mp4 --out lecture.pdf --fps 0.2 --progress\n  flipbook frames lecture.mp4 --out frames --max-dimension 1280\n  flipbook metadata lecture.mp4 --json\n  flipbook validate upload.mov\n  flipbook completions zsh > _flipbook";

#[derive(Debug, Parser)]
#[command(
    name = "flipbook",
    version,
    about = "Turn videos into paginated PDF documents",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Args, Clone, Default)]
struct GlobalOptions {
    /// Show debug logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Show a progress bar.
    #[arg(long, global = true)]
    progress: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// FFmpeg log level (quiet, fatal, error, warning, info, debug).
    #[arg(long, global = true)]
    log_level: Option<String>,
}

#[derive(Debug, Args, Clone)]
struct SampleArgs {
    /// Frames sampled per second of video.
    #[arg(long, default_value_t = 0.5)]
    fps: f64,

    /// Upper bound in pixels for the bounded dimension.
    #[arg(long, default_value_t = 1920)]
    max_dimension: u32,

    /// JPEG quality between 0 and 1.
    #[arg(long, default_value_t = 0.8)]
    quality: f32,

    /// Which dimension --max-dimension bounds (width, longest).
    #[arg(long, default_value = "width", value_parser = parse_bound)]
    bound: DimensionBound,
}

impl SampleArgs {
    fn to_config(&self) -> SampleConfig {
        SampleConfig::new()
            .with_frames_per_second(self.fps)
            .with_max_dimension(self.max_dimension)
            .with_jpeg_quality(self.quality)
            .with_dimension_bound(self.bound)
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Convert a video into a PDF with one sampled frame per page.
    #[command(
        after_help = "Examples:\n  flipbook convert talk.mp4 --out talk.pdf\n  flipbook convert talk.mp4 --out talk.pdf --page letter --title \"Keynote\""
    )]
    Convert {
        /// Input video path.
        input: PathBuf,
        /// Output PDF path. Defaults to the input path with a .pdf extension.
        #[arg(long)]
        out: Option<PathBuf>,
        #[command(flatten)]
        sample: SampleArgs,
        /// Page size: a4, a4-portrait, letter, letter-portrait, or WxH in points.
        #[arg(long, default_value = "a4", value_parser = parse_page_size)]
        page: PageSize,
        /// Document title stored in the PDF metadata.
        #[arg(long)]
        title: Option<String>,
    },

    /// Write sampled frames as JPEG files.
    #[command(
        after_help = "Examples:\n  flipbook frames talk.mp4 --out frames\n  flipbook frames talk.mp4 --out frames --fps 1 --bound longest"
    )]
    Frames {
        /// Input video path.
        input: PathBuf,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        #[command(flatten)]
        sample: SampleArgs,
    },

    /// Print video metadata.
    #[command(visible_alias = "probe")]
    Metadata {
        /// Input video path.
        input: PathBuf,
        /// Output metadata as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Check a video before converting it.
    Validate {
        /// Input video path.
        input: PathBuf,
        /// Size limit in megabytes.
        #[arg(long, default_value_t = 100)]
        max_megabytes: u64,
        #[command(flatten)]
        sample: SampleArgs,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn parse_bound(value: &str) -> Result<DimensionBound, String> {
    match value.to_ascii_lowercase().as_str() {
        "width" => Ok(DimensionBound::Width),
        "longest" | "longest-edge" => Ok(DimensionBound::LongestEdge),
        other => Err(format!("unknown bound '{other}' (expected width or longest)")),
    }
}

fn parse_page_size(value: &str) -> Result<PageSize, String> {
    let page = match value.to_ascii_lowercase().as_str() {
        "a4" | "a4-landscape" => PageSize::A4.landscape(),
        "a4-portrait" => PageSize::A4,
        "letter" | "letter-landscape" => PageSize::LETTER.landscape(),
        "letter-portrait" => PageSize::LETTER,
        custom => {
            let (width, height) = custom
                .split_once('x')
                .ok_or(format!("unknown page size '{value}'"))?;
            let width: f64 = width
                .trim()
                .parse()
                .map_err(|_| format!("invalid page width in '{value}'"))?;
            let height: f64 = height
                .trim()
                .parse()
                .map_err(|_| format!("invalid page height in '{value}'"))?;
            PageSize::new(width, height)
        }
    };
    page.validate().map_err(|error| error.to_string())?;
    Ok(page)
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn init_logging(global: &GlobalOptions) -> Result<(), Box<dyn std::error::Error>> {
    let default_filter = if global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    let ffmpeg_level = match &global.log_level {
        Some(level) => level.parse::<FfmpegLogLevel>()?,
        None if global.verbose => FfmpegLogLevel::Warning,
        None => FfmpegLogLevel::Error,
    };
    flipbook::set_ffmpeg_log_level(ffmpeg_level);
    Ok(())
}

/// Drives an `indicatif` bar from progress reports.
struct TerminalProgress {
    bar: ProgressBar,
}

impl TerminalProgress {
    fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.green} {msg:>10} {bar:40.cyan/blue} {pos}/{len} ({percent}%)",
        )?;
        bar.set_style(style.progress_chars("##-"));
        Ok(Self { bar })
    }
}

impl ProgressCallback for TerminalProgress {
    fn on_progress(&self, info: &ProgressInfo) {
        let label = match info.operation {
            OperationType::FrameSampling => "sampling",
            OperationType::DocumentAssembly => "assembly",
            _ => "working",
        };
        self.bar.set_message(label);
        self.bar.set_length(info.total.max(info.current));
        self.bar.set_position(info.current);
    }
}

fn extract_options(
    global: &GlobalOptions,
) -> Result<(ExtractOptions, Option<ProgressBar>), Box<dyn std::error::Error>> {
    if !global.progress {
        return Ok((ExtractOptions::new(), None));
    }
    let progress = TerminalProgress::new()?;
    let bar = progress.bar.clone();
    Ok((ExtractOptions::new().with_progress(Arc::new(progress)), Some(bar)))
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli.global)?;

    match cli.command {
        Commands::Convert {
            input,
            out,
            sample,
            page,
            title,
        } => {
            let out = out.unwrap_or_else(|| input.with_extension("pdf"));
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut document = DocumentOptions::new().with_page_size(page);
            if let Some(title) = title {
                document = document.with_title(title);
            }
            let config = ConversionConfig::new()
                .with_sample(sample.to_config())
                .with_document(document);

            let (options, bar) = extract_options(&cli.global)?;
            let pdf = Converter::new(config).with_options(options).convert_path(&input)?;
            if let Some(bar) = bar {
                bar.finish_and_clear();
            }

            fs::write(&out, &pdf)?;
            println!(
                "{} {} ({} bytes)",
                "wrote".green().bold(),
                out.display(),
                pdf.len()
            );
        }
        Commands::Frames { input, out, sample } => {
            fs::create_dir_all(&out)?;
            let mut source = VideoSource::open(&input)?;
            let (options, bar) = extract_options(&cli.global)?;

            let mut written = 0_u64;
            FrameSampler::new(&mut source, sample.to_config())?.for_each_frame(&options, |frame| {
                let path = out.join(format!("frame_{:06}.jpg", frame.sequence_index));
                if path.exists() && !cli.global.overwrite {
                    return Err(flipbook::FlipbookError::IoError(std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        format!("{} exists (use --overwrite)", path.display()),
                    )));
                }
                frame.save(&path)?;
                written += 1;
                if cli.global.verbose {
                    eprintln!(
                        "{} {} at {:.2}s",
                        "frame".cyan(),
                        path.display(),
                        frame.timestamp.as_secs_f64()
                    );
                }
                Ok(())
            })?;

            if let Some(bar) = bar {
                bar.finish_and_clear();
            }
            println!(
                "{} {written} frames to {}",
                "wrote".green().bold(),
                out.display()
            );
        }
        Commands::Metadata { input, json } => {
            let source = VideoSource::open(&input)?;
            let metadata = source.metadata()?;
            if json {
                let payload = json!({
                    "format": metadata.format,
                    "codec": metadata.codec,
                    "duration_seconds": metadata.duration.as_secs_f64(),
                    "width": metadata.width,
                    "height": metadata.height,
                    "fps": metadata.frames_per_second,
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("Format: {}", metadata.format);
                println!("Codec: {}", metadata.codec);
                println!("Duration: {:.3}s", metadata.duration.as_secs_f64());
                println!("Dimensions: {}x{}", metadata.width, metadata.height);
                println!("Frame rate: {:.3} fps", metadata.frames_per_second);
            }
        }
        Commands::Validate {
            input,
            max_megabytes,
            sample,
        } => {
            let limits = UploadLimits::default().with_max_bytes(megabytes_to_bytes(max_megabytes));
            let size = fs::metadata(&input)?.len();
            let mut report = flipbook::validate_upload(&input.display().to_string(), size, &limits);

            if report.is_valid() {
                match VideoSource::open(&input).and_then(|source| source.metadata()) {
                    Ok(metadata) => {
                        report.merge(flipbook::validate_metadata(&metadata, &sample.to_config()))
                    }
                    Err(error) => report.errors.push(error.to_string()),
                }
            }

            print!("{report}");
            if !report.is_valid() {
                return Err(format!("{} validation error(s)", report.errors.len()).into());
            }
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "flipbook", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn megabytes_to_bytes(megabytes: u64) -> u64 {
    megabytes.saturating_mul(1024 * 1024)
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}
