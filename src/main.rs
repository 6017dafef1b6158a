use clap::{Parser, Subcommand, ValueEnum};
use pixelkit::batch::{self, BatchOperation};
use pixelkit::config::{self, EditorConfig};
use pixelkit::imaging::operations;
use pixelkit::imaging::{
    Adjustments, BlurRadius, CropRect, CssColor, Exported, FlipAxis, ImageBlob, Percent,
    Quality, ResizeParams, RustBackend, TargetFormat, Tolerance, WatermarkPosition,
};
use pixelkit::types::OutputSummary;
use pixelkit::{input, naming, output};
use std::error::Error;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn Error>>;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "pixelkit")]
#[command(about = "Stateless image toolkit: convert, resize, compress, edit and inspect images")]
#[command(long_about = "\
Stateless image toolkit: convert, resize, compress, edit and inspect images

Every command reads one image, applies one transform and writes a new file.
Inputs are never modified. Without --output the result is written next to
the input; when that name is already the input's, the command name is
appended (photo.jpg → photo-rotate.jpg).

Supported inputs:  JPEG, PNG, WebP, GIF, BMP, TIFF
Supported outputs: JPEG, PNG, WebP, GIF, BMP, PDF (single page)

Run 'pixelkit gen-config' to generate a documented pixelkit.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (default: ./pixelkit.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log pipeline detail to stderr (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

/// Input and output paths shared by every single-image command.
#[derive(clap::Args, Clone)]
struct IoArgs {
    /// Input image
    input: PathBuf,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Convert to another format (jpg, png, webp, gif, bmp or pdf)
    Convert {
        #[command(flatten)]
        io: IoArgs,
        /// Target format; unknown names produce PNG
        #[arg(long, default_value = "png")]
        to: String,
    },
    /// Export as a single-page PDF sized to the image
    Pdf(IoArgs),
    /// Resize to absolute dimensions or by percentage
    Resize {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, conflicts_with = "percent")]
        width: Option<u32>,
        #[arg(long, conflicts_with = "percent")]
        height: Option<u32>,
        /// Stretch to exactly --width x --height
        #[arg(long)]
        no_aspect: bool,
        /// Scale both sides by this percentage
        #[arg(long)]
        percent: Option<f64>,
    },
    /// Re-encode smaller, capping the longest edge
    Compress {
        #[command(flatten)]
        io: IoArgs,
        /// Quality 1-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
        /// Longest edge in pixels (default from config)
        #[arg(long)]
        max_edge: Option<u32>,
        /// Re-encode as WebP instead of the input format
        #[arg(long)]
        webp: bool,
    },
    /// Rotate clockwise by any angle; the canvas grows to fit
    Rotate {
        #[command(flatten)]
        io: IoArgs,
        #[arg(allow_negative_numbers = true)]
        degrees: f64,
    },
    /// Mirror the image
    Flip {
        #[command(flatten)]
        io: IoArgs,
        #[arg(value_enum)]
        axis: FlipArg,
    },
    /// Cut out a rectangle
    Crop {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        x: u32,
        #[arg(long)]
        y: u32,
        #[arg(long)]
        width: u32,
        #[arg(long)]
        height: u32,
    },
    /// Brightness, contrast and saturation in percent (100 = unchanged)
    Adjust {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 100.0)]
        brightness: f32,
        #[arg(long, default_value_t = 100.0)]
        contrast: f32,
        #[arg(long, default_value_t = 100.0)]
        saturation: f32,
    },
    /// Apply a preset: grayscale, sepia, blur, invert, hue-rotate, vintage, cold, warm
    Filter {
        #[command(flatten)]
        io: IoArgs,
        name: String,
    },
    /// Draw a text watermark (defaults from config)
    Watermark {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long)]
        text: String,
        #[arg(long)]
        font_size: Option<f32>,
        /// CSS color, e.g. "#ffffff" or "rgba(0, 0, 0, 0.4)"
        #[arg(long)]
        color: Option<String>,
        /// top-left, top-right, bottom-left, bottom-right or center
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        font_family: Option<String>,
    },
    /// Remove, replace or blur a uniform background
    #[command(subcommand)]
    Background(BackgroundCommand),
    /// Show or strip embedded EXIF metadata
    #[command(subcommand)]
    Metadata(MetadataCommand),
    /// Apply one operation to many files in parallel
    Batch {
        /// Files and directories (walked recursively)
        #[arg(required = true)]
        inputs: Vec<PathBuf>,
        #[arg(long, value_enum)]
        op: BatchOpArg,
        /// Compression quality 1-100 (default from config)
        #[arg(long)]
        quality: Option<u32>,
        /// Resize percentage
        #[arg(long, default_value_t = 100.0)]
        percent: f64,
        /// Conversion target format
        #[arg(long, default_value = "jpg")]
        format: String,
        /// Output directory
        #[arg(long, default_value = "pixelkit-out")]
        out: PathBuf,
        /// Exit with an error if any item failed
        #[arg(long)]
        strict: bool,
    },
    /// Print a stock pixelkit.toml with all options documented
    GenConfig,
}

#[derive(Subcommand)]
enum BackgroundCommand {
    /// Make the background transparent (always writes PNG)
    Transparent {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 30)]
        tolerance: u32,
    },
    /// Paint the background with a color
    Replace {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value = "#ffffff")]
        color: String,
        #[arg(long, default_value_t = 30)]
        tolerance: u32,
    },
    /// Blur everything outside the centered focal area
    Blur {
        #[command(flatten)]
        io: IoArgs,
        #[arg(long, default_value_t = 10.0)]
        radius: f32,
    },
}

#[derive(Subcommand)]
enum MetadataCommand {
    /// Print camera, exposure and GPS tags
    Show {
        input: PathBuf,
        /// Print every tag as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write a copy without any embedded metadata
    Strip(IoArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum FlipArg {
    Horizontal,
    Vertical,
}

impl From<FlipArg> for FlipAxis {
    fn from(arg: FlipArg) -> Self {
        match arg {
            FlipArg::Horizontal => FlipAxis::Horizontal,
            FlipArg::Vertical => FlipAxis::Vertical,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum BatchOpArg {
    Compress,
    Resize,
    Convert,
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let config = config::load_config(cli.config.as_deref())?;
    let backend = match &config.watermark.font_path {
        Some(path) => RustBackend::with_font_file(path)?,
        None => RustBackend::new(),
    };
    let limits = &config.limits;

    match cli.command {
        Command::Convert { io, to } => {
            let blob = input::read_image(&io.input, limits)?;
            let exported = operations::export(&backend, &blob, &to)?;
            finish(&backend, &io, "convert", &blob, exported)?;
        }
        Command::Pdf(io) => {
            let blob = input::read_image(&io.input, limits)?;
            let doc = operations::to_document(&backend, &blob)?;
            finish(&backend, &io, "pdf", &blob, Exported::Document(doc))?;
        }
        Command::Resize {
            io,
            width,
            height,
            no_aspect,
            percent,
        } => {
            let blob = input::read_image(&io.input, limits)?;
            let out = match percent {
                Some(p) => {
                    let percent = Percent::new(p, limits)?;
                    operations::resize_percentage(&backend, &blob, percent, limits)?
                }
                None => {
                    let params = ResizeParams {
                        width,
                        height,
                        maintain_aspect: !no_aspect,
                    };
                    operations::resize_absolute(&backend, &blob, &params, limits)?
                }
            };
            finish(&backend, &io, "resize", &blob, Exported::Image(out))?;
        }
        Command::Compress {
            io,
            quality,
            max_edge,
            webp,
        } => {
            let blob = input::read_image(&io.input, limits)?;
            let quality = quality_or_default(quality, &config)?;
            let out = if webp {
                operations::compress_to_webp(&backend, &blob, quality)?
            } else {
                let max_edge = max_edge.unwrap_or(config.compress.max_edge);
                operations::compress(&backend, &blob, quality, max_edge)?
            };
            finish(&backend, &io, "compress", &blob, Exported::Image(out))?;
        }
        Command::Rotate { io, degrees } => {
            let blob = input::read_image(&io.input, limits)?;
            let out = operations::rotate(&backend, &blob, degrees, limits)?;
            finish(&backend, &io, "rotate", &blob, Exported::Image(out))?;
        }
        Command::Flip { io, axis } => {
            let blob = input::read_image(&io.input, limits)?;
            let out = operations::flip(&backend, &blob, axis.into())?;
            finish(&backend, &io, "flip", &blob, Exported::Image(out))?;
        }
        Command::Crop {
            io,
            x,
            y,
            width,
            height,
        } => {
            let blob = input::read_image(&io.input, limits)?;
            let rect = CropRect {
                x,
                y,
                width,
                height,
            };
            let out = operations::crop(&backend, &blob, &rect)?;
            finish(&backend, &io, "crop", &blob, Exported::Image(out))?;
        }
        Command::Adjust {
            io,
            brightness,
            contrast,
            saturation,
        } => {
            let blob = input::read_image(&io.input, limits)?;
            let adjustments = Adjustments {
                brightness,
                contrast,
                saturation,
            };
            let out = operations::adjust(&backend, &blob, &adjustments)?;
            finish(&backend, &io, "adjust", &blob, Exported::Image(out))?;
        }
        Command::Filter { io, name } => {
            let blob = input::read_image(&io.input, limits)?;
            let out = operations::apply_filter(&backend, &blob, &name)?;
            finish(&backend, &io, "filter", &blob, Exported::Image(out))?;
        }
        Command::Watermark {
            io,
            text,
            font_size,
            color,
            position,
            font_family,
        } => {
            if text.trim().is_empty() {
                return Err("watermark text must not be empty".into());
            }
            let mut options = config.watermark.to_options()?;
            if let Some(size) = font_size {
                options.font_size = size;
            }
            if let Some(color) = color {
                options.color = CssColor::parse(&color)?;
            }
            if let Some(position) = position {
                options.position = WatermarkPosition::parse_lenient(&position);
            }
            if let Some(family) = font_family {
                options.font_family = family;
            }
            let blob = input::read_image(&io.input, limits)?;
            let out = operations::add_text_watermark(&backend, &blob, &text, &options)?;
            finish(&backend, &io, "watermark", &blob, Exported::Image(out))?;
        }
        Command::Background(command) => match command {
            BackgroundCommand::Transparent { io, tolerance } => {
                let tolerance = Tolerance::new(tolerance, limits)?;
                let blob = input::read_image(&io.input, limits)?;
                let out = operations::transparentize(&backend, &blob, tolerance)?;
                finish(&backend, &io, "background", &blob, Exported::Image(out))?;
            }
            BackgroundCommand::Replace {
                io,
                color,
                tolerance,
            } => {
                let tolerance = Tolerance::new(tolerance, limits)?;
                let blob = input::read_image(&io.input, limits)?;
                let out = operations::replace_background(&backend, &blob, &color, tolerance)?;
                finish(&backend, &io, "background", &blob, Exported::Image(out))?;
            }
            BackgroundCommand::Blur { io, radius } => {
                let radius = BlurRadius::new(radius, limits)?;
                let blob = input::read_image(&io.input, limits)?;
                let out = operations::blur_background(&backend, &blob, radius)?;
                finish(&backend, &io, "background", &blob, Exported::Image(out))?;
            }
        },
        Command::Metadata(command) => match command {
            MetadataCommand::Show { input: path, json } => {
                let blob = input::read_image(&path, limits)?;
                let report = operations::inspect(&backend, &blob)?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&report)?);
                } else {
                    output::print_metadata_report(blob.name(), &report);
                }
            }
            MetadataCommand::Strip(io) => {
                let blob = input::read_image(&io.input, limits)?;
                let out = operations::strip_metadata(&backend, &blob)?;
                finish(&backend, &io, "strip", &blob, Exported::Image(out))?;
            }
        },
        Command::Batch {
            inputs,
            op,
            quality,
            percent,
            format,
            out,
            strict,
        } => {
            let operation = match op {
                BatchOpArg::Compress => BatchOperation::Compress {
                    quality: quality_or_default(quality, &config)?,
                    max_edge: config.compress.max_edge,
                },
                BatchOpArg::Resize => BatchOperation::Resize {
                    percent: Percent::new(percent, limits)?,
                },
                BatchOpArg::Convert => BatchOperation::Convert {
                    format: TargetFormat::parse_lenient(&format),
                },
            };
            let files = input::collect_images(&inputs)?;
            if files.is_empty() {
                return Err("no images found in the given inputs".into());
            }
            init_thread_pool(&config.processing);

            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    for line in output::format_batch_event(&event) {
                        println!("{}", line);
                    }
                }
            });
            let run = batch::run_batch(&backend, &files, &operation, limits, Some(tx));
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;

            let manifest = batch::write_batch(&run, &out)?;
            output::print_batch_summary(&run.report, &manifest);
            if strict {
                run.into_all_or_nothing()?;
            }
        }
        // printed before the config is loaded
        Command::GenConfig => {}
    }

    Ok(())
}

fn quality_or_default(quality: Option<u32>, config: &EditorConfig) -> CliResult<Quality> {
    Ok(match quality {
        Some(q) => Quality::from_percent(q)?,
        None => config.compress.quality()?,
    })
}

/// Write the result and print the before/after summary.
fn finish(
    backend: &RustBackend,
    io: &IoArgs,
    operation: &str,
    input: &ImageBlob,
    exported: Exported,
) -> CliResult<()> {
    let path = output_path(io, exported.name(), operation);
    std::fs::write(&path, exported.bytes())?;

    let mut summary = OutputSummary::new(operation, input, &exported);
    summary.output.name = path.display().to_string();
    if let Exported::Image(blob) = &exported {
        if let Ok(dimensions) = operations::dimensions(backend, blob) {
            summary = summary.with_dimensions(dimensions);
        }
    }
    output::print_summary(&summary);
    Ok(())
}

/// `--output`, or the output name next to the input without overwriting it.
fn output_path(io: &IoArgs, output_name: &str, operation: &str) -> PathBuf {
    if let Some(path) = &io.output {
        return path.clone();
    }
    let dir = io.input.parent().unwrap_or(Path::new(""));
    let candidate = dir.join(output_name);
    if candidate == io.input {
        dir.join(naming::suffixed_name(output_name, operation))
    } else {
        candidate
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins over `--verbose`.
fn init_logging(verbose: bool) {
    let default = if verbose { "pixelkit=debug" } else { "pixelkit=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
