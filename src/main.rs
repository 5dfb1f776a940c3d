//! # Media Tools - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del logging con `tracing` (su stderr, stdout resta JSON)
//! - Caricamento della configurazione (file + variabili d'ambiente)
//! - Esecuzione del tool richiesto ed emissione dei messaggi
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (subcommand, config, output, verbose)
//! 2. Configura il logging (INFO o DEBUG a seconda del flag verbose, `RUST_LOG` se presente)
//! 3. Carica e valida la configurazione
//! 4. Legge i file di input e invoca il tool
//! 5. Emette ogni messaggio come riga JSON; exit code 1 se lo stato finale è `error`
//!
//! ## Esempio di utilizzo:
//! ```bash
//! media-tools --output frames/ video-frames --video clip.mp4 --gap-time 2 --count 10
//! LOVE_PUBLIC_KEY=project_public_... media-tools remove-background --image cat.png
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use media_tools::ffmpeg::FfmpegRunner;
use media_tools::platform::PlatformCommands;
use media_tools::{
    provider, Base64ImageParams, Base64ImageTool, Config, MessageSink, RemoveBackgroundParams,
    RemoveBackgroundTool, ToolFile, ToolOutput, VideoFrameListParams, VideoFrameListTool,
    VideoFrameParams, VideoFrameTool, VideoInfoParams, VideoInfoTool,
};

#[derive(Parser)]
#[command(name = "media-tools")]
#[command(about = "Video frame extraction, video probing, base64 decoding and background removal")]
struct Args {
    /// Configuration file (default: <config dir>/media-tools/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory where produced files are written
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract a single frame from a video
    VideoFrame {
        /// Video file
        #[arg(long)]
        video: PathBuf,

        /// Frame to extract: start, end or time
        #[arg(long = "type", default_value = "start")]
        frame_type: String,

        /// Seconds into the video, used with --type time
        #[arg(long, default_value = "1")]
        time: String,
    },

    /// Extract frames at a fixed interval
    VideoFrames {
        /// Video file
        #[arg(long)]
        video: PathBuf,

        /// Seconds between two frames
        #[arg(long, default_value = "1")]
        gap_time: String,

        /// Number of frames to extract
        #[arg(long, default_value = "1")]
        count: String,
    },

    /// Show container and stream metadata
    VideoInfo {
        /// Video file
        #[arg(long)]
        video: PathBuf,
    },

    /// Decode a base64 string or data URL into an image
    Base64ToImage {
        /// Base64 string or data:image/...;base64,... URL
        #[arg(long, conflicts_with = "data_file")]
        data: Option<String>,

        /// File holding the base64 string
        #[arg(long)]
        data_file: Option<PathBuf>,
    },

    /// Remove the background of an image with iLoveImg
    RemoveBackground {
        /// Image file
        #[arg(long)]
        image: PathBuf,
    },

    /// Report external tools and credential status
    Check {
        /// Write the default configuration file if it does not exist
        #[arg(long)]
        init_config: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging; stdout is reserved for tool messages
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = args.config.clone().or_else(Config::default_path);
    let config = match &config_path {
        Some(path) => Config::from_file(path).await?,
        None => Config::default(),
    }
    .with_env_overrides();
    config.validate()?;
    debug!("Configuration loaded from {:?}", config_path);

    let output = match args.command {
        Command::Check { init_config } => {
            return run_check(&config, config_path.as_deref(), init_config).await;
        }
        Command::VideoFrame {
            video,
            frame_type,
            time,
        } => {
            let tool = VideoFrameTool::new(FfmpegRunner::new(config.frame_quality));
            tool.invoke(VideoFrameParams {
                video: Some(read_input(&video).await?),
                frame_type,
                time,
            })
            .await
        }
        Command::VideoFrames {
            video,
            gap_time,
            count,
        } => {
            let tool = VideoFrameListTool::new(FfmpegRunner::new(config.frame_quality))
                .with_max_count(config.max_frame_count)
                .with_progress(config.show_progress);
            tool.invoke(VideoFrameListParams {
                video: Some(read_input(&video).await?),
                gap_time,
                count,
            })
            .await
        }
        Command::VideoInfo { video } => {
            let tool = VideoInfoTool::new(FfmpegRunner::new(config.frame_quality));
            tool.invoke(VideoInfoParams {
                video: Some(read_input(&video).await?),
            })
            .await
        }
        Command::Base64ToImage { data, data_file } => {
            let base64_image = match data_file {
                Some(path) => Some(
                    tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Cannot read {}", path.display()))?,
                ),
                None => data,
            };
            Base64ImageTool::new().invoke(Base64ImageParams { base64_image })
        }
        Command::RemoveBackground { image } => {
            let image = read_input(&image).await?;
            RemoveBackgroundTool::new(config.clone())
                .invoke(RemoveBackgroundParams { image: Some(image) })
                .await
        }
    };

    emit(&args.output, &output).await?;

    if output.is_error() {
        std::process::exit(1);
    }

    Ok(())
}

async fn read_input(path: &Path) -> Result<ToolFile> {
    if !path.is_file() {
        return Err(anyhow::anyhow!("Input file does not exist: {}", path.display()));
    }
    Ok(ToolFile::from_path(path).await?)
}

async fn emit(output_dir: &Path, output: &ToolOutput) -> Result<()> {
    let sink = MessageSink::new(output_dir);
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    sink.emit(output, &mut handle).await
}

async fn run_check(config: &Config, config_path: Option<&Path>, init_config: bool) -> Result<()> {
    if init_config {
        let path = config_path
            .ok_or_else(|| anyhow::anyhow!("No configuration directory available"))?;
        if path.exists() {
            info!("Configuration already exists: {}", path.display());
        } else {
            Config::default().save_to_file(path).await?;
            info!("Wrote default configuration to {}", path.display());
        }
    }

    println!("{}", PlatformCommands::system_info());
    println!("{}", PlatformCommands::instance().get_tools_report().await);

    let ready = FfmpegRunner::check_dependencies().await.is_ok();
    match provider::validate_credentials(config) {
        Ok(_) => println!("✅ {} configured", media_tools::config::PUBLIC_KEY_ENV),
        Err(e) => println!("❌ {}", e),
    }

    if !ready {
        std::process::exit(1);
    }
    Ok(())
}
