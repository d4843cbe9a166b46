//! pokemon-card-scanner - find Pokémon names on card photos
//!
//! Thin command-line front end over the library: it loads configuration and
//! the vocabulary once, scans every image given on the command line and
//! prints one JSON response per image.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use pokemon_card_scanner::config::{self, AppConfig};
use pokemon_card_scanner::events::{EventSink, NullSink, TracingSink};
use pokemon_card_scanner::response::{scan_file, DetectionResponse, ResponseShape};
use pokemon_card_scanner::vision::{
    BridgeRecognizer, OcrBackend, SidecarRecognizer, TextRecognizer, SUPPORTED_LANGUAGES,
};
use pokemon_card_scanner::{TwoPassDetector, Vocabulary};

/// Find Pokémon names on photographed cards
#[derive(Parser, Debug)]
#[command(name = "pokemon-card-scanner")]
#[command(version, about = "Identify Pokémon names on card photos with OCR and fuzzy matching")]
struct Cli {
    /// Configuration file (default: platform config dir)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan one or more card images
    Scan(ScanArgs),

    /// Write a default configuration file
    InitConfig {
        /// Destination (default: platform config dir)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(clap::Args, Debug)]
struct ScanArgs {
    /// Card images
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// OCR language tag (en, fr, es, de, it)
    #[arg(short, long)]
    lang: Option<String>,

    /// Minimum similarity score, exclusive (0-100)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Size tolerance around the reference name (0.3 = ±30%)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Report only the best match
    #[arg(short, long)]
    best_only: bool,

    /// Report names without scores
    #[arg(long)]
    names_only: bool,

    /// Name list file (plain text or JSON array)
    #[arg(long)]
    vocabulary: Option<PathBuf>,

    /// OCR backend
    #[arg(long, value_enum)]
    ocr: Option<BackendArg>,

    /// Program for the bridge backend
    #[arg(long)]
    bridge_program: Option<PathBuf>,

    /// Worker threads for multiple images
    #[arg(short, long, default_value_t = 4)]
    jobs: usize,

    /// Log every comparison the detector makes
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
enum BackendArg {
    Sidecar,
    Bridge,
}

impl From<BackendArg> for OcrBackend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Sidecar => OcrBackend::Sidecar,
            BackendArg::Bridge => OcrBackend::Bridge,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Scan(args) if args.verbose);
    init_logging(verbose)?;

    match cli.command {
        Commands::Scan(args) => run_scan(cli.config.as_deref(), args),
        Commands::InitConfig { path, force } => {
            init_config(path.or(cli.config), force)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr so stdout stays machine-readable
fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Load configuration from file or fall back to defaults
fn load_or_default_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    if let Ok(path) = config::default_config_path() {
        if path.exists() {
            let config = config::load_config(&path)?;
            info!("Loaded configuration from {:?}", path);
            return Ok(config);
        }
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

/// Command-line flags win over the file
fn apply_overrides(config: &mut AppConfig, args: &ScanArgs) {
    if let Some(lang) = &args.lang {
        config.detection.language = lang.clone();
    }
    if let Some(threshold) = args.threshold {
        config.detection.similarity_threshold = threshold;
    }
    if let Some(tolerance) = args.tolerance {
        config.detection.size_tolerance = tolerance;
    }
    if args.best_only {
        config.detection.best_only = true;
    }
    if args.verbose {
        config.detection.verbose = true;
    }
    if let Some(path) = &args.vocabulary {
        config.vocabulary.path = Some(path.clone());
    }
    if let Some(backend) = args.ocr {
        config.ocr.backend = backend.into();
    }
    if let Some(program) = &args.bridge_program {
        config.ocr.bridge_program = Some(program.clone());
    }
}

fn build_recognizer(config: &AppConfig) -> Result<Arc<dyn TextRecognizer>> {
    let ocr = &config.ocr;
    let recognizer: Arc<dyn TextRecognizer> = match ocr.backend {
        OcrBackend::Sidecar => Arc::new(SidecarRecognizer::new(ocr.sidecar_suffix.clone())),
        OcrBackend::Bridge => {
            let program = ocr
                .bridge_program
                .clone()
                .context("bridge backend requires a program (--bridge-program)")?;
            Arc::new(BridgeRecognizer::new(program).with_args(ocr.bridge_args.clone()))
        }
    };
    Ok(recognizer)
}

fn run_scan(config_path: Option<&Path>, args: ScanArgs) -> Result<ExitCode> {
    let mut config = load_or_default_config(config_path)?;
    apply_overrides(&mut config, &args);
    config.validate()?;

    let language = &config.detection.language;
    if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
        warn!(
            "Language '{}' is not one of {:?}; forwarding it to the OCR backend anyway",
            language, SUPPORTED_LANGUAGES
        );
    }

    let vocabulary = Arc::new(Vocabulary::load_or_builtin(config.vocabulary.path.as_deref())?);
    info!("Vocabulary: {} names", vocabulary.len());

    let sink: Arc<dyn EventSink> = if config.detection.verbose {
        Arc::new(TracingSink)
    } else {
        Arc::new(NullSink)
    };
    let detector = TwoPassDetector::new(build_recognizer(&config)?, vocabulary)
        .with_matcher(config.matching)
        .with_sink(sink);

    let shape = ResponseShape::from_config(&config.detection, args.names_only);
    let responses = scan_all(&detector, &args.images, &config, shape, args.jobs);

    let mut failed = false;
    for response in &responses {
        failed |= response.error.is_some();
        println!("{}", serde_json::to_string(response)?);
    }

    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// Scan images on a small worker pool; responses come back in input order
fn scan_all(
    detector: &TwoPassDetector,
    images: &[PathBuf],
    config: &AppConfig,
    shape: ResponseShape,
    jobs: usize,
) -> Vec<DetectionResponse> {
    let workers = jobs.clamp(1, images.len().max(1));
    let (job_tx, job_rx) = crossbeam_channel::unbounded::<(usize, &Path)>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<(usize, DetectionResponse)>();

    for (index, path) in images.iter().enumerate() {
        // Receiver is alive until the scope below ends
        let _ = job_tx.send((index, path.as_path()));
    }
    drop(job_tx);

    std::thread::scope(|scope| {
        for _ in 0..workers {
            let job_rx = job_rx.clone();
            let result_tx = result_tx.clone();
            scope.spawn(move || {
                for (index, path) in job_rx.iter() {
                    let response = scan_file(detector, path, &config.detection, shape);
                    let _ = result_tx.send((index, response));
                }
            });
        }
    });
    drop(result_tx);

    let mut results: Vec<(usize, DetectionResponse)> = result_rx.iter().collect();
    results.sort_by_key(|(index, _)| *index);
    results.into_iter().map(|(_, response)| response).collect()
}

fn init_config(path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path {
        Some(path) => path,
        None => config::default_config_path()?,
    };

    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }

    config::save_config(&AppConfig::default(), &path)?;
    info!("Wrote default configuration to {:?}", path);
    println!("{}", path.display());
    Ok(())
}
