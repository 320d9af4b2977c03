use clap::{Parser, Subcommand};
use scan_pipeline::config::{ExtractionStrategy, ExtractorConfig, FilterConfig, ScanConfig};
use scan_pipeline::enhance;
use scan_pipeline::filters::grayscale::grayscale;
use scan_pipeline::filters::threshold::otsu_threshold;
use scan_pipeline::region::{RegionExtractor, binarize};
use scan_pipeline::scan::{FrameScheduler, ScanLoop, TickOutcome};
use scan_pipeline::source::{DecodeHints, Decoded};
use scan_pipeline::tools::{
    RecordingSurface, SequenceCamera, binary_stats, gray_stats, image_paths, load_rgba, save_rgba,
};
use scan_pipeline::{PixelBuffer, ScanError, SymbolDecoder};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "scantool", version, about = "Scan pipeline CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the filter chain on an image and write the result
    Filter {
        #[arg(long)]
        image: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        no_grayscale: bool,
        #[arg(long)]
        equalize: bool,
        #[arg(long)]
        no_invert: bool,
        /// Fixed threshold level; Otsu is used when omitted
        #[arg(long)]
        threshold: Option<u8>,
        /// Box blur radius; no blur when omitted
        #[arg(long)]
        blur: Option<u32>,
    },
    /// Print candidate regions found by contours or template matching
    Regions {
        #[arg(long)]
        image: PathBuf,
        /// Template image; contour extraction when omitted
        #[arg(long)]
        template: Option<PathBuf>,
        #[arg(long, default_value_t = 100)]
        min_size: u32,
    },
    /// Print gray-level and binarization statistics
    Stats {
        #[arg(long)]
        image: PathBuf,
    },
    /// Replay a directory of frames through the scan loop (SCAN_* env applies)
    Replay {
        #[arg(long)]
        frames: PathBuf,
        /// Write every buffer handed to the decoder here
        #[arg(long)]
        out: Option<PathBuf>,
        /// Extract square contours instead of decoding the whole crop
        #[arg(long)]
        contours: bool,
    },
}

/// Decoder stand-in that saves its input and reports a miss
struct SnapshotDump {
    out: Option<PathBuf>,
    written: usize,
}

impl SymbolDecoder for SnapshotDump {
    fn decode(
        &mut self,
        buffer: &PixelBuffer,
        _hints: &DecodeHints,
    ) -> scan_pipeline::Result<Decoded> {
        if let Some(dir) = &self.out {
            save_rgba(buffer, dir.join(format!("scan_{:04}.png", self.written)))?;
            self.written += 1;
        }
        Err(ScanError::NotFound)
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Filter {
            image,
            out,
            no_grayscale,
            equalize,
            no_invert,
            threshold,
            blur,
        } => {
            let config = FilterConfig {
                grayscale: !no_grayscale,
                equalize,
                invert_color: !no_invert,
                threshold: true,
                blur: blur.is_some(),
                blur_radius: blur.unwrap_or(0),
                threshold_value: threshold.unwrap_or(0),
                auto_threshold: threshold.is_none(),
                ..FilterConfig::default()
            };
            filter_cmd(&image, &out, &config)
        }
        Command::Regions {
            image,
            template,
            min_size,
        } => regions_cmd(&image, template.as_deref(), min_size),
        Command::Stats { image } => stats_cmd(&image),
        Command::Replay {
            frames,
            out,
            contours,
        } => replay_cmd(&frames, out, contours),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn filter_cmd(image: &Path, out: &Path, config: &FilterConfig) -> scan_pipeline::Result<()> {
    let mut buffer = load_rgba(image)?;
    println!("Image: {} ({}x{})", image.display(), buffer.width(), buffer.height());

    let start = Instant::now();
    let level = enhance(&mut buffer, config);
    println!(
        "Filtered in {:.2} ms, threshold={}",
        start.elapsed().as_secs_f64() * 1000.0,
        level
    );

    save_rgba(&buffer, out)?;
    println!("Wrote {}", out.display());
    Ok(())
}

fn regions_cmd(image: &Path, template: Option<&Path>, min_size: u32) -> scan_pipeline::Result<()> {
    let snapshot = load_rgba(image)?;
    println!("Image: {} ({}x{})", image.display(), snapshot.width(), snapshot.height());

    let strategy = match template {
        Some(path) => ExtractionStrategy::Template(load_rgba(path)?),
        None => ExtractionStrategy::Contours,
    };
    let extractor = RegionExtractor::new(ExtractorConfig {
        strategy,
        min_size,
        ..ExtractorConfig::default()
    });

    let start = Instant::now();
    let candidates = extractor.extract(&snapshot);
    println!(
        "Found {} candidates in {:.2} ms",
        candidates.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );
    for (i, c) in candidates.iter().enumerate() {
        let score = c
            .score
            .map(|s| format!(" score={s:.3}"))
            .unwrap_or_default();
        println!(
            "  Candidate {}: bounds=({}, {}) {}x{} origin=({}, {}) region={}x{}{}",
            i,
            c.bounds.x0,
            c.bounds.y0,
            c.bounds.width,
            c.bounds.height,
            c.origin.0,
            c.origin.1,
            c.region.width(),
            c.region.height(),
            score
        );
    }
    Ok(())
}

fn stats_cmd(image: &Path) -> scan_pipeline::Result<()> {
    let buffer = load_rgba(image)?;
    println!("Image: {} ({}x{})", image.display(), buffer.width(), buffer.height());

    let mut gray = buffer.clone();
    grayscale(&mut gray);
    let stats = gray_stats(&gray);
    println!(
        "Grayscale range: {}-{}, average: {}, levels: {}",
        stats.min, stats.max, stats.avg, stats.levels
    );
    println!("Otsu threshold: {}", otsu_threshold(&gray));

    let mask = binarize(&buffer, &ExtractorConfig::default());
    let binary = binary_stats(&mask);
    println!(
        "Binary: foreground={} total={} foreground_ratio={:.2}%",
        binary.foreground,
        binary.total_pixels,
        binary.foreground_ratio * 100.0
    );
    Ok(())
}

fn replay_cmd(frames_dir: &Path, out: Option<PathBuf>, contours: bool) -> scan_pipeline::Result<()> {
    let paths = image_paths(frames_dir)?;
    if paths.is_empty() {
        println!("No images in {}", frames_dir.display());
        return Ok(());
    }
    let frames = paths
        .iter()
        .map(load_rgba)
        .collect::<scan_pipeline::Result<Vec<_>>>()?;
    if let Some(dir) = &out {
        fs::create_dir_all(dir)?;
    }

    let mut config = ScanConfig::from_env();
    if contours {
        config.extractor.strategy = ExtractionStrategy::Contours;
    }
    let scheduler = FrameScheduler::from_config(&config);
    println!(
        "Replaying {} frames every {} ms, scan period {}",
        frames.len(),
        scheduler.interval().as_millis(),
        config.scan_period
    );

    let ticks = frames.len() as u64;
    let decoder = SnapshotDump { out, written: 0 };
    let mut scan = ScanLoop::new(
        config,
        SequenceCamera::new(frames),
        decoder,
        RecordingSurface::default(),
    );
    scan.start(None)?;

    let (mut captured, mut scanned, mut skipped) = (0usize, 0usize, 0usize);
    let start = Instant::now();
    scheduler.run(&mut scan, Some(ticks), |outcome| match outcome {
        TickOutcome::Captured => captured += 1,
        TickOutcome::NothingFound | TickOutcome::Decoded(_) => scanned += 1,
        TickOutcome::Skipped | TickOutcome::NoFrame => skipped += 1,
        TickOutcome::Idle => {}
    });
    scan.stop();

    println!(
        "Ran {} ticks in {:.2} ms: captured={} scanned={} skipped={}",
        ticks,
        start.elapsed().as_secs_f64() * 1000.0,
        captured,
        scanned,
        skipped
    );
    println!("Decoder inputs written: {}", scan.decoder().written);
    Ok(())
}
