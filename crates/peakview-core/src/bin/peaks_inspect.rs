//! Peak data inspector
//!
//! Prints header, duration and window statistics for a peak file (`.dat` or
//! `.json`) or for an audio file run through the decode bridge.
//!
//! ```text
//! peaks-inspect <FILE> [--offset START END] [--resample SCALE | --width BLOCKS]
//!                      [--out FILE] [--config FILE]
//! ```
//!
//! `--out` writes the (resampled) peaks as JSON when the name ends in `.json`
//! and in the binary layout otherwise. Set `RUST_LOG=debug` for timings.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

use peakview_core::builder::{build_waveform_async, SymphoniaDecoder};
use peakview_core::config::{default_config_path, load_config, PeaksConfig};
use peakview_core::{Resample, Waveform, WaveformAdapter};

#[derive(Debug, Default)]
struct Args {
    input: PathBuf,
    offset: Option<(usize, usize)>,
    resample: Option<Resample>,
    out: Option<PathBuf>,
    config: Option<PathBuf>,
}

fn parse_args() -> Result<Args> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args::default();
    let mut input = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--offset" => {
                let start = next_number(&mut args, "--offset START")?;
                let end = next_number(&mut args, "--offset END")?;
                parsed.offset = Some((start, end));
            }
            "--resample" => {
                parsed.resample = Some(Resample::scale(next_number(&mut args, "--resample")?));
            }
            "--width" => {
                parsed.resample = Some(Resample::width(next_number(&mut args, "--width")?));
            }
            "--out" => parsed.out = Some(next_path(&mut args, "--out")?),
            "--config" => parsed.config = Some(next_path(&mut args, "--config")?),
            "-h" | "--help" => {
                println!("Usage: peaks-inspect <FILE> [--offset START END] [--resample SCALE | --width BLOCKS] [--out FILE] [--config FILE]");
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => {
                if input.replace(PathBuf::from(other)).is_some() {
                    bail!("Only one input file may be given");
                }
            }
        }
    }

    parsed.input = input.context("Missing input file (see --help)")?;
    Ok(parsed)
}

fn next_number<T: std::str::FromStr>(args: &mut impl Iterator<Item = String>, name: &str) -> Result<T> {
    let value = args.next().with_context(|| format!("{} expects a value", name))?;
    value
        .parse()
        .map_err(|_| anyhow::anyhow!("{} expects a number, got {:?}", name, value))
}

fn next_path(args: &mut impl Iterator<Item = String>, name: &str) -> Result<PathBuf> {
    args.next()
        .map(PathBuf::from)
        .with_context(|| format!("{} expects a path", name))
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
}

fn load_waveform(path: &Path, config: &PeaksConfig) -> Result<Waveform> {
    match extension(path).as_deref() {
        Some("dat") | Some("json") => {
            Waveform::from_file(path).with_context(|| format!("Failed to load peaks from {:?}", path))
        }
        ext => {
            log::info!("Building peaks from audio file {:?}", path);
            let bytes = std::fs::read(path).with_context(|| format!("Failed to read {:?}", path))?;
            let decoder = match ext {
                Some(ext) => SymphoniaDecoder::with_extension(ext),
                None => SymphoniaDecoder::new(),
            };
            let rx = build_waveform_async(&decoder, bytes, config.build.clone());
            let waveform = rx
                .blocking_recv()
                .context("Decoder dropped the request")?
                .with_context(|| format!("Failed to build peaks from {:?}", path))?;
            Ok(waveform)
        }
    }
}

fn print_summary(waveform: &Waveform) {
    let adapter = waveform.adapter();
    let min = waveform.min().into_iter().min().unwrap_or(0);
    let max = waveform.max().into_iter().max().unwrap_or(0);

    println!("format:        {} (version {}, {}-bit)", adapter.kind(), adapter.version(), adapter.bit_depth().bits());
    println!("sample rate:   {} Hz", waveform.sample_rate());
    println!("scale:         {} samples/block", waveform.scale());
    println!("length:        {} blocks", waveform.length());
    println!("duration:      {:.3} s", waveform.duration());
    println!(
        "window:        [{}, {}) = {} blocks, {:.3} s",
        waveform.offset_start(),
        waveform.offset_end(),
        waveform.offset_length(),
        waveform.offset_duration()
    );
    println!("window peaks:  min {} / max {}", min, max);
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let args = parse_args()?;

    let config_path = args
        .config
        .clone()
        .unwrap_or_else(|| default_config_path("config.yaml"));
    let config: PeaksConfig = load_config(&config_path);
    config.validate().context("Invalid configuration")?;

    let mut waveform = load_waveform(&args.input, &config)?;

    if let Some(request) = args.resample {
        waveform = waveform.resample(request).context("Resample failed")?;
    }

    if let Some((start, end)) = args.offset {
        waveform.set_offset(start, end).context("Invalid --offset")?;
    }

    print_summary(&waveform);

    if let Some(out) = &args.out {
        match extension(out).as_deref() {
            Some("json") => std::fs::write(out, waveform.to_json()?),
            _ => std::fs::write(out, waveform.to_binary()),
        }
        .with_context(|| format!("Failed to write {:?}", out))?;
        log::info!("Wrote peaks to {:?}", out);
    }

    Ok(())
}
