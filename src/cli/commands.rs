//! CLI Command Implementations
//!
//! The driver: load → transform → validate → save, with each stage's
//! failure reported as such. Nothing is written to the output path unless
//! every stage succeeds.

use std::path::Path;

use anyhow::{Context, Result};
use log::{info, warn};

use crate::cli::{ProcessArgs, RawArgs, ToneArgs};
use crate::config::PipelineConfig;
use crate::engine::{
    generate_test_tone, inspect, power_to_db, read_audio, validate, write_audio, OverflowPolicy,
    SampleWidth,
};

/// Assemble the pipeline from an optional config file plus CLI overrides
pub fn build_config(args: &ProcessArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("config: failed to load {}", path.display()))?,
        None => PipelineConfig::default(),
    };

    config.transforms.extend(args.transforms.iter().cloned());
    if args.clamp {
        config.overflow = OverflowPolicy::Clamp;
    }
    if args.out_width.is_some() {
        config.output_width = args.out_width;
    }

    Ok(config)
}

/// Run one file through the pipeline
pub fn process(args: &ProcessArgs) -> Result<()> {
    let config = build_config(args)?;
    let raw_format = args.raw.format().context("config: invalid raw input format")?;

    info!("Reading {}", args.input.display());
    let decoded = read_audio(&args.input, raw_format.as_ref())
        .with_context(|| format!("decode: failed to read {}", args.input.display()))?;

    let chain = config.build_chain();
    if chain.is_empty() {
        warn!("No transforms given; output will be a re-encoded copy of the input");
    }

    info!("Processing...");
    let output = chain
        .apply(&decoded.buffer, decoded.sample_rate)
        .context("transform: processing failed")?;

    validate(&output).context("validate: transform output cannot be encoded")?;

    let width = config.output_width(decoded.sample_width)?;
    write_audio(
        &args.output,
        &output,
        decoded.sample_rate,
        width,
        config.overflow,
    )
    .with_context(|| format!("encode: failed to write {}", args.output.display()))?;

    info!("Done: {}", args.output.display());
    Ok(())
}

/// Print the format and level of an audio file
pub fn show_info(input: &Path, raw: &RawArgs) -> Result<()> {
    let raw_format = raw.format().context("config: invalid raw input format")?;
    let decoded = read_audio(input, raw_format.as_ref())
        .with_context(|| format!("decode: failed to read {}", input.display()))?;

    let format = decoded.format();
    let report = inspect(&decoded.buffer);
    let peak = decoded.buffer.peak();

    println!("File: {}", input.display());
    println!("{:-<60}", "");
    println!("Channels:     {}", format.channels);
    println!("Sample width: {} byte(s) ({})", format.sample_width.bytes(), format.sample_width);
    println!("Sample rate:  {} Hz", format.sample_rate);
    println!("Frames:       {}", decoded.frames());
    println!(
        "Duration:     {:.3} s",
        decoded.buffer.duration_secs(format.sample_rate)
    );
    println!("Peak:         {:.6} ({:.2} dB)", peak, power_to_db(peak));
    println!("{:-<60}", "");
    if report.is_valid() {
        println!("Valid for encoding");
    } else {
        println!("Invalid: {}", report.failed_checks().join(", "));
    }

    Ok(())
}

/// Write a sine test tone
pub fn tone(args: &ToneArgs) -> Result<()> {
    let width = SampleWidth::new(args.width)?;
    let buffer = generate_test_tone(
        args.frequency,
        args.amplitude,
        args.duration,
        args.rate,
        args.channels,
    );

    write_audio(&args.output, &buffer, args.rate, width, OverflowPolicy::Fail)
        .with_context(|| format!("encode: failed to write {}", args.output.display()))?;

    info!(
        "Wrote {} Hz tone ({} s) to {}",
        args.frequency,
        args.duration,
        args.output.display()
    );
    Ok(())
}
