// SPDX-License-Identifier: MPL-2.0
use std::path::Path;
use std::process::ExitCode;

use anyhow::Context;
use photo_restore::cli::{self, Args, Command};
use photo_restore::config::{self, Settings, UPSCALER_NET_SCALE};
use photo_restore::infrastructure::{
    FaceRestoreOptions, HttpFetcher, OnnxFaceRestorer, OnnxUpscaler,
};
use photo_restore::paths::resolve_weights_dir;
use photo_restore::pipeline::{self, RunContext, RunSummary};
use photo_restore::provision;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = match cli::from_env() {
        Ok(Command::Run(args)) => args,
        Ok(Command::Help) => {
            print!("{}", cli::HELP);
            return ExitCode::SUCCESS;
        }
        Err(err) => {
            eprintln!("error: {err}\n\n{}", cli::HELP);
            return ExitCode::FAILURE;
        }
    };

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("photo_restore={log_level}").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match run(&args) {
        Ok(summary) if summary.is_success() => ExitCode::SUCCESS,
        Ok(summary) => {
            println!(
                "{} of {} images restored; failed:",
                summary.written(),
                summary.attempted()
            );
            for failure in &summary.failures {
                println!("  {}: {}", failure.input.display(), failure.error);
            }
            ExitCode::FAILURE
        }
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> anyhow::Result<RunSummary> {
    pipeline::prepare_output_dir(&args.restore).with_context(|| {
        format!(
            "failed to create output directory {}",
            args.restore.output_dir.display()
        )
    })?;
    let settings = load_settings(args.config_path.as_deref())?;
    let weights_dir = resolve_weights_dir(args.weights_dir.clone(), &settings);
    tracing::debug!(weights_dir = %weights_dir.display(), "resolved weights directory");

    let fetcher = HttpFetcher::new().context("failed to set up the model downloader")?;
    let (face_path, upscaler_path) =
        provision::ensure_weights_with(&weights_dir, &settings.models, &fetcher)
            .context("failed to provision model weights")?;
    let detector_path = provision::ensure_detector(&weights_dir, &settings.models, &fetcher)
        .context("failed to provision the face detector")?;

    let face_options = FaceRestoreOptions::from(settings.face);
    let face = OnnxFaceRestorer::load(&face_path, &detector_path, face_options)
        .context("failed to load the face restoration model")?;
    let upscaler = OnnxUpscaler::load(&upscaler_path, UPSCALER_NET_SCALE)
        .context("failed to load the upscaling model")?;
    let mut ctx = RunContext::new(Box::new(face), Box::new(upscaler));

    pipeline::run(&args.restore, &mut ctx).with_context(|| {
        format!(
            "restoration of {} failed",
            args.restore.input_dir.display()
        )
    })
}

fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    match explicit {
        Some(path) => config::load_from_path(path)
            .with_context(|| format!("failed to read settings from {}", path.display())),
        None => config::load().context("failed to read the settings file"),
    }
}
