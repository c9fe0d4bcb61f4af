// SPDX-License-Identifier: MPL-2.0
//! Batch restoration pipeline.
//!
//! Every input found by [`scan_inputs`] goes through the same straight line:
//! load, denoise, face restoration, colour correction, upscale, sharpen, write.
//! A file that fails at any step is recorded in the [`RunSummary`] and the run
//! moves on to the next one. Nothing is retried and nothing is rolled back.
//!
//! Progress lines are printed to stdout; diagnostics go through `tracing`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::application::port::{EngineError, FaceRestorer, Upscaler};
use crate::config::{
    RestoreConfig, COLOUR_CORRECTION_STRENGTH, OUTPUT_JPEG_QUALITY,
    RECOMMENDED_MAX_DENOISE_STRENGTH,
};
use crate::directory_scanner::scan_inputs;
use crate::error::{Error, Result, Stage};
use crate::media::{self, Frame};

/// The engines of one run, built once and used for every file.
pub struct RunContext {
    pub face: Box<dyn FaceRestorer>,
    pub upscaler: Box<dyn Upscaler>,
}

impl RunContext {
    #[must_use]
    pub fn new(face: Box<dyn FaceRestorer>, upscaler: Box<dyn Upscaler>) -> Self {
        Self { face, upscaler }
    }
}

/// An input that could not be restored.
#[derive(Debug)]
pub struct FileFailure {
    pub input: PathBuf,
    pub error: Error,
}

/// Outcome of a run.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Paths written, in processing order.
    pub outputs: Vec<PathBuf>,
    /// Inputs that were skipped, in processing order.
    pub failures: Vec<FileFailure>,
}

impl RunSummary {
    /// Number of images written.
    #[must_use]
    pub fn written(&self) -> usize {
        self.outputs.len()
    }

    /// Number of inputs attempted.
    #[must_use]
    pub fn attempted(&self) -> usize {
        self.outputs.len() + self.failures.len()
    }

    /// `true` when no input failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Restores every supported image in `config.input_dir`.
///
/// # Errors
///
/// Returns an error only for run-level problems: the output directory cannot
/// be created or the input directory cannot be read. Per-file failures are
/// reported in the summary instead.
pub fn run(config: &RestoreConfig, ctx: &mut RunContext) -> Result<RunSummary> {
    prepare_output_dir(config)?;
    if !config.denoise.is_recommended() {
        tracing::warn!(
            denoise = config.denoise.value(),
            max_recommended = RECOMMENDED_MAX_DENOISE_STRENGTH,
            "denoise strength above the recommended range, fine detail may be lost"
        );
    }

    let inputs = scan_inputs(&config.input_dir)?;
    let mut summary = RunSummary::default();
    if inputs.is_empty() {
        println!("No input images found.");
        return Ok(summary);
    }

    tracing::info!(
        inputs = inputs.len(),
        scale = %config.scale,
        denoise = config.denoise.value(),
        colour = config.colour.is_enabled(),
        face_engine = ctx.face.capabilities().name,
        upscaler = ctx.upscaler.capabilities().name,
        net_scale = ?ctx.upscaler.capabilities().scale_factor,
        "starting run"
    );

    for input in inputs {
        println!("Processing: {}", input.display());
        match process_file(&input, config, ctx) {
            Ok(output) => {
                println!("Saved -> {}", output.display());
                summary.outputs.push(output);
            }
            Err(error) => {
                tracing::error!(input = %input.display(), %error, "skipping file");
                summary.failures.push(FileFailure { input, error });
            }
        }
    }

    tracing::info!(
        written = summary.written(),
        failed = summary.failures.len(),
        "run finished"
    );
    Ok(summary)
}

/// Creates `config.output_dir` if it does not exist yet.
///
/// # Errors
///
/// Returns [`Error::Io`] if the directory cannot be created, for example when
/// the path names an existing file.
pub fn prepare_output_dir(config: &RestoreConfig) -> Result<()> {
    fs::create_dir_all(&config.output_dir)?;
    Ok(())
}

/// Restores a single input file and writes the result.
///
/// Returns the path written.
///
/// # Errors
///
/// Returns [`Error::Decode`], [`Error::Inference`] or [`Error::EncodeWrite`]
/// for the step that failed.
pub fn process_file(input: &Path, config: &RestoreConfig, ctx: &mut RunContext) -> Result<PathBuf> {
    let started = Instant::now();
    let frame = media::load_frame(input)?;
    let restored = restore_frame(frame, config, ctx)?;

    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let output = config.output_dir.join(config.output_file_name(&stem));
    media::save_jpeg(&restored, &output, OUTPUT_JPEG_QUALITY)?;

    tracing::debug!(
        input = %input.display(),
        elapsed_ms = started.elapsed().as_millis(),
        "file restored"
    );
    Ok(output)
}

/// Runs the in-memory steps on one decoded frame.
///
/// # Errors
///
/// Returns [`Error::Inference`] if an engine fails or breaks its size contract.
pub fn restore_frame(frame: Frame, config: &RestoreConfig, ctx: &mut RunContext) -> Result<Frame> {
    let (width, height) = frame.dimensions();

    let frame = if config.denoise.is_enabled() {
        media::denoise(&frame, config.denoise)
    } else {
        frame
    };

    let frame = ctx.face.restore(&frame).map_err(|source| Error::Inference {
        stage: Stage::FaceRestoration,
        source,
    })?;
    expect_dimensions(&frame, width, height, Stage::FaceRestoration)?;

    let frame = if config.colour.is_enabled() {
        media::correct_colour(&frame, COLOUR_CORRECTION_STRENGTH)
    } else {
        frame
    };

    let outscale = config.scale.factor();
    let frame = ctx
        .upscaler
        .upscale(&frame, outscale)
        .map_err(|source| Error::Inference {
            stage: Stage::Upscale,
            source,
        })?;
    expect_dimensions(&frame, width * outscale, height * outscale, Stage::Upscale)?;

    Ok(media::unsharp_mask(&frame))
}

fn expect_dimensions(frame: &Frame, width: u32, height: u32, stage: Stage) -> Result<()> {
    if frame.dimensions() == (width, height) {
        return Ok(());
    }
    Err(Error::Inference {
        stage,
        source: EngineError::PostprocessingFailed(format!(
            "expected {width}x{height} output, got {}x{}",
            frame.width(),
            frame.height()
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::port::ProcessorCapabilities;
    use crate::config::{ColourMode, DenoiseStrength, Scale};
    use image_rs::{imageops, Rgb};
    use tempfile::tempdir;

    struct Identity;

    impl FaceRestorer for Identity {
        fn restore(&mut self, frame: &Frame) -> std::result::Result<Frame, EngineError> {
            Ok(frame.clone())
        }

        fn capabilities(&self) -> ProcessorCapabilities {
            ProcessorCapabilities::new("identity")
        }
    }

    struct Nearest;

    impl Upscaler for Nearest {
        fn upscale(&mut self, frame: &Frame, outscale: u32) -> std::result::Result<Frame, EngineError> {
            Ok(imageops::resize(
                frame,
                frame.width() * outscale,
                frame.height() * outscale,
                imageops::FilterType::Nearest,
            ))
        }

        fn capabilities(&self) -> ProcessorCapabilities {
            ProcessorCapabilities::upscaler("nearest", 1)
        }
    }

    /// Upscaler that ignores the requested factor.
    struct Broken;

    impl Upscaler for Broken {
        fn upscale(&mut self, frame: &Frame, _: u32) -> std::result::Result<Frame, EngineError> {
            Ok(frame.clone())
        }

        fn capabilities(&self) -> ProcessorCapabilities {
            ProcessorCapabilities::upscaler("broken", 1)
        }
    }

    struct Failing;

    impl FaceRestorer for Failing {
        fn restore(&mut self, _: &Frame) -> std::result::Result<Frame, EngineError> {
            Err(EngineError::InferenceFailed("no session".to_string()))
        }

        fn capabilities(&self) -> ProcessorCapabilities {
            ProcessorCapabilities::new("failing")
        }
    }

    fn plain_config(scale: Scale) -> RestoreConfig {
        RestoreConfig {
            scale,
            denoise: DenoiseStrength::OFF,
            colour: ColourMode::No,
            ..RestoreConfig::new("in", "out")
        }
    }

    #[test]
    fn restore_frame_scales_by_requested_factor() {
        let mut ctx = RunContext::new(Box::new(Identity), Box::new(Nearest));
        let frame = Frame::from_pixel(6, 4, Rgb([120, 120, 120]));

        let out = restore_frame(frame, &plain_config(Scale::X4), &mut ctx).expect("restore");
        assert_eq!(out.dimensions(), (24, 16));
    }

    #[test]
    fn flat_frame_survives_every_step() {
        let mut ctx = RunContext::new(Box::new(Identity), Box::new(Nearest));
        let config = RestoreConfig {
            scale: Scale::X2,
            ..RestoreConfig::new("in", "out")
        };
        let frame = Frame::from_pixel(8, 8, Rgb([128, 128, 128]));

        let out = restore_frame(frame, &config, &mut ctx).expect("restore");
        for pixel in out.pixels() {
            for c in 0..3 {
                assert!((i32::from(pixel[c]) - 128).abs() <= 3);
            }
        }
    }

    #[test]
    fn engine_failure_is_tagged_with_stage() {
        let mut ctx = RunContext::new(Box::new(Failing), Box::new(Nearest));
        let result = restore_frame(Frame::new(4, 4), &plain_config(Scale::X2), &mut ctx);
        assert!(matches!(
            result,
            Err(Error::Inference {
                stage: Stage::FaceRestoration,
                ..
            })
        ));
    }

    #[test]
    fn wrong_upscale_size_is_an_inference_error() {
        let mut ctx = RunContext::new(Box::new(Identity), Box::new(Broken));
        let result = restore_frame(Frame::new(4, 4), &plain_config(Scale::X2), &mut ctx);
        assert!(matches!(
            result,
            Err(Error::Inference {
                stage: Stage::Upscale,
                ..
            })
        ));
    }

    #[test]
    fn run_records_failures_and_continues() {
        let dir = tempdir().expect("tempdir");
        let input_dir = dir.path().join("in");
        fs::create_dir(&input_dir).expect("mkdir");
        fs::write(input_dir.join("a_broken.jpg"), b"not an image").expect("write");
        Frame::from_pixel(5, 5, Rgb([90, 90, 90]))
            .save(input_dir.join("b_good.png"))
            .expect("write png");

        let config = RestoreConfig {
            input_dir,
            output_dir: dir.path().join("out"),
            ..plain_config(Scale::X2)
        };
        let mut ctx = RunContext::new(Box::new(Identity), Box::new(Nearest));
        let summary = run(&config, &mut ctx).expect("run");

        assert_eq!(summary.written(), 1);
        assert_eq!(summary.attempted(), 2);
        assert!(!summary.is_success());
        assert!(matches!(summary.failures[0].error, Error::Decode { .. }));
        assert!(config.output_dir.join("b_good_restored_x2.jpg").is_file());
    }

    #[test]
    fn prepare_output_dir_creates_nested_directories() {
        let dir = tempdir().expect("tempdir");
        let config = RestoreConfig {
            output_dir: dir.path().join("a").join("b"),
            ..plain_config(Scale::X2)
        };
        prepare_output_dir(&config).expect("create");
        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn output_path_naming_a_file_fails_before_any_engine_runs() {
        let dir = tempdir().expect("tempdir");
        let input_dir = dir.path().join("in");
        fs::create_dir(&input_dir).expect("mkdir");
        Frame::from_pixel(5, 5, Rgb([90, 90, 90]))
            .save(input_dir.join("a.png"))
            .expect("write png");
        let blocker = dir.path().join("out");
        fs::write(&blocker, b"occupied").expect("write");

        let config = RestoreConfig {
            input_dir,
            output_dir: blocker,
            ..plain_config(Scale::X2)
        };
        assert!(matches!(prepare_output_dir(&config), Err(Error::Io(_))));

        let mut ctx = RunContext::new(Box::new(Failing), Box::new(Broken));
        assert!(matches!(run(&config, &mut ctx), Err(Error::Io(_))));
    }

    #[test]
    fn denoise_above_recommended_range_still_runs() {
        let dir = tempdir().expect("tempdir");
        let input_dir = dir.path().join("in");
        fs::create_dir(&input_dir).expect("mkdir");
        Frame::from_pixel(6, 6, Rgb([120, 110, 100]))
            .save(input_dir.join("a.png"))
            .expect("write png");

        let config = RestoreConfig {
            input_dir,
            output_dir: dir.path().join("out"),
            denoise: DenoiseStrength::new(RECOMMENDED_MAX_DENOISE_STRENGTH + 5),
            ..plain_config(Scale::X2)
        };
        assert!(!config.denoise.is_recommended());

        let mut ctx = RunContext::new(Box::new(Identity), Box::new(Nearest));
        let summary = run(&config, &mut ctx).expect("run");
        assert_eq!(summary.written(), 1);
        assert!(summary.is_success());
    }

    #[test]
    fn empty_summary_is_success() {
        let summary = RunSummary::default();
        assert_eq!(summary.written(), 0);
        assert!(summary.is_success());
    }
}
