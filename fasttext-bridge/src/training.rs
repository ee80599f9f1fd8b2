//! Training and quantization
//!
//! Both operations build a fresh engine per call and never touch a
//! [`ModelHandle`](crate::ModelHandle). Artifacts are named by appending an
//! extension to the caller's output base:
//!
//! - `<base>.bin` trained model (`<base>.ftz` when autotuned under a size budget)
//! - `<base>.vec` word vectors
//! - `<base>.output` output matrix, only when requested
//! - `<base>.ftz` quantized model
//!
//! Two calls sharing an output base race on these files.

use std::ffi::OsString;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::args::{quantize_argv, TrainingArgs, TrainingConfig};
use crate::config::artifacts;
use crate::engine::Engine;
use crate::error::{BridgeError, Result};

/// Files written by a training run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrainingArtifacts {
    pub model: PathBuf,
    pub vectors: PathBuf,
    pub output: Option<PathBuf>,
}

/// `<base>.<ext>`, keeping any dots already in `base`
pub fn artifact_path(base: impl AsRef<Path>, ext: &str) -> PathBuf {
    let mut raw = OsString::from(base.as_ref().as_os_str());
    raw.push(".");
    raw.push(ext);
    PathBuf::from(raw)
}

/// Create (or truncate) `path` and close it again.
fn ensure_creatable(path: &Path) -> Result<()> {
    File::create(path)
        .map(drop)
        .map_err(|e| BridgeError::write_error(path, e.to_string()))
}

/// Train a new model as described by `config` and persist its artifacts.
///
/// The destination model file is created before training starts, so an
/// unwritable destination fails immediately instead of after a long run. A
/// failure after that point can leave partial artifacts behind.
pub fn train<E: Engine + Default>(config: &TrainingConfig) -> Result<TrainingArtifacts> {
    let argv = config.to_argv()?;
    let args = TrainingArgs::parse(&argv)?;
    let base = Path::new(&args.output);

    let mut engine = E::default();
    engine.supports(&args)?;

    let model = if args.produces_quantized_model() {
        artifact_path(base, artifacts::QUANTIZED_EXT)
    } else {
        artifact_path(base, artifacts::MODEL_EXT)
    };
    ensure_creatable(&model)?;

    log::info!(
        "Training {} model from {} (epoch={}, wordNgrams={}, thread={}, lr={})",
        args.model,
        args.input,
        args.epoch,
        args.word_ngrams,
        args.thread,
        args.lr
    );

    if args.has_autotune() {
        log::info!(
            "Autotuning against {} for {}s",
            args.autotune_validation_file,
            args.autotune_duration
        );
        engine.train_autotune(&args)?;
    } else {
        engine.train(&args)?;
    }

    engine.save_model(&model)?;

    let vectors = artifact_path(base, artifacts::VECTORS_EXT);
    engine.save_vectors(&vectors)?;

    let output = if args.save_output {
        let path = artifact_path(base, artifacts::OUTPUT_EXT);
        engine.save_output(&path)?;
        Some(path)
    } else {
        None
    };

    log::info!("Training finished: {}", model.display());
    Ok(TrainingArtifacts {
        model,
        vectors,
        output,
    })
}

/// Quantize the model stored at `<output>.bin` into `<output>.ftz`.
///
/// `input` is rendered into the engine arguments but does not locate the model
/// to compress; the source is always derived from `output`.
pub fn quantize<E: Engine + Default>(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
) -> Result<PathBuf> {
    let argv = quantize_argv(input.as_ref(), output.as_ref())?;
    let args = TrainingArgs::parse(&argv)?;
    let base = Path::new(&args.output);

    let source = artifact_path(base, artifacts::MODEL_EXT);
    if !source.is_file() {
        return Err(BridgeError::not_found(&source));
    }
    if Path::new(&args.input) != source.as_path() {
        log::debug!(
            "Quantizing {} (input argument {} is not used to locate the model)",
            source.display(),
            args.input
        );
    }

    let mut engine = E::default();
    engine.load_model(&source)?;
    engine.quantize(&args)?;

    let target = artifact_path(base, artifacts::QUANTIZED_EXT);
    engine.save_model(&target)?;

    log::info!("Quantized model saved to {}", target.display());
    Ok(target)
}
