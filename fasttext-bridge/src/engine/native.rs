//! fastText backend
//!
//! Wraps the `fasttext` crate, which builds and links the C++ library.

use std::path::Path;

use fasttext::{Args, FastText, LossName, ModelName};

use super::{Engine, Prediction};
use crate::args::{LossKind, ModelKind, TrainingArgs};
use crate::error::{BridgeError, Result};

/// The only metric the binding's argument object can carry
const DEFAULT_AUTOTUNE_METRIC: &str = "f1";

/// Engine backed by the C++ fastText library
pub struct FastTextEngine {
    inner: FastText,
    has_model: bool,
}

impl Default for FastTextEngine {
    fn default() -> Self {
        Self {
            inner: FastText::new(),
            has_model: false,
        }
    }
}

impl FastTextEngine {
    pub fn new() -> Self {
        Self::default()
    }

    fn require_model(&self, operation: &'static str) -> Result<()> {
        if self.has_model {
            Ok(())
        } else {
            Err(BridgeError::NotReady(operation))
        }
    }
}

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        BridgeError::invalid_argument(format!("path is not valid UTF-8: {}", path.display()))
    })
}

/// Copy parsed settings onto the engine's own argument object
fn to_engine_args(args: &TrainingArgs) -> Result<Args> {
    let mut out = Args::new();
    out.set_input(&args.input).map_err(BridgeError::engine)?;
    out.set_output(&args.output).map_err(BridgeError::engine)?;
    out.set_model(match args.model {
        ModelKind::Supervised => ModelName::SUP,
        ModelKind::Cbow => ModelName::CBOW,
        ModelKind::Skipgram => ModelName::SG,
    });
    out.set_loss(match args.loss {
        LossKind::HierarchicalSoftmax => LossName::HS,
        LossKind::NegativeSampling => LossName::NS,
        LossKind::Softmax => LossName::SOFTMAX,
        LossKind::OneVsAll => LossName::OVA,
    });
    out.set_lr(args.lr);
    out.set_lr_update_rate(args.lr_update_rate);
    out.set_dim(args.dim);
    out.set_ws(args.ws);
    out.set_epoch(args.epoch);
    out.set_min_count(args.min_count);
    out.set_min_count_label(args.min_count_label);
    out.set_neg(args.neg);
    out.set_word_ngrams(args.word_ngrams);
    out.set_bucket(args.bucket);
    out.set_minn(args.minn);
    out.set_maxn(args.maxn);
    out.set_thread(args.thread);
    // -t stays at the engine default; the binding only takes an integer
    out.set_label(&args.label).map_err(BridgeError::engine)?;
    out.set_verbose(args.verbose);
    out.set_pretrained_vectors(&args.pretrained_vectors)
        .map_err(BridgeError::engine)?;
    if args.has_autotune() {
        out.set_autotune_validation_file(&args.autotune_validation_file)
            .map_err(BridgeError::engine)?;
        out.set_autotune_duration(args.autotune_duration);
        out.set_autotune_predictions(args.autotune_predictions);
    }
    out.set_save_output(args.save_output);
    out.set_qout(args.qout);
    out.set_retrain(args.retrain);
    out.set_qnorm(args.qnorm);
    out.set_cutoff(args.cutoff);
    out.set_dsub(args.dsub);
    Ok(out)
}

impl Engine for FastTextEngine {
    fn load_model(&mut self, path: &Path) -> Result<()> {
        self.inner
            .load_model(path_str(path)?)
            .map_err(BridgeError::engine)?;
        self.has_model = true;
        log::debug!("fastText model loaded from {}", path.display());
        Ok(())
    }

    fn dimension(&self) -> usize {
        if !self.has_model {
            return 0;
        }
        self.inner.get_dimension().max(0) as usize
    }

    fn predict_line(&self, line: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>> {
        self.require_model("predict")?;
        let k = i32::try_from(k)
            .map_err(|_| BridgeError::invalid_argument(format!("k out of range: {}", k)))?;
        let predictions = self
            .inner
            .predict(line, k, threshold)
            .map_err(BridgeError::engine)?;
        Ok(predictions
            .into_iter()
            .map(|p| Prediction::new(p.label, p.prob))
            .collect())
    }

    fn sentence_vector(&self, line: &str) -> Result<Vec<f32>> {
        self.require_model("sentence vector")?;
        self.inner
            .get_sentence_vector(line)
            .map_err(BridgeError::engine)
    }

    fn save_model(&mut self, path: &Path) -> Result<()> {
        // Saving an empty C++ model dereferences null state
        self.require_model("save model")?;
        self.inner
            .save_model(path_str(path)?)
            .map_err(BridgeError::engine)
    }

    fn train(&mut self, args: &TrainingArgs) -> Result<()> {
        let engine_args = to_engine_args(args)?;
        self.inner.train(&engine_args).map_err(BridgeError::engine)?;
        self.has_model = true;
        Ok(())
    }

    fn supports(&self, args: &TrainingArgs) -> Result<()> {
        if !args.has_autotune() {
            return Ok(());
        }
        if args.autotune_metric != DEFAULT_AUTOTUNE_METRIC {
            return Err(BridgeError::invalid_argument(format!(
                "autotune metric `{}` cannot be set through this engine",
                args.autotune_metric
            )));
        }
        if args.autotune_model_size.is_bounded() {
            return Err(BridgeError::invalid_argument(
                "autotune model size cannot be set through this engine",
            ));
        }
        Ok(())
    }

    fn train_autotune(&mut self, args: &TrainingArgs) -> Result<()> {
        // The binding switches to the autotuner when a validation file is set
        self.train(args)
    }

    fn quantize(&mut self, args: &TrainingArgs) -> Result<()> {
        self.require_model("quantize")?;
        let engine_args = to_engine_args(args)?;
        self.inner
            .quantize(&engine_args)
            .map_err(BridgeError::engine)
    }

    fn save_vectors(&mut self, path: &Path) -> Result<()> {
        self.require_model("save vectors")?;
        self.inner
            .save_vectors(path_str(path)?)
            .map_err(BridgeError::engine)
    }

    fn save_output(&mut self, path: &Path) -> Result<()> {
        self.require_model("save output")?;
        self.inner
            .save_output(path_str(path)?)
            .map_err(BridgeError::engine)
    }
}
