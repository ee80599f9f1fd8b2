//! Recording engine for tests
//!
//! Model files are tiny text files (`dim=<n>` plus a `quantized` marker line),
//! so tests can check what the bridge persisted without a real model.

use std::cell::RefCell;
use std::fs;
use std::path::Path;

use super::{Engine, Prediction};
use crate::args::TrainingArgs;
use crate::error::{BridgeError, Result};

pub(crate) const FIXTURE_DIMENSION: usize = 100;

/// What the most recent training call on this thread received
#[derive(Debug, Clone)]
pub(crate) struct TrainingRecord {
    pub args: TrainingArgs,
    pub autotuned: bool,
}

thread_local! {
    static LAST_TRAINING: RefCell<Option<TrainingRecord>> = const { RefCell::new(None) };
}

#[derive(Debug, Default)]
pub(crate) struct MockEngine {
    pub dimension: usize,
    pub loaded: bool,
    pub quantized: bool,
    pub load_count: usize,
    /// Ranked labels returned by `predict_line`
    pub ranking: Vec<Prediction>,
    /// Forces `sentence_vector` to return this many values
    pub vector_len: Option<usize>,
    /// Every line received by predict/vector calls
    pub lines: RefCell<Vec<String>>,
}

impl MockEngine {
    pub fn with_ranking(ranking: Vec<Prediction>) -> Self {
        Self {
            ranking,
            ..Default::default()
        }
    }

    /// Write a model fixture that this engine can load
    pub fn write_fixture(path: &Path, dimension: usize) {
        fs::write(path, format!("dim={}\n", dimension)).unwrap();
    }

    /// Training engines are built and dropped inside `train`, so the record
    /// outlives them
    pub fn last_training() -> Option<TrainingRecord> {
        LAST_TRAINING.with(|record| record.borrow().clone())
    }

    fn record_training(args: &TrainingArgs, autotuned: bool) {
        LAST_TRAINING.with(|record| {
            *record.borrow_mut() = Some(TrainingRecord {
                args: args.clone(),
                autotuned,
            })
        });
    }

    fn fit(&mut self, args: &TrainingArgs) -> Result<()> {
        if !Path::new(&args.input).is_file() {
            return Err(BridgeError::engine(format!(
                "{} cannot be opened for training",
                args.input
            )));
        }
        self.dimension = args.dim as usize;
        self.loaded = true;
        Ok(())
    }

    pub fn received_lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    fn contents(&self) -> String {
        let mut out = format!("dim={}\n", self.dimension);
        if self.quantized {
            out.push_str("quantized\n");
        }
        out
    }
}

impl Engine for MockEngine {
    fn load_model(&mut self, path: &Path) -> Result<()> {
        let raw = fs::read_to_string(path)?;
        let dimension = raw
            .lines()
            .find_map(|l| l.strip_prefix("dim="))
            .and_then(|d| d.parse().ok())
            .ok_or_else(|| BridgeError::engine("not a model file"))?;
        self.dimension = dimension;
        self.quantized = raw.lines().any(|l| l == "quantized");
        self.loaded = true;
        self.load_count += 1;
        Ok(())
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn predict_line(&self, line: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>> {
        self.lines.borrow_mut().push(line.to_string());
        Ok(self
            .ranking
            .iter()
            .filter(|p| p.probability >= threshold)
            .take(k)
            .cloned()
            .collect())
    }

    fn sentence_vector(&self, line: &str) -> Result<Vec<f32>> {
        self.lines.borrow_mut().push(line.to_string());
        let len = self.vector_len.unwrap_or(self.dimension);
        Ok((0..len).map(|i| i as f32 * 0.5).collect())
    }

    fn save_model(&mut self, path: &Path) -> Result<()> {
        fs::write(path, self.contents())?;
        Ok(())
    }

    fn train(&mut self, args: &TrainingArgs) -> Result<()> {
        self.fit(args)?;
        Self::record_training(args, false);
        Ok(())
    }

    fn train_autotune(&mut self, args: &TrainingArgs) -> Result<()> {
        self.fit(args)?;
        Self::record_training(args, true);
        self.quantized = args.produces_quantized_model();
        Ok(())
    }

    fn quantize(&mut self, _args: &TrainingArgs) -> Result<()> {
        if !self.loaded {
            return Err(BridgeError::engine("nothing to quantize"));
        }
        self.quantized = true;
        Ok(())
    }

    fn save_vectors(&mut self, path: &Path) -> Result<()> {
        fs::write(path, format!("0 {}\n", self.dimension))?;
        Ok(())
    }

    fn save_output(&mut self, path: &Path) -> Result<()> {
        fs::write(path, format!("0 {}\n", self.dimension))?;
        Ok(())
    }
}
