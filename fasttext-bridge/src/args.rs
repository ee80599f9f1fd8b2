//! Training arguments
//!
//! The engine is driven through its own command-line grammar: a training
//! request is rendered into a positional argument list (`fasttext supervised
//! -input ... -lr 0.100000`) and parsed back into [`TrainingArgs`], which
//! carries every hyperparameter together with the engine's implicit defaults.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config;
use crate::error::{BridgeError, Result};

/// Model architecture to train
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Text classifier
    Supervised,
    /// Continuous bag of words embeddings
    Cbow,
    /// Skip-gram embeddings
    Skipgram,
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Supervised => "supervised",
            Self::Cbow => "cbow",
            Self::Skipgram => "skipgram",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "supervised" => Ok(Self::Supervised),
            "cbow" => Ok(Self::Cbow),
            "skipgram" => Ok(Self::Skipgram),
            other => Err(BridgeError::invalid_argument(format!(
                "unknown model kind `{}` (expected supervised, cbow or skipgram)",
                other
            ))),
        }
    }
}

/// Loss function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LossKind {
    HierarchicalSoftmax,
    NegativeSampling,
    Softmax,
    OneVsAll,
}

impl FromStr for LossKind {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "hs" => Ok(Self::HierarchicalSoftmax),
            "ns" => Ok(Self::NegativeSampling),
            "softmax" => Ok(Self::Softmax),
            "one-vs-all" | "ova" => Ok(Self::OneVsAll),
            other => Err(BridgeError::invalid_argument(format!("unknown loss `{}`", other))),
        }
    }
}

/// Size budget for autotuned models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelSize {
    Unlimited,
    Bytes(u64),
}

impl ModelSize {
    pub fn is_bounded(&self) -> bool {
        matches!(self, Self::Bytes(_))
    }
}

impl FromStr for ModelSize {
    type Err = BridgeError;

    /// Parses `"2M"`, `"500K"`, `"1G"` or a plain byte count. Units are decimal.
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Ok(Self::Unlimited);
        }
        let (digits, multiplier) = match s.chars().last() {
            Some('k' | 'K') => (&s[..s.len() - 1], 1_000),
            Some('m' | 'M') => (&s[..s.len() - 1], 1_000_000),
            Some('g' | 'G') => (&s[..s.len() - 1], 1_000_000_000),
            _ => (s, 1),
        };
        let size: u64 = digits.parse().map_err(|_| {
            BridgeError::invalid_argument(format!("unable to parse model size {}", s))
        })?;
        size.checked_mul(multiplier)
            .map(Self::Bytes)
            .ok_or_else(|| {
                BridgeError::invalid_argument(format!("model size {} is too large", s))
            })
    }
}

/// Automatic hyperparameter search settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutotuneConfig {
    /// Labelled file the search is scored against
    pub validation_file: PathBuf,
    /// Upper bound such as `"2M"`; a bounded size produces a quantized `.ftz`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_size: Option<String>,
    /// Search budget in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
    /// Metric to optimize, e.g. `f1` or `f1:__label__spam`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric: Option<String>,
}

/// A training request as issued by a caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub kind: ModelKind,
    pub input: PathBuf,
    /// Output base; extensions are appended per artifact
    pub output: PathBuf,
    pub epoch: i32,
    pub word_ngrams: i32,
    pub thread: i32,
    pub lr: f32,
    /// Also persist the output matrix to `<output>.output`
    pub save_output: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub autotune: Option<AutotuneConfig>,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            kind: ModelKind::Supervised,
            input: PathBuf::new(),
            output: PathBuf::new(),
            epoch: 5,
            word_ngrams: 1,
            thread: 12,
            lr: 0.1,
            save_output: false,
            autotune: None,
        }
    }
}

impl TrainingConfig {
    pub fn new(kind: ModelKind, input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            input: input.into(),
            output: output.into(),
            ..Default::default()
        }
    }

    pub fn epoch(mut self, epoch: i32) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn word_ngrams(mut self, word_ngrams: i32) -> Self {
        self.word_ngrams = word_ngrams;
        self
    }

    pub fn thread(mut self, thread: i32) -> Self {
        self.thread = thread;
        self
    }

    pub fn lr(mut self, lr: f32) -> Self {
        self.lr = lr;
        self
    }

    pub fn save_output(mut self, save_output: bool) -> Self {
        self.save_output = save_output;
        self
    }

    pub fn autotune(mut self, autotune: AutotuneConfig) -> Self {
        self.autotune = Some(autotune);
        self
    }

    /// Load a configuration from a JSON file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(BridgeError::not_found(path));
        }
        let raw = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Render the engine argument list for this request
    pub fn to_argv(&self) -> Result<Vec<String>> {
        let mut argv = vec![
            config::args::PROGRAM_NAME.to_string(),
            self.kind.as_str().to_string(),
            "-input".to_string(),
            path_arg(&self.input)?,
            "-output".to_string(),
            path_arg(&self.output)?,
            "-epoch".to_string(),
            self.epoch.to_string(),
            "-wordNgrams".to_string(),
            self.word_ngrams.to_string(),
            "-thread".to_string(),
            self.thread.to_string(),
            "-lr".to_string(),
            format!("{:.*}", config::args::LR_PRECISION, f64::from(self.lr)),
        ];

        if self.save_output {
            argv.push("-saveOutput".to_string());
        }

        if let Some(autotune) = &self.autotune {
            argv.push("-autotune-validation".to_string());
            argv.push(path_arg(&autotune.validation_file)?);
            if let Some(size) = &autotune.model_size {
                argv.push("-autotune-modelsize".to_string());
                argv.push(size.clone());
            }
            if let Some(duration) = autotune.duration_secs {
                argv.push("-autotune-duration".to_string());
                argv.push(duration.to_string());
            }
            if let Some(metric) = &autotune.metric {
                argv.push("-autotune-metric".to_string());
                argv.push(metric.clone());
            }
        }

        Ok(argv)
    }
}

/// Argument list for quantizing the model stored under `output`
pub fn quantize_argv(input: &Path, output: &Path) -> Result<Vec<String>> {
    Ok(vec![
        config::args::PROGRAM_NAME.to_string(),
        config::args::QUANTIZE_COMMAND.to_string(),
        "-input".to_string(),
        path_arg(input)?,
        "-output".to_string(),
        path_arg(output)?,
    ])
}

fn path_arg(path: &Path) -> Result<String> {
    path.to_str().map(str::to_string).ok_or_else(|| {
        BridgeError::invalid_argument(format!("path is not valid UTF-8: {}", path.display()))
    })
}

/// Engine command named in `argv[1]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Train(ModelKind),
    Quantize,
}

/// Parsed engine settings
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingArgs {
    pub command: Command,
    pub model: ModelKind,
    pub input: String,
    pub output: String,
    pub lr: f64,
    pub lr_update_rate: i32,
    pub dim: i32,
    pub ws: i32,
    pub epoch: i32,
    pub min_count: i32,
    pub min_count_label: i32,
    pub neg: i32,
    pub word_ngrams: i32,
    pub loss: LossKind,
    pub bucket: i32,
    pub minn: i32,
    pub maxn: i32,
    pub thread: i32,
    pub t: f64,
    pub label: String,
    pub verbose: i32,
    pub pretrained_vectors: String,
    pub save_output: bool,
    pub seed: i32,
    pub qout: bool,
    pub retrain: bool,
    pub qnorm: bool,
    pub cutoff: usize,
    pub dsub: usize,
    pub autotune_validation_file: String,
    pub autotune_metric: String,
    pub autotune_predictions: i32,
    pub autotune_duration: i32,
    pub autotune_model_size: ModelSize,
}

impl Default for TrainingArgs {
    fn default() -> Self {
        Self {
            command: Command::Train(ModelKind::Skipgram),
            model: ModelKind::Skipgram,
            input: String::new(),
            output: String::new(),
            lr: 0.05,
            lr_update_rate: 100,
            dim: 100,
            ws: 5,
            epoch: 5,
            min_count: 5,
            min_count_label: 0,
            neg: 5,
            word_ngrams: 1,
            loss: LossKind::NegativeSampling,
            bucket: 2_000_000,
            minn: 3,
            maxn: 6,
            thread: 12,
            t: 1e-4,
            label: "__label__".to_string(),
            verbose: 2,
            pretrained_vectors: String::new(),
            save_output: false,
            seed: 0,
            qout: false,
            retrain: false,
            qnorm: false,
            cutoff: 0,
            dsub: 2,
            autotune_validation_file: String::new(),
            autotune_metric: "f1".to_string(),
            autotune_predictions: 1,
            autotune_duration: 60 * 5,
            autotune_model_size: ModelSize::Unlimited,
        }
    }
}

impl TrainingArgs {
    /// Parse a full argument list, `argv[0]` being the program name.
    pub fn parse(argv: &[String]) -> Result<Self> {
        let command = argv
            .get(1)
            .ok_or_else(|| BridgeError::invalid_argument("missing command"))?;

        let mut args = Self::default();
        if command == config::args::QUANTIZE_COMMAND {
            args.command = Command::Quantize;
        } else {
            let kind: ModelKind = command.parse()?;
            args.command = Command::Train(kind);
            args.model = kind;
            if kind == ModelKind::Supervised {
                args.loss = LossKind::Softmax;
                args.min_count = 1;
                args.minn = 0;
                args.maxn = 0;
                args.lr = 0.1;
            }
        }

        let mut i = 2;
        while i < argv.len() {
            let flag = argv[i].as_str();
            let name = flag.strip_prefix('-').ok_or_else(|| {
                BridgeError::invalid_argument(format!("argument without a dash: {}", flag))
            })?;

            // Switches take no value
            match name {
                "saveOutput" => args.save_output = true,
                "qnorm" => args.qnorm = true,
                "retrain" => args.retrain = true,
                "qout" => args.qout = true,
                _ => {
                    let value = argv.get(i + 1).ok_or_else(|| {
                        BridgeError::invalid_argument(format!("missing value for {}", flag))
                    })?;
                    args.set(name, value)?;
                    i += 1;
                }
            }
            i += 1;
        }

        if args.input.is_empty() || args.output.is_empty() {
            return Err(BridgeError::invalid_argument("empty input or output path"));
        }

        if args.word_ngrams <= 1 && args.maxn == 0 && !args.has_autotune() {
            args.bucket = 0;
        }

        Ok(args)
    }

    fn set(&mut self, name: &str, value: &str) -> Result<()> {
        match name {
            "input" => self.input = value.to_string(),
            "output" => self.output = value.to_string(),
            "lr" => self.lr = number(name, value)?,
            "lrUpdateRate" => self.lr_update_rate = number(name, value)?,
            "dim" => self.dim = number(name, value)?,
            "ws" => self.ws = number(name, value)?,
            "epoch" => self.epoch = number(name, value)?,
            "minCount" => self.min_count = number(name, value)?,
            "minCountLabel" => self.min_count_label = number(name, value)?,
            "neg" => self.neg = number(name, value)?,
            "wordNgrams" => self.word_ngrams = number(name, value)?,
            "loss" => self.loss = value.parse()?,
            "bucket" => self.bucket = number(name, value)?,
            "minn" => self.minn = number(name, value)?,
            "maxn" => self.maxn = number(name, value)?,
            "thread" => self.thread = number(name, value)?,
            "t" => self.t = number(name, value)?,
            "label" => self.label = value.to_string(),
            "verbose" => self.verbose = number(name, value)?,
            "pretrainedVectors" => self.pretrained_vectors = value.to_string(),
            "seed" => self.seed = number(name, value)?,
            "cutoff" => self.cutoff = number(name, value)?,
            "dsub" => self.dsub = number(name, value)?,
            "autotune-validation" => self.autotune_validation_file = value.to_string(),
            "autotune-metric" => self.autotune_metric = value.to_string(),
            "autotune-predictions" => self.autotune_predictions = number(name, value)?,
            "autotune-duration" => self.autotune_duration = number(name, value)?,
            "autotune-modelsize" => self.autotune_model_size = value.parse()?,
            unknown => {
                return Err(BridgeError::invalid_argument(format!(
                    "unknown argument: -{}",
                    unknown
                )))
            }
        }
        Ok(())
    }

    pub fn has_autotune(&self) -> bool {
        !self.autotune_validation_file.is_empty()
    }

    /// Autotuning under a size budget yields a quantized model
    pub fn produces_quantized_model(&self) -> bool {
        self.has_autotune() && self.autotune_model_size.is_bounded()
    }
}

fn number<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        BridgeError::invalid_argument(format!("invalid value `{}` for -{}", value, name))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_model_kind_round_trip() {
        for kind in [ModelKind::Supervised, ModelKind::Cbow, ModelKind::Skipgram] {
            assert_eq!(kind.as_str().parse::<ModelKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_model_kind_rejects_unknown() {
        let err = "sup".parse::<ModelKind>().unwrap_err();
        assert!(matches!(err, BridgeError::InvalidArgument(_)));
    }

    #[test]
    fn test_canonical_argv() {
        let config = TrainingConfig::new(ModelKind::Supervised, "train.txt", "model_out")
            .epoch(5)
            .word_ngrams(1)
            .thread(2)
            .lr(0.1);

        assert_eq!(
            config.to_argv().unwrap(),
            argv(&[
                "fasttext",
                "supervised",
                "-input",
                "train.txt",
                "-output",
                "model_out",
                "-epoch",
                "5",
                "-wordNgrams",
                "1",
                "-thread",
                "2",
                "-lr",
                "0.100000",
            ])
        );
    }

    #[test]
    fn test_argv_with_autotune_and_save_output() {
        let config = TrainingConfig::new(ModelKind::Supervised, "train.txt", "out")
            .save_output(true)
            .autotune(AutotuneConfig {
                validation_file: "valid.txt".into(),
                model_size: Some("2M".to_string()),
                duration_secs: Some(60),
                metric: None,
            });
        let rendered = config.to_argv().unwrap();

        assert!(rendered.contains(&"-saveOutput".to_string()));
        let pos = rendered
            .iter()
            .position(|a| a == "-autotune-modelsize")
            .unwrap();
        assert_eq!(rendered[pos + 1], "2M");
        assert!(!rendered.contains(&"-autotune-metric".to_string()));
    }

    #[test]
    fn test_parse_supervised_defaults() {
        let args = TrainingArgs::parse(&argv(&[
            "fasttext",
            "supervised",
            "-input",
            "train.txt",
            "-output",
            "out",
        ]))
        .unwrap();

        assert_eq!(args.command, Command::Train(ModelKind::Supervised));
        assert_eq!(args.loss, LossKind::Softmax);
        assert_eq!(args.min_count, 1);
        assert_eq!(args.maxn, 0);
        assert!((args.lr - 0.1).abs() < 1e-9);
        // wordNgrams 1 and no char n-grams: no hashing buckets
        assert_eq!(args.bucket, 0);
    }

    #[test]
    fn test_parse_skipgram_keeps_buckets() {
        let args = TrainingArgs::parse(&argv(&[
            "fasttext", "skipgram", "-input", "a", "-output", "b",
        ]))
        .unwrap();

        assert_eq!(args.model, ModelKind::Skipgram);
        assert_eq!(args.loss, LossKind::NegativeSampling);
        assert_eq!(args.maxn, 6);
        assert_eq!(args.bucket, 2_000_000);
    }

    #[test]
    fn test_parse_round_trips_config() {
        let config = TrainingConfig::new(ModelKind::Cbow, "in.txt", "base")
            .epoch(10)
            .word_ngrams(2)
            .thread(4)
            .lr(0.25);
        let args = TrainingArgs::parse(&config.to_argv().unwrap()).unwrap();

        assert_eq!(args.model, ModelKind::Cbow);
        assert_eq!(args.input, "in.txt");
        assert_eq!(args.output, "base");
        assert_eq!(args.epoch, 10);
        assert_eq!(args.word_ngrams, 2);
        assert_eq!(args.thread, 4);
        assert!((args.lr - 0.25).abs() < 1e-6);
        assert!(!args.has_autotune());
    }

    #[test]
    fn test_parse_switches_take_no_value() {
        let args = TrainingArgs::parse(&argv(&[
            "fasttext",
            "quantize",
            "-input",
            "a",
            "-qnorm",
            "-output",
            "b",
            "-retrain",
        ]))
        .unwrap();

        assert_eq!(args.command, Command::Quantize);
        assert!(args.qnorm);
        assert!(args.retrain);
        assert!(!args.qout);
        assert_eq!(args.output, "b");
    }

    #[test]
    fn test_parse_autotune_model_size() {
        let args = TrainingArgs::parse(&argv(&[
            "fasttext",
            "supervised",
            "-input",
            "a",
            "-output",
            "b",
            "-autotune-validation",
            "v.txt",
            "-autotune-modelsize",
            "2M",
        ]))
        .unwrap();

        assert!(args.has_autotune());
        assert_eq!(args.autotune_model_size, ModelSize::Bytes(2_000_000));
        assert!(args.produces_quantized_model());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let cases = [
            argv(&["fasttext"]),
            argv(&["fasttext", "nearest", "-input", "a", "-output", "b"]),
            argv(&["fasttext", "cbow", "input", "a", "-output", "b"]),
            argv(&["fasttext", "cbow", "-input", "a", "-output"]),
            argv(&["fasttext", "cbow", "-input", "a", "-output", "b", "-bogus", "1"]),
            argv(&["fasttext", "cbow", "-input", "a", "-output", "b", "-epoch", "x"]),
            argv(&["fasttext", "cbow", "-output", "b"]),
        ];
        for case in cases {
            let result = TrainingArgs::parse(&case);
            assert!(
                matches!(result, Err(BridgeError::InvalidArgument(_))),
                "expected rejection for {:?}",
                case
            );
        }
    }

    #[test]
    fn test_model_size_parsing() {
        assert_eq!("".parse::<ModelSize>().unwrap(), ModelSize::Unlimited);
        assert_eq!("500".parse::<ModelSize>().unwrap(), ModelSize::Bytes(500));
        assert_eq!("10k".parse::<ModelSize>().unwrap(), ModelSize::Bytes(10_000));
        assert_eq!(
            "1G".parse::<ModelSize>().unwrap(),
            ModelSize::Bytes(1_000_000_000)
        );
        assert!("2MB".parse::<ModelSize>().is_err());
        assert!(matches!(
            "20000000000G".parse::<ModelSize>(),
            Err(BridgeError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_config_from_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("train.json");
        std::fs::write(
            &path,
            r#"{"kind": "skipgram", "input": "corpus.txt", "output": "vectors", "epoch": 3}"#,
        )
        .unwrap();

        let config = TrainingConfig::from_json_file(&path).unwrap();
        assert_eq!(config.kind, ModelKind::Skipgram);
        assert_eq!(config.epoch, 3);
        // Missing fields fall back to defaults
        assert_eq!(config.word_ngrams, 1);
        assert!(config.autotune.is_none());
    }

    #[test]
    fn test_config_from_missing_json_file() {
        let result = TrainingConfig::from_json_file("/nonexistent/train.json");
        assert!(matches!(result, Err(BridgeError::NotFound(_))));
    }
}
