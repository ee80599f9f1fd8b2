//! fasttext-bridge command line
//!
//! Mirrors the engine's own verbs on top of the bridge API. The binary wires
//! in the fastText engine; everything here is generic over [`Engine`].

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use fasttext_bridge::{
    quantize, train, AutotuneConfig, Engine, ModelHandle, ModelKind, TrainingConfig,
};

#[derive(Parser, Debug)]
#[command(name = "ftbridge")]
#[command(about = "Predict, embed, train and quantize fastText models")]
#[command(version)]
pub struct Cli {
    /// Log filter directives (e.g. `fasttext_bridge=debug`)
    #[arg(long, global = true, env = "FASTTEXT_BRIDGE_LOG")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Predict labels for each line read from stdin
    Predict {
        model: PathBuf,
        #[arg(default_value_t = 1)]
        k: usize,
        #[arg(default_value_t = 0.0)]
        threshold: f32,
        /// One JSON array per input line
        #[arg(long)]
        json: bool,
    },
    /// Print a sentence vector for each line read from stdin
    SentenceVector { model: PathBuf },
    /// Print the embedding dimension of a model
    Dimension { model: PathBuf },
    /// Train a new model
    Train(TrainCommand),
    /// Quantize `<output>.bin` into `<output>.ftz` (`--input` is not read)
    Quantize {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        output: PathBuf,
    },
    /// Load a model and save it to another path
    Save { model: PathBuf, dest: PathBuf },
}

#[derive(Args, Debug)]
pub struct TrainCommand {
    /// supervised, cbow or skipgram
    pub kind: Option<String>,
    #[arg(long)]
    pub input: Option<PathBuf>,
    /// Output base; extensions are appended
    #[arg(long)]
    pub output: Option<PathBuf>,
    #[arg(long, default_value_t = 5)]
    pub epoch: i32,
    #[arg(long, default_value_t = 1)]
    pub word_ngrams: i32,
    #[arg(long, default_value_t = 12)]
    pub thread: i32,
    #[arg(long, default_value_t = 0.1)]
    pub lr: f32,
    #[arg(long)]
    pub save_output: bool,
    #[arg(long)]
    pub autotune_validation: Option<PathBuf>,
    #[arg(long, requires = "autotune_validation")]
    pub autotune_model_size: Option<String>,
    #[arg(long, requires = "autotune_validation")]
    pub autotune_duration: Option<u32>,
    #[arg(long, requires = "autotune_validation")]
    pub autotune_metric: Option<String>,
    /// Read the whole request from a JSON file instead
    #[arg(long, conflicts_with_all = ["kind", "input", "output"])]
    pub config: Option<PathBuf>,
}

impl TrainCommand {
    pub fn to_config(&self) -> anyhow::Result<TrainingConfig> {
        if let Some(path) = &self.config {
            return TrainingConfig::from_json_file(path)
                .with_context(|| format!("failed to read {}", path.display()));
        }

        let (Some(kind), Some(input), Some(output)) = (&self.kind, &self.input, &self.output)
        else {
            bail!("train needs a model kind, --input and --output (or --config)");
        };
        let kind: ModelKind = kind.parse()?;

        let mut config = TrainingConfig::new(kind, input, output)
            .epoch(self.epoch)
            .word_ngrams(self.word_ngrams)
            .thread(self.thread)
            .lr(self.lr)
            .save_output(self.save_output);

        if let Some(validation_file) = &self.autotune_validation {
            config = config.autotune(AutotuneConfig {
                validation_file: validation_file.clone(),
                model_size: self.autotune_model_size.clone(),
                duration_secs: self.autotune_duration,
                metric: self.autotune_metric.clone(),
            });
        }
        Ok(config)
    }
}

fn load<E: Engine + Default>(model: &Path) -> anyhow::Result<ModelHandle<E>> {
    let mut handle = ModelHandle::<E>::default();
    handle
        .load(model)
        .with_context(|| format!("failed to load {}", model.display()))?;
    Ok(handle)
}

/// Execute one command
pub fn run<E, R, W>(command: &Command, input: R, mut out: W) -> anyhow::Result<()>
where
    E: Engine + Default,
    R: BufRead,
    W: Write,
{
    match command {
        Command::Predict {
            model,
            k,
            threshold,
            json,
        } => {
            let handle = load::<E>(model)?;
            for line in input.lines() {
                let line = line?;
                let predictions = handle.predict(&line, *k, *threshold)?;
                if *json {
                    writeln!(out, "{}", serde_json::to_string(&predictions)?)?;
                } else {
                    let fields: Vec<String> = predictions
                        .iter()
                        .map(|p| format!("{} {:.5}", p.label, p.probability))
                        .collect();
                    writeln!(out, "{}", fields.join(" "))?;
                }
            }
        }
        Command::SentenceVector { model } => {
            let handle = load::<E>(model)?;
            for line in input.lines() {
                let vector = handle.sentence_vector_owned(&line?)?;
                let fields: Vec<String> = vector.iter().map(|v| format!("{:.5}", v)).collect();
                writeln!(out, "{}", fields.join(" "))?;
            }
        }
        Command::Dimension { model } => {
            let handle = load::<E>(model)?;
            writeln!(out, "{}", handle.dimension()?)?;
        }
        Command::Train(train_command) => {
            let config = train_command.to_config()?;
            let artifacts = train::<E>(&config)?;
            tracing::info!("Model written to {}", artifacts.model.display());
            writeln!(out, "{}", artifacts.model.display())?;
            writeln!(out, "{}", artifacts.vectors.display())?;
            if let Some(output) = artifacts.output {
                writeln!(out, "{}", output.display())?;
            }
        }
        Command::Quantize { input, output } => {
            let target = quantize::<E>(input, output)?;
            writeln!(out, "{}", target.display())?;
        }
        Command::Save { model, dest } => {
            let mut handle = load::<E>(model)?;
            handle.save_model(dest)?;
            writeln!(out, "{}", dest.display())?;
        }
    }
    out.flush()?;
    Ok(())
}
