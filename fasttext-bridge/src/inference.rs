//! Inference against a loaded handle
//!
//! The engine reads its input line by line and misbehaves on unterminated
//! text, so every query is normalized with [`normalize_line`] first.

use std::borrow::Cow;

use crate::engine::{Engine, Prediction};
use crate::error::{BridgeError, Result};
use crate::handle::ModelHandle;

/// Append a single `\n` unless the query already ends with one
pub fn normalize_line(query: &str) -> Cow<'_, str> {
    if query.ends_with('\n') {
        Cow::Borrowed(query)
    } else {
        let mut line = String::with_capacity(query.len() + 1);
        line.push_str(query);
        line.push('\n');
        Cow::Owned(line)
    }
}

impl<E: Engine> ModelHandle<E> {
    /// Predict at most `k` labels scoring at least `threshold`.
    ///
    /// Results keep the engine's ranking order.
    pub fn predict(&self, query: &str, k: usize, threshold: f32) -> Result<Vec<Prediction>> {
        let engine = self.ready_engine("predict")?;
        if k == 0 {
            return Err(BridgeError::invalid_argument("k needs to be 1 or higher"));
        }

        let line = normalize_line(query);
        let mut predictions = engine.predict_line(&line, k, threshold)?;
        predictions.retain(|p| p.probability >= threshold);
        predictions.truncate(k);

        log::trace!("predict k={} threshold={}: {} labels", k, threshold, predictions.len());
        Ok(predictions)
    }

    /// Write the sentence embedding of `query` into `out`.
    ///
    /// `out` must hold exactly one value per model dimension; on mismatch it is
    /// left untouched.
    pub fn sentence_vector(&self, query: &str, out: &mut [f32]) -> Result<()> {
        let vector = self.compute_sentence_vector(query)?;
        if vector.len() != out.len() {
            return Err(BridgeError::SizeMismatch {
                buffer: out.len(),
                model: vector.len(),
            });
        }
        out.copy_from_slice(&vector);
        Ok(())
    }

    /// Sentence embedding of `query` as a new vector
    pub fn sentence_vector_owned(&self, query: &str) -> Result<Vec<f32>> {
        let mut out = vec![0.0; self.dimension()?];
        self.sentence_vector(query, &mut out)?;
        Ok(out)
    }

    fn compute_sentence_vector(&self, query: &str) -> Result<Vec<f32>> {
        let engine = self.ready_engine("sentence vector")?;
        let line = normalize_line(query);
        engine.sentence_vector(&line)
    }
}
