//! Shared stub collaborators for tests.
//!
//! Stubs implement the same traits production collaborators do, so every
//! test wires components exactly the way a host application would.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::embedding::{EmbeddingError, EmbeddingProvider};
use crate::label::{LabelError, TextGenerator};

/// Deterministic embedding provider over a fixed text -> vector table.
///
/// Counts provider calls so tests can assert cache behavior, and can be
/// switched into a failing state to simulate an outage.
pub struct StubProvider {
    vectors: Mutex<HashMap<String, Vec<f32>>>,
    calls: AtomicUsize,
    fail: AtomicBool,
    last_batch: Mutex<Vec<String>>,
}

impl StubProvider {
    pub fn new(pairs: &[(&str, Vec<f32>)]) -> Self {
        let vectors = pairs
            .iter()
            .map(|(text, vector)| (text.to_string(), vector.clone()))
            .collect();
        Self {
            vectors: Mutex::new(vectors),
            calls: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            last_batch: Mutex::new(Vec::new()),
        }
    }

    /// Register another known text after construction.
    pub fn insert(&self, text: &str, vector: Vec<f32>) {
        self.vectors
            .lock()
            .unwrap()
            .insert(text.to_string(), vector);
    }

    /// How many times the provider was reached (one batch = one call).
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// The texts the most recent batch call asked for.
    pub fn last_batch(&self) -> Vec<String> {
        self.last_batch.lock().unwrap().clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn lookup(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.vectors
            .lock()
            .unwrap()
            .get(text)
            .cloned()
            .ok_or_else(|| EmbeddingError::Unavailable(format!("no stub vector for '{text}'")))
    }

    fn check_up(&self) -> Result<(), EmbeddingError> {
        if self.fail.load(Ordering::SeqCst) {
            Err(EmbeddingError::Unavailable("stubbed outage".to_string()))
        } else {
            Ok(())
        }
    }
}

impl EmbeddingProvider for StubProvider {
    fn embed_one(&self, text: &str, _model: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.check_up()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = vec![text.to_string()];
        self.lookup(text)
    }

    fn embed_many(&self, texts: &[String], _model: &str) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.check_up()?;
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_batch.lock().unwrap() = texts.to_vec();
        texts.iter().map(|text| self.lookup(text)).collect()
    }
}

/// A 2-d unit vector whose cosine against [1, 0] is exactly `cosine`.
pub fn unit_vector(cosine: f32) -> Vec<f32> {
    vec![cosine, (1.0 - cosine * cosine).sqrt()]
}

/// Generator that always answers with a well-formed label payload.
#[derive(Default)]
pub struct JsonGenerator {
    calls: AtomicUsize,
}

impl JsonGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextGenerator for JsonGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, LabelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(r#"{"name": "Shared moments", "description": "Experiences with a common thread."}"#
            .to_string())
    }
}

/// Generator that always fails, exercising the placeholder path.
pub struct FailingGenerator;

impl TextGenerator for FailingGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, LabelError> {
        Err(LabelError::Generation("stubbed failure".to_string()))
    }
}
