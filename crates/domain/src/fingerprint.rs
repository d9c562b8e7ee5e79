//! Deterministic configuration fingerprints
//!
//! A category's fingerprint is the digest of a canonical JSON rendering of
//! everything that influences its generated assets. Object keys are sorted at
//! every depth, so two logically equal configurations always produce the same
//! bytes regardless of how their maps were built.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::model::{
    CategoryConfig, Fingerprint, GenerationMode, GlobalStyleSettings, StyleEngineSettings,
};
use crate::ports::{HashError, HashProvider};

#[derive(Serialize)]
struct FingerprintInput<'a> {
    trait_count: u32,
    complexity: f64,
    color_seed: &'a str,
    generation_mode: GenerationMode,
    mode_options: &'a BTreeMap<String, Value>,
    global_style: &'a GlobalStyleSettings,
    style_engine: &'a StyleEngineSettings,
}

/// Render the canonical fingerprint input for a category
pub fn canonical_input(
    config: &CategoryConfig,
    global_style: &GlobalStyleSettings,
    style_engine: &StyleEngineSettings,
) -> Result<String, HashError> {
    let input = FingerprintInput {
        trait_count: config.trait_count,
        complexity: config.complexity,
        color_seed: &config.color_seed,
        generation_mode: config.generation_mode,
        mode_options: &config.mode_options,
        global_style,
        style_engine,
    };

    let value = serde_json::to_value(&input).map_err(|e| HashError::Failed(e.to_string()))?;
    canonical_json(value)
}

/// Serialize a JSON value with object keys sorted lexicographically at every depth
pub fn canonical_json(value: Value) -> Result<String, HashError> {
    serde_json::to_string(&sort_keys(value)).map_err(|e| HashError::Failed(e.to_string()))
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> =
                map.into_iter().map(|(k, v)| (k, sort_keys(v))).collect();
            Value::Object(sorted.into_iter().collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// SHA-256 digest encoded as lowercase hex
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Hasher;

impl HashProvider for Sha256Hasher {
    fn digest(&self, bytes: &[u8]) -> Result<Fingerprint, HashError> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Ok(Fingerprint::new(format!("{:x}", hasher.finalize())))
    }

    fn is_cryptographic(&self) -> bool {
        true
    }
}

/// 32-bit polynomial rolling hash (multiplier 31) encoded base-36.
///
/// Only good enough to notice that something changed. It is not collision
/// resistant, so two different configurations can share a digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct RollingHasher;

impl RollingHasher {
    fn hash_str(input: &str) -> u32 {
        let mut hash: i32 = 0;
        for unit in input.encode_utf16() {
            hash = hash.wrapping_mul(31).wrapping_add(i32::from(unit));
        }
        hash.unsigned_abs()
    }
}

impl HashProvider for RollingHasher {
    fn digest(&self, bytes: &[u8]) -> Result<Fingerprint, HashError> {
        let input = String::from_utf8_lossy(bytes);
        Ok(Fingerprint::new(to_base36(Self::hash_str(&input))))
    }

    fn is_cryptographic(&self) -> bool {
        false
    }
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

/// Primary hash provider with an optional weaker fallback used when the
/// primary reports itself unavailable
pub struct HashStrategy {
    primary: Box<dyn HashProvider>,
    fallback: Option<Box<dyn HashProvider>>,
}

impl HashStrategy {
    pub fn new(primary: Box<dyn HashProvider>, fallback: Option<Box<dyn HashProvider>>) -> Self {
        Self { primary, fallback }
    }

    pub fn digest(&self, bytes: &[u8]) -> Result<Fingerprint, HashError> {
        match self.primary.digest(bytes) {
            Ok(fingerprint) => Ok(fingerprint),
            Err(HashError::Unavailable(reason)) => {
                let Some(fallback) = &self.fallback else {
                    return Err(HashError::Unavailable(reason));
                };
                tracing::warn!(
                    reason = %reason,
                    cryptographic = fallback.is_cryptographic(),
                    "Primary hash unavailable, using fallback"
                );
                fallback.digest(bytes)
            }
            Err(e) => Err(e),
        }
    }
}

impl Default for HashStrategy {
    fn default() -> Self {
        Self::new(Box::new(Sha256Hasher), Some(Box::new(RollingHasher)))
    }
}
