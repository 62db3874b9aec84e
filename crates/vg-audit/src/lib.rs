//! vg-audit
//!
//! Append-only promotion history. One JSON event per line, each event
//! carrying `hash_prev` + `hash_self` (SHA-256 over canonical JSON without
//! `hash_self`) so any edit or deletion inside the log is detectable with
//! [`verify_hash_chain`].

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Namespace for deterministic event ids.
const EVENT_ID_NAMESPACE: Uuid = Uuid::from_u128(0x6b1d_4a0e_93c2_4f5e_9b7a_2c81_d0e4_5f17);

/// Append-only, hash-chained JSONL writer.
pub struct AuditWriter {
    path: PathBuf,
    last_hash: Option<String>,
    /// Number of events in the log; the next event's sequence number.
    seq: u64,
}

impl AuditWriter {
    /// Start a fresh chain at `path`, creating parent dirs.
    ///
    /// If the file already holds events, use [`AuditWriter::resume`] instead or
    /// the chain will break at the first appended line.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("create_dir_all {:?}", parent))?;
        }

        Ok(Self {
            path,
            last_hash: None,
            seq: 0,
        })
    }

    /// Open `path` and continue its chain from the last event (or start a new
    /// one if the file does not exist yet).
    pub fn resume(path: impl AsRef<Path>) -> Result<Self> {
        let mut w = Self::new(path)?;
        if !w.path.exists() {
            return Ok(w);
        }

        let events = read_events(&w.path)?;
        w.seq = events.len() as u64;
        w.last_hash = events.last().and_then(|ev| ev.hash_self.clone());
        Ok(w)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn last_hash(&self) -> Option<String> {
        self.last_hash.clone()
    }

    /// Number of events appended so far (including resumed ones).
    pub fn seq(&self) -> u64 {
        self.seq
    }

    /// Append one event for `cycle_id`.
    pub fn append(
        &mut self,
        cycle_id: Uuid,
        topic: &str,
        event_type: &str,
        payload: Value,
    ) -> Result<AuditEvent> {
        let event_id = derive_event_id(self.last_hash.as_deref(), &payload, self.seq)?;

        let mut ev = AuditEvent {
            event_id,
            cycle_id,
            seq: self.seq,
            ts_utc: Utc::now(),
            topic: topic.to_string(),
            event_type: event_type.to_string(),
            payload,
            hash_prev: self.last_hash.clone(),
            hash_self: None,
        };

        let self_hash = compute_event_hash(&ev)?;
        ev.hash_self = Some(self_hash.clone());

        let line = canonical_json_line(&ev)?;
        append_line(&self.path, &line)?;

        // Advance only once the line is on disk.
        self.last_hash = Some(self_hash);
        self.seq += 1;
        Ok(ev)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub event_id: Uuid,
    pub cycle_id: Uuid,
    pub seq: u64,
    pub ts_utc: DateTime<Utc>,
    pub topic: String,
    pub event_type: String,
    pub payload: Value,
    pub hash_prev: Option<String>,
    pub hash_self: Option<String>,
}

/// Event id = UUIDv5 over (previous hash, sequence, canonical payload).
/// No RNG: replaying the same history yields the same ids.
fn derive_event_id(prev_hash: Option<&str>, payload: &Value, seq: u64) -> Result<Uuid> {
    let canonical = canonical_json_line(payload)?;
    let material = format!("{}|{}|{}", prev_hash.unwrap_or("GENESIS"), seq, canonical);
    Ok(Uuid::new_v5(&EVENT_ID_NAMESPACE, material.as_bytes()))
}

fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open audit log {:?}", path))?;
    f.write_all(format!("{line}\n").as_bytes())
        .context("write audit line failed")?;
    f.sync_data().context("sync audit log failed")?;
    Ok(())
}

/// Canonicalize by sorting keys recursively and emitting compact JSON.
fn canonical_json_line<T: Serialize>(v: &T) -> Result<String> {
    let raw = serde_json::to_value(v).context("serialize audit event failed")?;
    let sorted = sort_keys(&raw);
    serde_json::to_string(&sorted).context("json stringify failed")
}

fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = serde_json::Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        _ => v.clone(),
    }
}

/// Hash over the canonical JSON of the event WITHOUT `hash_self`.
pub fn compute_event_hash(ev: &AuditEvent) -> Result<String> {
    let mut clone = ev.clone();
    clone.hash_self = None;

    let canonical = canonical_json_line(&clone)?;
    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(hex::encode(hasher.finalize()))
}

/// Parse every event of a log, in order.
pub fn read_events(path: impl AsRef<Path>) -> Result<Vec<AuditEvent>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    content
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty())
        .map(|(i, l)| {
            serde_json::from_str::<AuditEvent>(l.trim())
                .with_context(|| format!("parse audit event at line {}", i + 1))
        })
        .collect()
}

/// Verify the hash chain integrity of an audit log file.
pub fn verify_hash_chain(path: impl AsRef<Path>) -> Result<VerifyResult> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("read audit log {:?}", path.as_ref()))?;
    verify_hash_chain_str(&content)
}

/// Same as [`verify_hash_chain`] over in-memory JSONL content.
pub fn verify_hash_chain_str(content: &str) -> Result<VerifyResult> {
    let mut prev_hash: Option<String> = None;
    let mut line_count = 0usize;

    for (i, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let ev: AuditEvent = serde_json::from_str(trimmed)
            .with_context(|| format!("parse audit event at line {}", i + 1))?;

        line_count += 1;

        if ev.hash_prev != prev_hash {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_prev mismatch: expected {:?}, got {:?}",
                    prev_hash, ev.hash_prev
                ),
            });
        }

        let Some(claimed) = ev.hash_self.clone() else {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: "hash_self missing".to_string(),
            });
        };
        let recomputed = compute_event_hash(&ev)?;
        if claimed != recomputed {
            return Ok(VerifyResult::Broken {
                line: i + 1,
                reason: format!(
                    "hash_self mismatch: claimed {}, recomputed {}",
                    claimed, recomputed
                ),
            });
        }

        prev_hash = Some(claimed);
    }

    Ok(VerifyResult::Valid { lines: line_count })
}

/// Result of hash chain verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyResult {
    Valid { lines: usize },
    Broken { line: usize, reason: String },
}
