//! Offline replay of recorded accelerometer logs through the streaming
//! classifier.
//!
//! Logs are either a JSON document (a bare array of samples, or an object
//! with a `samples` array) or JSON lines with one sample per line. Either form
//! may be gzip-compressed, detected by a trailing `.gz`.

use crate::activity::ActivityType;
use crate::classifier::{ClassifierSnapshot, ClassifierStats, MotionClassifier};
use crate::config::ClassifierConfig;
use crate::emitter::ClassificationEvent;
use crate::error::Result;
use crate::sample::Sample;
use flate2::read::GzDecoder;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

#[derive(Deserialize)]
#[serde(untagged)]
enum SampleDocument {
    Bare(Vec<Sample>),
    Wrapped { samples: Vec<Sample> },
}

/// How a log stores its samples
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    JsonLines,
}

impl LogFormat {
    /// Pick the format from the file name, ignoring a `.gz` suffix.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        if name.ends_with(".jsonl") || name.ends_with(".ndjson") {
            LogFormat::JsonLines
        } else {
            LogFormat::Json
        }
    }
}

/// True when the file name ends in `.gz`, in any case
pub fn is_gzip(path: &Path) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().eq_ignore_ascii_case("gz"))
        .unwrap_or(false)
}

pub fn load_samples(path: &Path) -> Result<Vec<Sample>> {
    let file = File::open(path)?;
    let format = LogFormat::from_path(path);
    if is_gzip(path) {
        read_samples(BufReader::new(GzDecoder::new(file)), format)
    } else {
        read_samples(BufReader::new(file), format)
    }
}

pub fn read_samples<R: BufRead>(reader: R, format: LogFormat) -> Result<Vec<Sample>> {
    match format {
        LogFormat::Json => {
            let document: SampleDocument = serde_json::from_reader(reader)?;
            Ok(match document {
                SampleDocument::Bare(samples) => samples,
                SampleDocument::Wrapped { samples } => samples,
            })
        }
        LogFormat::JsonLines => {
            let mut samples = Vec::new();
            for line in reader.lines() {
                let line = line?;
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                samples.push(serde_json::from_str(line)?);
            }
            Ok(samples)
        }
    }
}

/// Read a whole gzip stream into memory, for callers that already hold bytes
pub fn read_gzip_samples<R: Read>(reader: R, format: LogFormat) -> Result<Vec<Sample>> {
    read_samples(BufReader::new(GzDecoder::new(reader)), format)
}

/// Outcome of one replay run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayReport {
    pub samples: usize,
    pub events: Vec<ClassificationEvent>,
    /// Emitted events per published activity label
    pub activity_events: BTreeMap<String, usize>,
    pub final_snapshot: ClassifierSnapshot,
    pub stats: ClassifierStats,
}

impl ReplayReport {
    pub fn final_activity(&self) -> ActivityType {
        self.final_snapshot.activity
    }

    pub fn final_step_count(&self) -> u64 {
        self.final_snapshot.step_count
    }
}

/// Start a classifier, feed every sample in order, stop it and report.
pub fn replay_samples(config: ClassifierConfig, samples: &[Sample]) -> Result<ReplayReport> {
    let mut classifier = MotionClassifier::with_config(config, Vec::new())?;
    classifier.start();
    for sample in samples {
        classifier.push_sample(sample);
    }
    classifier.stop();

    let final_snapshot = classifier.snapshot();
    let stats = classifier.stats();
    let events = std::mem::take(classifier.sink_mut());

    let mut activity_events = BTreeMap::new();
    for event in &events {
        *activity_events
            .entry(event.activity_type.to_string())
            .or_insert(0) += 1;
    }

    log::info!(
        "replayed {} samples: {} events, {} steps, final activity {}",
        samples.len(),
        events.len(),
        final_snapshot.step_count,
        final_snapshot.activity
    );

    Ok(ReplayReport {
        samples: samples.len(),
        events,
        activity_events,
        final_snapshot,
        stats,
    })
}
