use crate::classifier::MotionClassifier;
use crate::emitter::EventSink;
use crate::error::Result;
use crate::sample::Sample;
use std::future::Future;
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::time::{interval, sleep_until, Duration, Instant};

/// Where live samples come from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleSource {
    /// `termux-sensor` on the device, synthetic data when it is unavailable
    Termux,
    /// Synthetic walking waveform only
    Synthetic,
}

/// Poll the accelerometer at `period` and push samples into `tx`.
///
/// A full channel drops the sample, like a platform sensor queue would. The
/// loop ends once the receiver is gone.
pub async fn accel_loop(tx: Sender<Sample>, source: SampleSource, period: Duration) {
    let mut interval = interval(period);
    let mut synthetic = SyntheticWalk::new(period.as_secs_f64());
    let mut sample_count = 0u64;

    loop {
        interval.tick().await;

        let sample = match source {
            SampleSource::Termux => read_accelerometer().unwrap_or_else(|| synthetic.next_sample()),
            SampleSource::Synthetic => synthetic.next_sample(),
        };

        match tx.try_send(sample) {
            Ok(_) => {
                sample_count += 1;
                if sample_count % 100 == 0 {
                    log::debug!("[accel] {} samples", sample_count);
                }
            }
            Err(TrySendError::Closed(_)) => {
                log::debug!("[accel] channel closed after {} samples", sample_count);
                break;
            }
            Err(TrySendError::Full(_)) => {}
        }
    }
}

/// Feed samples from `rx` into `classifier` until the feed closes, the
/// deadline passes or `shutdown` resolves.
///
/// `shutdown` is polled across the whole run, so a signal that lands while
/// a sample is being processed stops the loop before the next one.
/// `after_sample` runs once per consumed sample. Returns the number of
/// samples consumed.
pub async fn drive_classifier<S, F, A>(
    rx: &mut Receiver<Sample>,
    classifier: &mut MotionClassifier<S>,
    shutdown: F,
    deadline: Option<Instant>,
    mut after_sample: A,
) -> Result<u64>
where
    S: EventSink,
    F: Future,
    A: FnMut(&mut MotionClassifier<S>) -> std::io::Result<()>,
{
    tokio::pin!(shutdown);
    let expiry = async move {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(expiry);

    let mut consumed = 0u64;
    loop {
        let sample = tokio::select! {
            biased;
            _ = &mut shutdown => {
                log::info!("shutdown requested after {} samples", consumed);
                None
            }
            _ = &mut expiry => {
                log::info!("duration reached after {} samples", consumed);
                None
            }
            sample = rx.recv() => sample,
        };
        let Some(sample) = sample else { break };

        classifier.push_sample(&sample);
        consumed += 1;
        after_sample(classifier)?;
    }
    Ok(consumed)
}

fn read_accelerometer() -> Option<Sample> {
    let output = Command::new("termux-sensor")
        .arg("-n")
        .arg("1")
        .arg("-s")
        .arg("accelerometer")
        .output()
        .ok()?;
    let text = String::from_utf8_lossy(&output.stdout);
    parse_accel_output(&text, current_timestamp())
}

/// Parse `x=…, y=…, z=…` readings out of a termux-sensor line.
/// All three axes must be present.
pub fn parse_accel_output(output: &str, timestamp: f64) -> Option<Sample> {
    let mut x = None;
    let mut y = None;
    let mut z = None;

    for part in output.split(|c: char| c == ',' || c == ':') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix("x=") {
            x = Some(value.trim().parse().ok()?);
        } else if let Some(value) = part.strip_prefix("y=") {
            y = Some(value.trim().parse().ok()?);
        } else if let Some(value) = part.strip_prefix("z=") {
            z = Some(value.trim().parse().ok()?);
        }
    }

    Some(Sample::new(x?, y?, z?, timestamp))
}

/// Gravity plus a periodic heel-strike spike, roughly two steps a second.
pub struct SyntheticWalk {
    dt: f64,
    t: f64,
}

impl SyntheticWalk {
    pub fn new(dt: f64) -> Self {
        Self { dt, t: 0.0 }
    }

    pub fn next_sample(&mut self) -> Sample {
        use std::f64::consts::PI;
        let phase = (self.t * 2.0 * 2.0 * PI).sin();
        let spike = if phase > 0.9 { 6.0 } else { 0.0 };
        let sample = Sample::new(
            (self.t * 2.0 * PI).sin() * 0.8,
            (self.t * 2.0 * PI).cos() * 0.5,
            9.81 + phase * 1.5 + spike,
            current_timestamp(),
        );
        self.t += self.dt;
        sample
    }
}

pub fn current_timestamp() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}
