//! Run Persistence
//!
//! Best-effort recording of finished runs. A failed write never disturbs
//! gameplay: the recorder logs and moves on, and the next run records
//! normally.

use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::sim::SimEvent;

/// A finished run, as handed to a [`ScoreSink`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Final score.
    pub score: u32,
    /// Obstacles passed (equal to score; kept separate so the stored
    /// record survives future scoring changes).
    pub obstacles_passed: u32,
}

/// Sink failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PersistError {
    /// The backing store rejected the write.
    #[error("score write rejected: {0}")]
    WriteFailed(String),
}

/// Destination for finished-run records.
pub trait ScoreSink: Send + Sync {
    /// Record one finished run.
    fn record_run(&self, record: &RunRecord) -> Result<(), PersistError>;
}

/// Consumes simulation events and forwards each run's final tally to the
/// sink exactly once, when the run ends.
pub struct RunRecorder<S: ScoreSink> {
    sink: S,
}

impl<S: ScoreSink> RunRecorder<S> {
    /// Wrap a sink.
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Feed one tick's events through. Only `RunEnded` is persisted.
    pub fn observe(&self, events: &[SimEvent]) {
        for event in events {
            if let SimEvent::RunEnded {
                score,
                obstacles_passed,
            } = event
            {
                let record = RunRecord {
                    score: *score,
                    obstacles_passed: *obstacles_passed,
                };
                match self.sink.record_run(&record) {
                    Ok(()) => info!(score = record.score, "run recorded"),
                    Err(error) => warn!(%error, score = record.score, "run not recorded"),
                }
            }
        }
    }

    /// Access the sink, for reading back in tests.
    pub fn sink(&self) -> &S {
        &self.sink
    }
}

/// In-memory sink for tests and the demo binary.
#[derive(Default)]
pub struct MemoryScoreSink {
    records: Mutex<Vec<RunRecord>>,
}

impl MemoryScoreSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far, oldest first.
    pub fn records(&self) -> Vec<RunRecord> {
        self.records.lock().expect("sink lock poisoned").clone()
    }

    /// Best recorded score, if any run has been recorded.
    pub fn best(&self) -> Option<u32> {
        self.records().iter().map(|r| r.score).max()
    }
}

impl ScoreSink for MemoryScoreSink {
    fn record_run(&self, record: &RunRecord) -> Result<(), PersistError> {
        self.records
            .lock()
            .expect("sink lock poisoned")
            .push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::Phase;

    struct FailingSink;

    impl ScoreSink for FailingSink {
        fn record_run(&self, _record: &RunRecord) -> Result<(), PersistError> {
            Err(PersistError::WriteFailed("disk full".into()))
        }
    }

    #[test]
    fn test_run_ended_is_recorded() {
        let recorder = RunRecorder::new(MemoryScoreSink::new());
        recorder.observe(&[
            SimEvent::Scored {
                obstacle_id: 0,
                score: 1,
            },
            SimEvent::RunEnded {
                score: 1,
                obstacles_passed: 1,
            },
        ]);

        let records = recorder.sink().records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].score, 1);
    }

    #[test]
    fn test_non_terminal_events_are_ignored() {
        let recorder = RunRecorder::new(MemoryScoreSink::new());
        recorder.observe(&[
            SimEvent::PhaseChanged {
                from: Phase::Ready,
                to: Phase::Playing,
            },
            SimEvent::Died { bird_y: 630.0 },
        ]);
        assert!(recorder.sink().records().is_empty());
    }

    #[test]
    fn test_write_failure_does_not_panic_or_poison() {
        let recorder = RunRecorder::new(FailingSink);
        recorder.observe(&[SimEvent::RunEnded {
            score: 3,
            obstacles_passed: 3,
        }]);
        // A later run still reaches the sink.
        recorder.observe(&[SimEvent::RunEnded {
            score: 5,
            obstacles_passed: 5,
        }]);
    }

    #[test]
    fn test_best_score() {
        let sink = MemoryScoreSink::new();
        for score in [2u32, 7, 4] {
            sink.record_run(&RunRecord {
                score,
                obstacles_passed: score,
            })
            .unwrap();
        }
        assert_eq!(sink.best(), Some(7));
    }
}
