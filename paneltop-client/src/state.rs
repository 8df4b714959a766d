use paneltop_proto::StatusSnapshot;

use crate::history::{TrafficHistory, TrafficSample};

/// Everything the pollers can report back to the view.
#[derive(Debug)]
pub enum PollEvent {
    /// A fresh status snapshot, replacing the previous one wholesale.
    Snapshot(StatusSnapshot),
    /// A status poll failed; the view stops claiming to load but keeps
    /// whatever snapshot it already has.
    SnapshotUnavailable,
    /// One traffic measurement.
    Sample(TrafficSample),
    /// The panel version, reported once at startup.
    Version(String),
}

/// View state owned by the event loop. The loop is the single writer: poller
/// tasks never touch it directly, they only send [`PollEvent`]s.
#[derive(Debug)]
pub struct DashState {
    /// True until the first status poll completes (successfully or not).
    /// Never set back to true, so a loaded view rides out transient errors
    /// on its last-known-good snapshot.
    pub loading: bool,
    pub snapshot: Option<StatusSnapshot>,
    pub history: TrafficHistory,
    pub panel_version: Option<String>,
}

impl Default for DashState {
    fn default() -> Self {
        Self {
            loading: true,
            snapshot: None,
            history: TrafficHistory::new(),
            panel_version: None,
        }
    }
}

impl DashState {
    pub fn apply(&mut self, event: PollEvent) {
        match event {
            PollEvent::Snapshot(snapshot) => {
                self.snapshot = Some(snapshot);
                self.loading = false;
            }
            PollEvent::SnapshotUnavailable => {
                self.loading = false;
            }
            PollEvent::Sample(sample) => {
                self.history.push(sample);
            }
            PollEvent::Version(version) => {
                self.panel_version = Some(version);
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use paneltop_proto::{PoolStats, SystemStatus};

    fn snapshot(cpu: f64) -> StatusSnapshot {
        StatusSnapshot {
            system: SystemStatus {
                cpu_percent: cpu,
                memory_percent: 50.0,
                memory_total_gb: 16.0,
                memory_used_gb: 8.0,
            },
            tunnels: PoolStats { total: 2, active: 1 },
            nodes: PoolStats { total: 5, active: 3 },
        }
    }

    #[test]
    fn snapshot_clears_loading_and_replaces_wholesale() {
        let mut state = DashState::default();
        assert!(state.loading);

        state.apply(PollEvent::Snapshot(snapshot(10.0)));
        assert!(!state.loading);
        assert_eq!(state.snapshot.as_ref().unwrap().system.cpu_percent, 10.0);

        state.apply(PollEvent::Snapshot(snapshot(20.0)));
        assert_eq!(state.snapshot.as_ref().unwrap().system.cpu_percent, 20.0);
    }

    #[test]
    fn failed_poll_clears_loading_but_keeps_snapshot() {
        let mut state = DashState::default();
        state.apply(PollEvent::SnapshotUnavailable);
        assert!(!state.loading);
        assert!(state.snapshot.is_none());

        state.apply(PollEvent::Snapshot(snapshot(10.0)));
        state.apply(PollEvent::SnapshotUnavailable);
        assert!(!state.loading);
        assert_eq!(state.snapshot.as_ref().unwrap().system.cpu_percent, 10.0);
    }

    #[test]
    fn samples_accumulate_in_history() {
        let mut state = DashState::default();
        for n in 0..3 {
            state.apply(PollEvent::Sample(TrafficSample {
                time: format!("12:00:0{n}"),
                download: n as f64,
                upload: 0.0,
            }));
        }
        assert_eq!(state.history.len(), 3);
        assert_eq!(state.history.last().unwrap().download, 2.0);
    }

    #[test]
    fn version_is_recorded() {
        let mut state = DashState::default();
        state.apply(PollEvent::Version("0.1.0".to_owned()));
        assert_eq!(state.panel_version.as_deref(), Some("0.1.0"));
    }
}
