use std::collections::VecDeque;

use paneltop_proto::TrafficRates;
use time::OffsetDateTime;
use time::macros::format_description;

/// How many traffic samples the chart keeps. At one sample every two seconds
/// this is a one-minute window.
pub const MAX_TRAFFIC_POINTS: usize = 30;

/// One traffic measurement point. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TrafficSample {
    /// Wall-clock time of the sample, `HH:MM:SS`, 24-hour.
    pub time: String,
    /// Download rate in Mbps.
    pub download: f64,
    /// Upload rate in Mbps.
    pub upload: f64,
}

impl TrafficSample {
    /// Build a sample stamped with the current wall-clock time. Rates the
    /// panel did not report count as zero.
    pub fn at_now(rates: &TrafficRates) -> Self {
        Self {
            time: clock_time(),
            download: rates.rx_mbps.unwrap_or(0.0),
            upload: rates.tx_mbps.unwrap_or(0.0),
        }
    }
}

/// Current local time formatted as `HH:MM:SS`. Falls back to UTC when the
/// local offset cannot be determined (e.g. multi-threaded Unix processes).
fn clock_time() -> String {
    let format = format_description!("[hour]:[minute]:[second]");
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format)
        .unwrap_or_else(|_| "--:--:--".to_owned())
}

/// Fixed-capacity, insertion-ordered traffic window backing the chart.
/// Eviction is internal: callers can only push and read in order.
#[derive(Debug, Clone, Default)]
pub struct TrafficHistory {
    samples: VecDeque<TrafficSample>,
}

impl TrafficHistory {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(MAX_TRAFFIC_POINTS + 1),
        }
    }

    /// Append a sample, dropping the oldest entries beyond capacity.
    pub fn push(&mut self, sample: TrafficSample) {
        self.samples.push_back(sample);
        while self.samples.len() > MAX_TRAFFIC_POINTS {
            self.samples.pop_front();
        }
    }

    /// Samples in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TrafficSample> {
        self.samples.iter()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn first(&self) -> Option<&TrafficSample> {
        self.samples.front()
    }

    pub fn last(&self) -> Option<&TrafficSample> {
        self.samples.back()
    }
}
