use std::sync::Arc;
use std::time::Duration;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::api::PanelApi;
use crate::history::TrafficSample;
use crate::state::PollEvent;

/// Poll `/status` immediately and then once per `interval`. Failures are
/// logged and reported as [`PollEvent::SnapshotUnavailable`]; the next tick
/// is the only retry mechanism.
pub fn spawn_status_poller(
    api: Arc<PanelApi>,
    interval: Duration,
    events: mpsc::Sender<PollEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let tick = Instant::now();
            let event = match api.fetch_status().await {
                Ok(snapshot) => PollEvent::Snapshot(snapshot),
                Err(e) => {
                    warn!("status fetch failed: {e}");
                    PollEvent::SnapshotUnavailable
                }
            };

            // A closed channel means the view is gone; stop instead of
            // writing into the void.
            if events.send(event).await.is_err() {
                return;
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep_until(tick + interval) => {}
            }
        }
    })
}

/// Poll `/status/traffic` immediately and then once per `interval`. Spawned
/// only after the first status poll has settled. A failed tick appends
/// nothing and surfaces nothing.
pub fn spawn_traffic_poller(
    api: Arc<PanelApi>,
    interval: Duration,
    events: mpsc::Sender<PollEvent>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let tick = Instant::now();
            match api.fetch_traffic().await {
                Ok(rates) => {
                    let sample = TrafficSample::at_now(&rates);
                    if events.send(PollEvent::Sample(sample)).await.is_err() {
                        return;
                    }
                }
                Err(e) => debug!("traffic fetch failed, skipping tick: {e}"),
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = sleep_until(tick + interval) => {}
            }
        }
    })
}

/// One-shot `/status/version` probe. Best effort: a failure leaves the
/// header without a version and is only logged.
pub fn spawn_version_probe(api: Arc<PanelApi>, events: mpsc::Sender<PollEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        match api.fetch_version().await {
            Ok(info) => {
                let _ = events.send(PollEvent::Version(info.version)).await;
            }
            Err(e) => debug!("version fetch failed: {e}"),
        }
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const STATUS_BODY: &str = r#"{"system":{"cpu_percent":1.0,"memory_percent":2.0,"memory_total_gb":3.0,"memory_used_gb":4.0},"tunnels":{"total":0,"active":0},"nodes":{"total":0,"active":0}}"#;

    /// Serve canned JSON forever, counting requests.
    fn spawn_counting_panel(
        listener: TcpListener,
        body: &'static str,
        hits: Arc<AtomicUsize>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let Ok((mut socket, _)) = listener.accept().await else {
                    return;
                };
                hits.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 1024];
                let _ = socket.read(&mut buf).await;
                let resp = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(resp.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        })
    }

    #[tokio::test]
    async fn status_poller_fetches_once_before_first_interval() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let panel = spawn_counting_panel(listener, STATUS_BODY, hits.clone());

        let api = Arc::new(PanelApi::new(&addr.to_string(), false, false));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        // Interval far longer than the test, so any second hit would be a bug.
        let poller = spawn_status_poller(api, Duration::from_secs(60), tx, cancel.clone());

        let event = rx.recv().await.expect("first poll event");
        assert!(matches!(event, PollEvent::Snapshot(_)));

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        cancel.cancel();
        poller.await.expect("poller exits");
        panel.abort();
    }

    #[tokio::test]
    async fn status_poller_reports_unavailable_on_failure() {
        // Nothing listening on this address.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let api = Arc::new(PanelApi::new(&addr.to_string(), false, false));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let poller = spawn_status_poller(api, Duration::from_secs(60), tx, cancel.clone());

        let event = rx.recv().await.expect("first poll event");
        assert!(matches!(event, PollEvent::SnapshotUnavailable));

        cancel.cancel();
        poller.await.expect("poller exits");
    }

    #[tokio::test]
    async fn traffic_poller_skips_failed_ticks_silently() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        drop(listener);

        let api = Arc::new(PanelApi::new(&addr.to_string(), false, false));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let poller = spawn_traffic_poller(api, Duration::from_millis(50), tx, cancel.clone());

        // Give it a few ticks; no event may arrive for failed fetches.
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert!(rx.try_recv().is_err());

        cancel.cancel();
        poller.await.expect("poller exits");
    }

    #[tokio::test]
    async fn traffic_poller_emits_samples() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let panel = spawn_counting_panel(listener, r#"{"rx_mbps":2.0}"#, hits.clone());

        let api = Arc::new(PanelApi::new(&addr.to_string(), false, false));
        let (tx, mut rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let poller = spawn_traffic_poller(api, Duration::from_secs(60), tx, cancel.clone());

        let event = rx.recv().await.expect("sample event");
        match event {
            PollEvent::Sample(sample) => {
                assert_eq!(sample.download, 2.0);
                assert_eq!(sample.upload, 0.0);
            }
            other => panic!("unexpected event: {other:?}"),
        }

        cancel.cancel();
        poller.await.expect("poller exits");
        panel.abort();
    }

    #[tokio::test]
    async fn poller_stops_when_view_is_gone() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let hits = Arc::new(AtomicUsize::new(0));
        let panel = spawn_counting_panel(listener, STATUS_BODY, hits.clone());

        let api = Arc::new(PanelApi::new(&addr.to_string(), false, false));
        let (tx, rx) = mpsc::channel(8);
        let cancel = CancellationToken::new();
        let poller = spawn_status_poller(api, Duration::from_millis(10), tx, cancel);

        // Dropping the receiver simulates the view tearing down while a
        // fetch is in flight; the poller must exit on its own.
        drop(rx);
        poller.await.expect("poller exits without cancel");
        panel.abort();
    }
}
