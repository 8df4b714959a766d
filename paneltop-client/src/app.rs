use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;

use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use log::{debug, warn};
use ratatui::{Terminal, backend::CrosstermBackend};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::api::{PanelApi, QuickAction};
use crate::i18n::Locale;
use crate::poll;
use crate::state::DashState;
use crate::ui;

const REDRAW_INTERVAL: Duration = Duration::from_millis(250);

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub async fn run(
    api: Arc<PanelApi>,
    locale: Locale,
    status_interval: Duration,
    traffic_interval: Duration,
) -> anyhow::Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let res = event_loop(&mut terminal, api, locale, status_interval, traffic_interval).await;

    // Best-effort restore so an error above still leaves a usable terminal.
    disable_raw_mode().ok();
    stdout().execute(LeaveAlternateScreen).ok();

    res
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    api: Arc<PanelApi>,
    locale: Locale,
    status_interval: Duration,
    traffic_interval: Duration,
) -> anyhow::Result<()> {
    debug!(
        "locale {locale:?} reports {:?} text direction; the dashboard always renders ltr",
        locale.dir()
    );

    let mut state = DashState::default();
    let (events_tx, mut events_rx) = mpsc::channel(32);
    let cancel = CancellationToken::new();

    poll::spawn_version_probe(api.clone(), events_tx.clone());
    poll::spawn_status_poller(
        api.clone(),
        status_interval,
        events_tx.clone(),
        cancel.child_token(),
    );
    // The traffic poller starts only once the first status poll has settled.
    let mut traffic_started = false;

    let mut input = EventStream::new();
    let mut redraw = tokio::time::interval(REDRAW_INTERVAL);

    loop {
        terminal.draw(|frame| ui::draw(frame, &state, &locale))?;

        tokio::select! {
            maybe_event = input.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if handle_key(key, api.as_ref()) == Flow::Quit {
                            break;
                        }
                    }
                    Some(Ok(_)) => {} // resize etc; next draw picks it up
                    Some(Err(e)) => {
                        cancel.cancel();
                        return Err(e.into());
                    }
                    None => break,
                }
            }
            event = events_rx.recv() => {
                // We hold a sender, so the channel cannot be closed here.
                if let Some(event) = event {
                    state.apply(event);
                    if should_start_traffic(&state, traffic_started) {
                        poll::spawn_traffic_poller(
                            api.clone(),
                            traffic_interval,
                            events_tx.clone(),
                            cancel.child_token(),
                        );
                        traffic_started = true;
                    }
                }
            }
            _ = redraw.tick() => {}
        }
    }

    cancel.cancel();
    Ok(())
}

/// Whether this event-loop turn should spawn the traffic poller: only after
/// the first status poll has settled (loading cleared), and only once.
fn should_start_traffic(state: &DashState, traffic_started: bool) -> bool {
    !state.loading && !traffic_started
}

fn handle_key(key: KeyEvent, api: &PanelApi) -> Flow {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            return Flow::Quit;
        }
        KeyCode::Char('t') => open_action(api, QuickAction::CreateTunnel),
        KeyCode::Char('n') => open_action(api, QuickAction::AddNode),
        KeyCode::Char('s') => open_action(api, QuickAction::AddServer),
        _ => {}
    }
    Flow::Continue
}

fn open_action(api: &PanelApi, action: QuickAction) {
    let url = api.action_url(action);
    debug!("opening {url} in browser");
    if let Err(e) = open::that(&url) {
        warn!("failed to open {url}: {e}");
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::history::TrafficSample;
    use crate::state::PollEvent;
    use paneltop_proto::{PoolStats, StatusSnapshot, SystemStatus};

    fn snapshot() -> StatusSnapshot {
        StatusSnapshot {
            system: SystemStatus {
                cpu_percent: 10.0,
                memory_percent: 50.0,
                memory_total_gb: 16.0,
                memory_used_gb: 8.0,
            },
            tunnels: PoolStats { total: 1, active: 1 },
            nodes: PoolStats { total: 1, active: 1 },
        }
    }

    #[test]
    fn traffic_waits_for_first_status_poll() {
        let mut state = DashState::default();
        assert!(state.loading);
        assert!(!should_start_traffic(&state, false));

        // Events that do not settle the status poll keep the gate closed.
        state.apply(PollEvent::Version("0.1.0".to_owned()));
        assert!(!should_start_traffic(&state, false));
        state.apply(PollEvent::Sample(TrafficSample {
            time: "12:00:00".to_owned(),
            download: 0.0,
            upload: 0.0,
        }));
        assert!(!should_start_traffic(&state, false));
    }

    #[test]
    fn traffic_starts_once_status_settles() {
        let mut state = DashState::default();
        state.apply(PollEvent::Snapshot(snapshot()));
        assert!(should_start_traffic(&state, false));

        // A failed first poll also clears loading and opens the gate.
        let mut state = DashState::default();
        state.apply(PollEvent::SnapshotUnavailable);
        assert!(should_start_traffic(&state, false));
    }

    #[test]
    fn traffic_starts_only_once() {
        let mut state = DashState::default();
        state.apply(PollEvent::Snapshot(snapshot()));
        assert!(should_start_traffic(&state, false));
        assert!(!should_start_traffic(&state, true));

        // Later status events must not restart an already-running poller.
        state.apply(PollEvent::Snapshot(snapshot()));
        assert!(!should_start_traffic(&state, true));
        state.apply(PollEvent::SnapshotUnavailable);
        assert!(!should_start_traffic(&state, true));
    }
}
