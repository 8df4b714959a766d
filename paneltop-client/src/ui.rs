use paneltop_proto::StatusSnapshot;
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, Gauge, GraphType, Paragraph},
};

use crate::api::QuickAction;
use crate::history::TrafficHistory;
use crate::i18n::Locale;
use crate::state::DashState;

/// Render one frame of the dashboard. Pure mapping from state to widgets;
/// the layout always runs left-to-right regardless of the locale's direction.
pub fn draw(frame: &mut Frame, state: &DashState, locale: &Locale) {
    let Some(snapshot) = state.snapshot.as_ref().filter(|_| !state.loading) else {
        draw_loading(frame, locale);
        return;
    };

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(8),
            Constraint::Length(7),
        ])
        .split(frame.area());

    draw_header(frame, rows[0], state, locale);
    draw_stat_cards(frame, rows[1], snapshot, locale);
    draw_traffic_chart(frame, rows[2], &state.history, locale);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[3]);

    draw_resource_gauges(frame, bottom[0], snapshot, locale);
    draw_quick_actions(frame, bottom[1], locale);
}

fn draw_loading(frame: &mut Frame, locale: &Locale) {
    let area = frame.area();
    let message = Paragraph::new(locale.text("dashboard.loadingDashboard"))
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::DarkGray));

    // Vertically center the message.
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage(50),
            Constraint::Length(1),
            Constraint::Percentage(50),
        ])
        .split(area);
    frame.render_widget(message, rows[1]);
}

fn draw_header(frame: &mut Frame, area: Rect, state: &DashState, locale: &Locale) {
    let mut title = vec![Span::styled(
        locale.text("dashboard.title"),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(version) = &state.panel_version {
        title.push(Span::styled(
            format!("  v{version}"),
            Style::default().fg(Color::DarkGray),
        ));
    }
    title.push(Span::styled(
        "  (q to quit)",
        Style::default().fg(Color::DarkGray),
    ));

    let header = Paragraph::new(vec![
        Line::from(title),
        Line::from(Span::styled(
            locale.text("dashboard.subtitle"),
            Style::default().fg(Color::DarkGray),
        )),
    ]);
    frame.render_widget(header, area);
}

fn draw_stat_cards(frame: &mut Frame, area: Rect, snapshot: &StatusSnapshot, locale: &Locale) {
    let cards = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
            Constraint::Percentage(25),
        ])
        .split(area);

    let active = locale.text("dashboard.active");

    draw_stat_card(
        frame,
        cards[0],
        locale.text("dashboard.totalNodes"),
        snapshot.nodes.total.to_string(),
        active_subtitle(snapshot.nodes.active, active),
        Color::Blue,
    );
    draw_stat_card(
        frame,
        cards[1],
        locale.text("dashboard.totalTunnels"),
        snapshot.tunnels.total.to_string(),
        active_subtitle(snapshot.tunnels.active, active),
        Color::Green,
    );
    draw_stat_card(
        frame,
        cards[2],
        locale.text("dashboard.cpuUsage"),
        percent_label(snapshot.system.cpu_percent),
        locale.text("dashboard.currentUsage").to_owned(),
        Color::Magenta,
    );
    draw_stat_card(
        frame,
        cards[3],
        locale.text("dashboard.memoryUsage"),
        gb_label(snapshot.system.memory_used_gb),
        memory_subtitle(snapshot.system.memory_percent, snapshot.system.memory_total_gb),
        Color::Yellow,
    );
}

fn draw_stat_card(
    frame: &mut Frame,
    area: Rect,
    title: &str,
    value: String,
    subtitle: String,
    accent: Color,
) {
    let card = Paragraph::new(vec![
        Line::from(Span::styled(
            value,
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(subtitle, Style::default().fg(Color::DarkGray))),
    ])
    .block(Block::default().borders(Borders::ALL).title(title));
    frame.render_widget(card, area);
}

fn draw_traffic_chart(frame: &mut Frame, area: Rect, history: &TrafficHistory, locale: &Locale) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("{} (Mbps)", locale.text("dashboard.liveTraffic")));

    if history.is_empty() {
        let placeholder = Paragraph::new(locale.text("dashboard.samplingTraffic"))
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(placeholder, area);
        return;
    }

    let download: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.download))
        .collect();
    let upload: Vec<(f64, f64)> = history
        .iter()
        .enumerate()
        .map(|(i, s)| (i as f64, s.upload))
        .collect();

    let y_max = chart_ceiling(history);
    let x_max = (history.len().saturating_sub(1)).max(1) as f64;

    let datasets = vec![
        Dataset::default()
            .name("Download")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Green))
            .data(&download),
        Dataset::default()
            .name("Upload")
            .marker(symbols::Marker::Braille)
            .graph_type(GraphType::Line)
            .style(Style::default().fg(Color::Blue))
            .data(&upload),
    ];

    let x_labels: Vec<String> = match (history.first(), history.last()) {
        (Some(first), Some(last)) if history.len() > 1 => {
            vec![first.time.clone(), last.time.clone()]
        }
        (Some(only), _) => vec![only.time.clone()],
        _ => vec![],
    };

    let chart = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(Color::DarkGray))
                .bounds([0.0, y_max])
                .labels(vec!["0".to_owned(), format!("{y_max:.1}")]),
        );
    frame.render_widget(chart, area);
}

fn draw_resource_gauges(frame: &mut Frame, area: Rect, snapshot: &StatusSnapshot, locale: &Locale) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(locale.text("dashboard.systemResources"));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(2),
        ])
        .split(inner);

    let cpu = Gauge::default()
        .block(Block::default().title("CPU"))
        .gauge_style(Style::default().fg(Color::Magenta))
        .ratio(gauge_ratio(snapshot.system.cpu_percent))
        .label(percent_label(snapshot.system.cpu_percent));
    frame.render_widget(cpu, rows[0]);

    let memory = Gauge::default()
        .block(Block::default().title("Memory"))
        .gauge_style(Style::default().fg(Color::Yellow))
        .ratio(gauge_ratio(snapshot.system.memory_percent))
        .label(percent_label(snapshot.system.memory_percent));
    frame.render_widget(memory, rows[2]);
}

fn draw_quick_actions(frame: &mut Frame, area: Rect, locale: &Locale) {
    let key_style = Style::default()
        .fg(Color::Cyan)
        .add_modifier(Modifier::BOLD);
    let shortcuts = [
        ('t', QuickAction::CreateTunnel),
        ('n', QuickAction::AddNode),
        ('s', QuickAction::AddServer),
    ];
    let lines: Vec<Line> = shortcuts
        .into_iter()
        .map(|(key, action)| {
            Line::from(vec![
                Span::styled(format!("[{key}] "), key_style),
                Span::raw(locale.text(action.label_key())),
            ])
        })
        .collect();

    let actions = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .title(locale.text("dashboard.quickActions")),
    );
    frame.render_widget(actions, area);
}

/// `42.3` -> `"42.3%"`. Never clamped: the label stays truthful even when
/// the gauge bar saturates.
fn percent_label(value: f64) -> String {
    format!("{value:.1}%")
}

/// Gauge fill for a 0-100 percentage, clamped so out-of-range readings
/// cannot push the bar past its bounds.
fn gauge_ratio(value: f64) -> f64 {
    (value / 100.0).clamp(0.0, 1.0)
}

fn gb_label(value: f64) -> String {
    format!("{value:.1} GB")
}

fn active_subtitle(active: u64, active_label: &str) -> String {
    format!("{active} {active_label}")
}

fn memory_subtitle(percent: f64, total_gb: f64) -> String {
    format!("{} of {}", percent_label(percent), gb_label(total_gb))
}

/// Upper y bound for the traffic chart: the window maximum with a little
/// headroom, never below 1 Mbps so a quiet link still gets a sane axis.
fn chart_ceiling(history: &TrafficHistory) -> f64 {
    let max = history
        .iter()
        .map(|s| s.download.max(s.upload))
        .fold(0.0_f64, f64::max);
    (max * 1.1).max(1.0)
}
