#![forbid(unsafe_code)]

use std::sync::Arc;
use std::time::Duration;

use argh::FromArgs;
use log::LevelFilter;
use simple_logger::SimpleLogger;

use crate::api::PanelApi;
use crate::i18n::Locale;

mod api;
mod app;
mod history;
mod http_util;
mod i18n;
mod poll;
mod state;
mod ui;

#[derive(FromArgs, Debug)]
#[argh(description = "A terminal dashboard for the tunnel panel status API.")]
struct DashConfig {
    #[argh(
        option,
        short = 'a',
        default = "\"127.0.0.1:8000\".to_string()",
        description = "panel address to poll"
    )]
    pub panel_addr: String,
    #[argh(
        switch,
        short = 't',
        description = "use TLS to connect to the panel (https instead of http)"
    )]
    pub tls: bool,
    #[argh(
        switch,
        short = '6',
        description = "prefer IPv6 when resolving the panel address"
    )]
    pub prefer_ipv6: bool,
    #[argh(
        option,
        short = 'l',
        default = "Locale::En",
        description = "dashboard language (en or fa)"
    )]
    pub lang: Locale,
    #[argh(
        option,
        default = "5",
        description = "seconds between two status polls"
    )]
    pub status_interval: u64, // in seconds
    #[argh(
        option,
        default = "2",
        description = "seconds between two traffic polls"
    )]
    pub traffic_interval: u64, // in seconds
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Warn by default: the dashboard owns the terminal, so chatty logging
    // would scribble over the alternate screen.
    SimpleLogger::new().with_level(LevelFilter::Warn).env().init()?;

    let cfg: DashConfig = argh::from_env();
    log::debug!("Dashboard config: {cfg:#?}");

    let api = Arc::new(PanelApi::new(&cfg.panel_addr, cfg.tls, cfg.prefer_ipv6));

    app::run(
        api,
        cfg.lang,
        Duration::from_secs(cfg.status_interval),
        Duration::from_secs(cfg.traffic_interval),
    )
    .await
}
