use paneltop_proto::{StatusSnapshot, TrafficRates, VersionInfo};
use serde::de::DeserializeOwned;

use crate::http_util;

/// Handle to the panel status API. Cheap to share; holds no connection.
#[derive(Debug)]
pub struct PanelApi {
    panel_addr: String,
    tls: bool,
    prefer_ipv6: bool,
}

/// The three dashboard shortcuts. Each maps to a panel web UI route whose
/// query string asks the target page to open its create/add form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickAction {
    CreateTunnel,
    AddNode,
    AddServer,
}

impl QuickAction {
    pub fn path(&self) -> &'static str {
        match self {
            QuickAction::CreateTunnel => "/tunnels?create=true",
            QuickAction::AddNode => "/nodes?add=true",
            QuickAction::AddServer => "/servers?add=true",
        }
    }

    pub fn label_key(&self) -> &'static str {
        match self {
            QuickAction::CreateTunnel => "dashboard.createNewTunnel",
            QuickAction::AddNode => "dashboard.addNode",
            QuickAction::AddServer => "dashboard.addServer",
        }
    }
}

impl PanelApi {
    pub fn new(panel_addr: &str, tls: bool, prefer_ipv6: bool) -> Self {
        Self {
            panel_addr: panel_addr.to_owned(),
            tls,
            prefer_ipv6,
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}://{}{path}",
            if self.tls { "https" } else { "http" },
            self.panel_addr
        )
    }

    /// Browser-facing URL for a quick action, served by the same panel host.
    pub fn action_url(&self, action: QuickAction) -> String {
        self.url(action.path())
    }

    pub async fn fetch_status(&self) -> anyhow::Result<StatusSnapshot> {
        self.get_json("/status").await
    }

    pub async fn fetch_traffic(&self) -> anyhow::Result<TrafficRates> {
        self.get_json("/status/traffic").await
    }

    pub async fn fetch_version(&self) -> anyhow::Result<VersionInfo> {
        self.get_json("/status/version").await
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let req = http_util::get_request(&self.url(path))?;
        let resp = http_util::send_request(req, self.tls, self.prefer_ipv6).await?;

        if !resp.status().is_success() {
            anyhow::bail!(
                "panel returned [{}] for {path}: {}",
                resp.status().as_u16(),
                String::from_utf8_lossy(resp.body())
            );
        }

        Ok(serde_json::from_slice(resp.body())?)
    }
}
