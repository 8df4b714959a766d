use std::str::FromStr;

/// Text direction reported by a locale. The dashboard itself always renders
/// left-to-right; direction is surfaced for callers that care.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dir {
    Ltr,
    Rtl,
}

/// Dashboard languages. Lookup is keyed by the panel's fixed dotted paths
/// (`dashboard.title`, ...); unknown keys fall back to the key itself so a
/// missing translation shows up on screen instead of crashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locale {
    En,
    Fa,
}

impl FromStr for Locale {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "fa" => Ok(Locale::Fa),
            _ => Err("unsupported language, expected \"en\" or \"fa\""),
        }
    }
}

impl Locale {
    pub fn dir(&self) -> Dir {
        match self {
            Locale::En => Dir::Ltr,
            Locale::Fa => Dir::Rtl,
        }
    }

    pub fn text<'a>(&self, key: &'a str) -> &'a str {
        let translated = match self {
            Locale::En => en(key),
            Locale::Fa => fa(key),
        };
        translated.unwrap_or(key)
    }
}

fn en(key: &str) -> Option<&'static str> {
    Some(match key {
        "dashboard.title" => "Dashboard",
        "dashboard.subtitle" => "Overview of your tunnels, nodes and system resources",
        "dashboard.loadingDashboard" => "Loading dashboard...",
        "dashboard.totalNodes" => "Total Nodes",
        "dashboard.totalTunnels" => "Total Tunnels",
        "dashboard.cpuUsage" => "CPU Usage",
        "dashboard.memoryUsage" => "Memory Usage",
        "dashboard.currentUsage" => "Current usage",
        "dashboard.active" => "active",
        "dashboard.liveTraffic" => "Live Traffic",
        "dashboard.systemResources" => "System Resources",
        "dashboard.quickActions" => "Quick Actions",
        "dashboard.createNewTunnel" => "Create New Tunnel",
        "dashboard.addNode" => "Add Node",
        "dashboard.addServer" => "Add Server",
        "dashboard.samplingTraffic" => "Sampling traffic...",
        _ => return None,
    })
}

fn fa(key: &str) -> Option<&'static str> {
    Some(match key {
        "dashboard.title" => "داشبورد",
        "dashboard.subtitle" => "نمای کلی تونل‌ها، نودها و منابع سیستم",
        "dashboard.loadingDashboard" => "در حال بارگذاری داشبورد...",
        "dashboard.totalNodes" => "کل نودها",
        "dashboard.totalTunnels" => "کل تونل‌ها",
        "dashboard.cpuUsage" => "مصرف پردازنده",
        "dashboard.memoryUsage" => "مصرف حافظه",
        "dashboard.currentUsage" => "مصرف فعلی",
        "dashboard.active" => "فعال",
        "dashboard.liveTraffic" => "ترافیک زنده",
        "dashboard.systemResources" => "منابع سیستم",
        "dashboard.quickActions" => "دسترسی سریع",
        "dashboard.createNewTunnel" => "ساخت تونل جدید",
        "dashboard.addNode" => "افزودن نود",
        "dashboard.addServer" => "افزودن سرور",
        "dashboard.samplingTraffic" => "در حال نمونه‌برداری ترافیک...",
        _ => return None,
    })
}
