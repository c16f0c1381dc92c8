use crate::push::SendRate;

use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    pub port: u16,
    pub vapid_public_key: Option<String>,
    pub vapid_private_key: Option<String>,
    pub vapid_subject: Option<String>,
    /// When set, notify endpoints require a matching X-API-KEY header.
    pub api_key: Option<String>,
    /// When set, subscriptions persist in this sqlite database instead of
    /// the in-memory store.
    pub database: Option<PathBuf>,
    /// Outbound throttle for the dispatcher; 0 disables the pause.
    pub sends_per_second: u32,
}

impl AppConfig {
    pub fn send_rate(&self) -> SendRate {
        SendRate::per_second(self.sends_per_second)
    }
}

#[cfg(test)]
impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            vapid_public_key: Some(
                "BCRweRf_U5iQM4pKNucGRzM6OuLp8Hisa8yX0N2ePIf1oxKitvFT6qvuGgYoTxlMatMDaytXbZR3rVClc2w_p6U"
                    .to_string(),
            ),
            vapid_private_key: Some("9pKJeIXAyyCj5M0QagsVvDYHlPF-cymJCbB5iHPsdEE".to_string()),
            vapid_subject: None,
            api_key: None,
            database: None,
            sends_per_second: 0,
        }
    }
}
