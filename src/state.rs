use crate::config::AppConfig;
use crate::push::VapidKeys;
use crate::store::Store;

use std::time::Instant;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub vapid: VapidKeys,
    pub store: Store,
    pub started_at: Instant,
}
