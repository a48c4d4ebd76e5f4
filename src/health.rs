use serde::Serialize;
use std::sync::LazyLock;
use std::time::SystemTime;

use crate::store::StoreStatus;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub store: StoreStatus,
}

static START_TIME: LazyLock<SystemTime> = LazyLock::new(SystemTime::now);

pub struct HealthChecker {
    store_status: StoreStatus,
}

impl HealthChecker {
    pub fn new(store_status: StoreStatus) -> Self {
        LazyLock::force(&START_TIME);
        Self { store_status }
    }

    pub fn check_health(&self) -> HealthStatus {
        let now = SystemTime::now();
        let uptime = now.duration_since(*START_TIME).unwrap_or_default().as_secs();

        HealthStatus {
            status: "healthy".to_string(),
            timestamp: now
                .duration_since(SystemTime::UNIX_EPOCH)
                .unwrap_or_default()
                .as_secs(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: uptime,
            store: self.store_status.clone(),
        }
    }
}
