//! Pooled reqwest clients, one per workload
//!
//! Built on first use and shared for the life of the process. Per-request
//! timeouts from [`ClientConfig`](crate::config::ClientConfig) override the
//! builder defaults below.

use once_cell::sync::Lazy;
use reqwest::Client;
use std::time::Duration;

use super::transport::Workload;

/// Connection settings for one workload
struct PoolProfile {
    timeout: Duration,
    max_idle_per_host: usize,
    idle_timeout: Duration,
    keepalive: Option<Duration>,
}

impl Workload {
    fn pool_profile(self) -> PoolProfile {
        match self {
            // uploads are one at a time per workflow; the backend interprets synchronously
            Workload::Upload => PoolProfile {
                timeout: Duration::from_secs(120),
                max_idle_per_host: 4,
                idle_timeout: Duration::from_secs(90),
                keepalive: Some(Duration::from_secs(60)),
            },
            Workload::Chat => PoolProfile {
                timeout: Duration::from_secs(60),
                max_idle_per_host: 8,
                idle_timeout: Duration::from_secs(90),
                keepalive: Some(Duration::from_secs(60)),
            },
            Workload::Lookup => PoolProfile {
                timeout: Duration::from_secs(30),
                max_idle_per_host: 5,
                idle_timeout: Duration::from_secs(30),
                keepalive: None,
            },
        }
    }
}

fn build(workload: Workload) -> Client {
    let profile = workload.pool_profile();
    let mut builder = Client::builder()
        .timeout(profile.timeout)
        .pool_max_idle_per_host(profile.max_idle_per_host)
        .pool_idle_timeout(profile.idle_timeout)
        .tcp_nodelay(true);
    if let Some(keepalive) = profile.keepalive {
        builder = builder.tcp_keepalive(keepalive);
    }

    builder
        .build()
        .unwrap_or_else(|e| panic!("Failed to create {:?} HTTP client: {}", workload, e))
}

static UPLOAD_CLIENT: Lazy<Client> = Lazy::new(|| build(Workload::Upload));
static CHAT_CLIENT: Lazy<Client> = Lazy::new(|| build(Workload::Chat));
static LOOKUP_CLIENT: Lazy<Client> = Lazy::new(|| build(Workload::Lookup));

/// The shared client for a workload
pub fn client_for(workload: Workload) -> &'static Client {
    match workload {
        Workload::Upload => &*UPLOAD_CLIENT,
        Workload::Chat => &*CHAT_CLIENT,
        Workload::Lookup => &*LOOKUP_CLIENT,
    }
}
