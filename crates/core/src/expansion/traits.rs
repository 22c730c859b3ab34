use crate::error::Result;
use async_trait::async_trait;

/// A single neighbor record returned by a graph query. Exactly one of the
/// optional sub-records is populated per element, matching whichever node
/// kind the underlying query family returns (SPEC_FULL.md §6).
#[derive(Debug, Clone, Default)]
pub struct AssetRecord {
    pub device: Option<DeviceAsset>,
    pub user: Option<UserAsset>,
    pub process: Option<ProcessAsset>,
    pub ip: Option<IpAsset>,
    pub file: Option<FileAsset>,
}

#[derive(Debug, Clone)]
pub struct DeviceAsset {
    pub hostname: String,
}

#[derive(Debug, Clone)]
pub struct UserAsset {
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct ProcessAsset {
    pub process_name: String,
}

#[derive(Debug, Clone)]
pub struct IpAsset {
    pub ip: String,
}

#[derive(Debug, Clone)]
pub struct FileAsset {
    pub path: String,
}

/// Asset-relationship graph queries (SPEC_FULL.md §4.2.1, §6). Narrow
/// typed methods rather than one generic `run(template, params)` call, so
/// callers never downcast an untyped row.
#[async_trait]
pub trait GraphStore: Send + Sync {
    async fn query_ip_assets(&self, ip: &str) -> Result<Vec<AssetRecord>>;
    async fn query_user_assets(&self, username: &str) -> Result<Vec<AssetRecord>>;
    async fn query_device_assets(&self, hostname: &str) -> Result<Vec<AssetRecord>>;
    async fn query_file_assets(&self, path: &str) -> Result<Vec<AssetRecord>>;
}

/// A threat-intelligence match (SPEC_FULL.md §4.2.2, §6).
#[derive(Debug, Clone)]
pub struct ThreatIntelHit {
    pub threat_types: Vec<String>,
    pub confidence: f64,
    pub related_ips: Vec<String>,
    pub related_domains: Vec<String>,
    pub related_hashes: Vec<String>,
}

#[async_trait]
pub trait ThreatIntel: Send + Sync {
    async fn query_ip(&self, ip: &str) -> Result<Option<ThreatIntelHit>>;
    async fn query_domain(&self, domain: &str) -> Result<Option<ThreatIntelHit>>;
    async fn query_hash(&self, hash: &str) -> Result<Option<ThreatIntelHit>>;
}

/// One row of a counted-value timeseries query (SPEC_FULL.md §4.2.3, §4.2.4).
#[derive(Debug, Clone)]
pub struct CountedValue {
    pub value: String,
    pub count: u64,
}

#[async_trait]
pub trait Timeseries: Send + Sync {
    /// Anomalous login source IPs for a user in the last 7 days, top 10.
    async fn user_anomalous_logins(&self, username: &str) -> Result<Vec<CountedValue>>;
    /// Anomalous accessing usernames for an IP in the last 24 hours, top 15.
    async fn ip_anomalous_users(&self, ip: &str) -> Result<Vec<CountedValue>>;
    /// Anomalous processes observed on a device in the last 12 hours, top 10.
    async fn device_anomalous_processes(&self, hostname: &str) -> Result<Vec<CountedValue>>;
    /// Destination IPs an IP communicated with more than 5 times in the window, top 20.
    async fn ip_temporal_communications(&self, ip: &str, window_hours: i64) -> Result<Vec<CountedValue>>;
    /// Files a user accessed more than once in the window, top 15.
    async fn user_temporal_file_access(&self, username: &str, window_hours: i64) -> Result<Vec<CountedValue>>;
}

/// Optional ML-backed indicators consulted by the scorer (SPEC_FULL.md §4.3.4).
#[async_trait]
pub trait AnomalyModel: Send + Sync {
    async fn predict_anomaly(&self, entity: &crate::entity::Entity) -> Result<f64>;
    async fn predict_sequence(&self, tokens: &[String]) -> Result<f64>;
}
