//! Seams between the collectors and the session layer.
//!
//! Snapshots cross the seam as opaque `serde_json::Value` payloads; the only
//! contract is "a payload serializable to a single text frame, or an error".
//! Sessions and tests consume `Arc<dyn HostSource>` / `Arc<dyn NetworkSource>`
//! so fakes can stand in for the real machine.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::CollectError;
use crate::host::SystemCollector;
use crate::network::InterfaceCollector;

/// Blocking producer of host snapshots. Runs on the blocking pool.
pub trait HostSource: Send + Sync {
    /// Produce one push payload. Blocking.
    fn sample(&self) -> Result<Value, CollectError>;

    /// Produce the one-shot overview payload. Blocking.
    fn overview(&self) -> Result<Value, CollectError>;
}

/// Suspending producer of network snapshots. Runs on the scheduler.
#[async_trait]
pub trait NetworkSource: Send + Sync {
    /// Produce one push payload.
    async fn sample(&self) -> Result<Value, CollectError>;

    /// Produce the one-shot overview payload.
    async fn overview(&self) -> Result<Value, CollectError>;
}

impl HostSource for SystemCollector {
    fn sample(&self) -> Result<Value, CollectError> {
        Ok(serde_json::to_value(self.snapshot()?)?)
    }

    fn overview(&self) -> Result<Value, CollectError> {
        Ok(serde_json::to_value(SystemCollector::overview(self)?)?)
    }
}

#[async_trait]
impl NetworkSource for InterfaceCollector {
    async fn sample(&self) -> Result<Value, CollectError> {
        Ok(serde_json::to_value(InterfaceCollector::sample(self).await?)?)
    }

    async fn overview(&self) -> Result<Value, CollectError> {
        Ok(serde_json::to_value(InterfaceCollector::overview(self))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn network_overview_is_a_json_object() {
        let source: Arc<dyn NetworkSource> = Arc::new(InterfaceCollector::new(None));
        let value = source.overview().await.unwrap();
        assert!(value.is_object());
        assert!(value["interfaces"].is_array());
    }

    #[test]
    fn host_collector_is_a_source() {
        // Object safety: the concrete collector erases behind the trait.
        let source: Arc<dyn HostSource> = Arc::new(SystemCollector::new());
        let _ = Arc::clone(&source);
    }
}
