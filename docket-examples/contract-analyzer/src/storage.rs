use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use docket_blob::{
    CapabilitySigner, LocalSignedUrlStore, MemoryObjectStore, S3CompatibleStore, S3Config,
};
use docket_core::DocketConfigSnapshot;

/// Pick the signer named by `storage.backend`.
pub async fn signer(config: &DocketConfigSnapshot) -> Result<Arc<dyn CapabilitySigner>> {
    let backend = config.get_or("storage.backend", "s3");

    match backend.as_str() {
        "s3" => {
            let s3 = S3Config::from_config(config)?;
            tracing::info!(bucket = %s3.bucket, region = %s3.region, "signing against s3");
            Ok(Arc::new(S3CompatibleStore::new(s3).await))
        }
        "local" => {
            let port = config.get_u64("local.port")?.unwrap_or(0);
            let port = u16::try_from(port).map_err(|_| anyhow!("local.port {port} is out of range"))?;
            let store = LocalSignedUrlStore::bind(
                Arc::new(MemoryObjectStore::new()),
                SocketAddr::from(([127, 0, 0, 1], port)),
            )
            .await?;
            Ok(Arc::new(store))
        }
        other => Err(anyhow!("unknown storage.backend {other:?} (expected \"s3\" or \"local\")")),
    }
}
