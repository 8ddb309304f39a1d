use docket_core::{DocketConfig, DocketConfigSnapshot};

pub const ENV_PREFIX: &str = "DOCKET__";

/// Defaults first, then `DOCKET__*` environment overrides.
pub fn load() -> DocketConfigSnapshot {
    let mut config = defaults();
    config.load_env(ENV_PREFIX);
    config.snapshot()
}

pub fn defaults() -> DocketConfig {
    let mut config = DocketConfig::new();

    // HTTP server
    config.set("http.host", "127.0.0.1");
    config.set("http.port", "4000");

    // Where `submit` finds the broker
    config.set("broker.url", docket_client::DEFAULT_BROKER_URL);

    // Storage
    config.set("storage.backend", "s3");
    config.set("local.port", "0");

    config
}

pub fn listen_addr(config: &DocketConfigSnapshot) -> String {
    let host = config.get_or("http.host", "127.0.0.1");
    let port = config.get_or("http.port", "4000");
    format!("{host}:{port}")
}
