use std::sync::Arc;

use docket_blob::UrlBroker;

pub struct BrokerState {
    pub broker: Arc<UrlBroker>,
}

impl Clone for BrokerState {
    fn clone(&self) -> Self {
        Self {
            broker: Arc::clone(&self.broker),
        }
    }
}

impl BrokerState {
    pub fn new(broker: UrlBroker) -> Self {
        Self {
            broker: Arc::new(broker),
        }
    }
}
