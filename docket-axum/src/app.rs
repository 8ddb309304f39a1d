use std::sync::Arc;

use axum::Router;
use docket_blob::UrlBroker;
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::BrokerState;

/// The broker's HTTP surface: routes plus CORS, request ids and tracing.
pub struct BrokerApp {
    pub broker: Arc<UrlBroker>,
    pub router: Router<()>,
}

impl Clone for BrokerApp {
    fn clone(&self) -> Self {
        Self {
            broker: Arc::clone(&self.broker),
            router: self.router.clone(),
        }
    }
}

impl BrokerApp {
    pub fn new(broker: UrlBroker) -> Self {
        let state = BrokerState::new(broker);
        let broker = Arc::clone(&state.broker);

        // Browsers upload straight from their own origin, so any origin may ask for URLs
        let router = routes::broker_router(state)
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );

        Self { broker, router }
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        self.serve(listener).await
    }

    /// Serve on an already bound listener.
    pub async fn serve(self, listener: TcpListener) -> anyhow::Result<()> {
        if let Ok(addr) = listener.local_addr() {
            tracing::info!(%addr, "broker listening");
        }
        axum::serve(listener, self.router).await?;
        Ok(())
    }
}

pub fn broker_app(broker: UrlBroker) -> BrokerApp {
    BrokerApp::new(broker)
}
