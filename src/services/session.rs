use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{
    models::Identity,
    services::signals::{Signal, SignalBus},
};

/// The signed-in state of the client, as far as recommendations care
#[derive(Clone)]
pub struct Session {
    access_token: Arc<RwLock<Option<String>>>,
    bus: SignalBus,
}

impl Session {
    pub fn new(bus: SignalBus) -> Self {
        Self {
            access_token: Arc::new(RwLock::new(None)),
            bus,
        }
    }

    pub async fn login(&self, access_token: String) {
        *self.access_token.write().await = Some(access_token);
        let identity = self.identity().await;
        tracing::info!(identity = %identity, "Session started");
        self.bus.publish(Signal::AuthChanged);
    }

    pub async fn logout(&self) {
        *self.access_token.write().await = None;
        tracing::info!("Session ended");
        self.bus.publish(Signal::AuthChanged);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.access_token.read().await.is_some()
    }

    /// The namespace for the current session, anonymous when signed out
    pub async fn identity(&self) -> Identity {
        Identity::from_access_token(self.access_token.read().await.as_deref())
    }
}
