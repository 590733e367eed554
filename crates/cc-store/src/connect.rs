//! The connect phase
//!
//! Runs once per payload, sequentially: job-level stores first, then each
//! action's stores in declaration order. Any failure aborts.

use crate::error::ConnectError;
use crate::registry::StoreTypeRegistry;
use cc_model::{DataStore, Payload};

/// Outcome of a successful connect phase
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectSummary {
    /// Stores that received a session, in connection order
    pub connected: Vec<String>,
    /// Stores whose type has no connect capability
    pub path_only: Vec<String>,
}

impl ConnectSummary {
    /// Total number of stores visited
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.connected.len() + self.path_only.len()
    }

    fn merge(&mut self, other: Self) {
        self.connected.extend(other.connected);
        self.path_only.extend(other.path_only);
    }
}

/// Connect every store in `stores`, in order
///
/// # Errors
/// - `ConnectError::UnknownStoreType` if a store type is not registered
/// - `ConnectError::Upstream` if a backend refuses the connection
/// - `ConnectError::AlreadyConnected` if a store already carries a session
pub fn connect_stores(stores: &[DataStore], registry: &StoreTypeRegistry) -> Result<ConnectSummary, ConnectError> {
    let mut summary = ConnectSummary::default();

    for store in stores {
        if store.is_connected() {
            return Err(ConnectError::AlreadyConnected(store.name.clone()));
        }

        let instance = registry.create(&store.name, &store.store_type)?;
        let Some(connector) = instance.connector() else {
            tracing::debug!(store = %store.name, store_type = %store.store_type, "store type has no connect capability");
            summary.path_only.push(store.name.clone());
            continue;
        };

        let session = connector.connect(store).map_err(|source| ConnectError::Upstream {
            store: store.name.clone(),
            source,
        })?;
        store
            .bind_session(session)
            .map_err(|_| ConnectError::AlreadyConnected(store.name.clone()))?;

        tracing::info!(store = %store.name, store_type = %store.store_type, "connected store");
        summary.connected.push(store.name.clone());
    }

    Ok(summary)
}

/// Connect every store a payload declares
///
/// # Errors
/// Returns the first `ConnectError`; stores visited before it keep their
/// sessions.
pub fn connect_payload(payload: &Payload, registry: &StoreTypeRegistry) -> Result<ConnectSummary, ConnectError> {
    let mut summary = connect_stores(&payload.io.stores, registry)?;

    for action in &payload.actions {
        let action_summary = connect_stores(&action.io.stores, registry)?;
        if action_summary.total() > 0 {
            tracing::debug!(action = %action.name, stores = action_summary.total(), "connected action stores");
        }
        summary.merge(action_summary);
    }

    tracing::info!(
        connected = summary.connected.len(),
        path_only = summary.path_only.len(),
        "connect phase complete"
    );
    Ok(summary)
}
