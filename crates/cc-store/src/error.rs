//! Connection errors

use cc_model::StoreError;

/// Errors during the connect phase
///
/// Any of these aborts initialisation.
#[derive(Debug, thiserror::Error)]
pub enum ConnectError {
    /// Store declares a type nobody registered
    #[error("store {store}: no store type registered for '{store_type}'")]
    UnknownStoreType {
        /// Store name
        store: String,
        /// Declared store type
        store_type: String,
    },

    /// Backend connect capability failed
    #[error("store {store}: {source}")]
    Upstream {
        /// Store name
        store: String,
        /// Backend error
        #[source]
        source: StoreError,
    },

    /// Store already carries a session
    #[error("store {0} is already connected")]
    AlreadyConnected(String),
}

impl ConnectError {
    /// Name of the store that failed to connect
    #[must_use]
    pub fn store(&self) -> &str {
        match self {
            Self::UnknownStoreType { store, .. } | Self::Upstream { store, .. } => store,
            Self::AlreadyConnected(store) => store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_store() {
        let err = ConnectError::UnknownStoreType {
            store: "FFRD".to_string(),
            store_type: "NOPE".to_string(),
        };
        assert_eq!(err.to_string(), "store FFRD: no store type registered for 'NOPE'");
        assert_eq!(err.store(), "FFRD");
    }
}
