//! Substitution errors

/// Errors raised while rewriting templates
///
/// Any of these aborts the whole substitution pass.
#[derive(Debug, thiserror::Error)]
pub enum SubstitutionError {
    /// `ENV` token whose variable is unset or empty
    #[error("missing environment parameter {name} in {token}")]
    MissingEnv {
        /// Full token text
        token: String,
        /// Variable name
        name: String,
    },

    /// `ATTR` token whose key is absent while ATTR resolution is enabled
    #[error("missing payload attribute {name} in {token}")]
    MissingAttr {
        /// Full token text
        token: String,
        /// Attribute name
        name: String,
    },

    /// Token that does not follow `{NAMESPACE::NAME[indexer]}`
    #[error("malformed substitution token {token}: {reason}")]
    Malformed {
        /// Full token text
        token: String,
        /// What is wrong with it
        reason: String,
    },

    /// Error located inside a particular attribute or data source
    #[error("{location}: {source}")]
    At {
        /// Where the failing template lives
        location: String,
        /// Underlying error
        #[source]
        source: Box<SubstitutionError>,
    },
}

impl SubstitutionError {
    /// Create malformed-token error
    pub fn malformed(token: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Malformed {
            token: token.into(),
            reason: reason.into(),
        }
    }

    /// Wrap with the location of the failing template
    #[must_use]
    pub fn at(self, location: impl Into<String>) -> Self {
        Self::At {
            location: location.into(),
            source: Box::new(self),
        }
    }

    /// Innermost error, without location wrappers
    #[must_use]
    pub fn root_cause(&self) -> &SubstitutionError {
        match self {
            Self::At { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
