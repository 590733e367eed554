//! Scalar substitution of a single template string

use crate::env::Environment;
use crate::error::SubstitutionError;
use crate::token::{parse_tokens_in, Namespace};
use cc_model::Attributes;
use std::collections::HashMap;

/// Resolves `ENV` and (optionally) `ATTR` tokens
///
/// `VAR` tokens are never touched here; they belong to the per-call pass in
/// [`substitute_vars`].
#[derive(Clone, Copy)]
pub struct Substitutor<'a> {
    env: &'a dyn Environment,
    attributes: Option<&'a Attributes>,
}

impl std::fmt::Debug for Substitutor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Substitutor")
            .field("attributes_enabled", &self.attributes.is_some())
            .finish_non_exhaustive()
    }
}

impl<'a> Substitutor<'a> {
    /// Substitutor with ATTR resolution disabled
    #[inline]
    #[must_use]
    pub fn new(env: &'a dyn Environment) -> Self {
        Self {
            env,
            attributes: None,
        }
    }

    /// Enable ATTR resolution against `attributes`
    #[inline]
    #[must_use]
    pub fn with_attributes(mut self, attributes: &'a Attributes) -> Self {
        self.attributes = Some(attributes);
        self
    }

    /// Whether ATTR tokens are resolved
    #[inline]
    #[must_use]
    pub fn attributes_enabled(&self) -> bool {
        self.attributes.is_some()
    }

    /// Rewrite `template`
    ///
    /// Tokens are resolved left to right; each one replaces the first
    /// occurrence of its exact text in the partially rewritten string.
    ///
    /// # Errors
    /// - `SubstitutionError::MissingEnv` for an unset or empty variable
    /// - `SubstitutionError::MissingAttr` for an absent key while ATTR is enabled
    /// - `SubstitutionError::Malformed` for an invalid token
    pub fn substitute(&self, template: &str) -> Result<String, SubstitutionError> {
        let attributes_enabled = self.attributes.is_some();
        let tokens = parse_tokens_in(template, |ns| match ns {
            Namespace::Env => true,
            Namespace::Attr => attributes_enabled,
            Namespace::Var => false,
        })?;
        let mut output = template.to_string();

        for token in tokens {
            let value = match token.namespace {
                Namespace::Env => match self.env.var(&token.name) {
                    Some(value) if !value.is_empty() => value,
                    _ => {
                        return Err(SubstitutionError::MissingEnv {
                            token: token.text,
                            name: token.name,
                        })
                    }
                },
                Namespace::Attr => {
                    let Some(attributes) = self.attributes else {
                        continue;
                    };
                    match attributes.get(&token.name) {
                        Some(value) => value.to_string(),
                        None => {
                            return Err(SubstitutionError::MissingAttr {
                                token: token.text,
                                name: token.name,
                            })
                        }
                    }
                }
                Namespace::Var => continue,
            };
            output = output.replacen(&token.text, &value, 1);
        }

        Ok(output)
    }
}

/// Rewrite `VAR` tokens from per-call variables
///
/// Tokens naming a variable absent from `vars` stay in place; every other
/// namespace is ignored without validation.
///
/// # Errors
/// Returns `SubstitutionError::Malformed` for an invalid token.
pub fn substitute_vars(template: &str, vars: &HashMap<String, String>) -> Result<String, SubstitutionError> {
    if vars.is_empty() {
        return Ok(template.to_string());
    }

    let mut output = template.to_string();
    for token in parse_tokens_in(template, |ns| ns == Namespace::Var)? {
        if let Some(value) = vars.get(&token.name) {
            output = output.replacen(&token.text, value, 1);
        }
    }
    Ok(output)
}
