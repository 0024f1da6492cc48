//! Trigger bindings configuration.
//!
//! A bindings file maps trigger identifiers to the message each one sends:
//!
//! ```json
//! {
//!   "endpoint": { "host": "127.0.0.1", "port": 29200 },
//!   "bindings": { "F1": "LAMP_ON", "F2": "LAMP_OFF" }
//! }
//! ```
//!
//! `endpoint` is optional and defaults to `127.0.0.1:29200`.

// ============================================================================
// Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::identifiers::{EndpointId, TriggerId};

// ============================================================================
// Types
// ============================================================================

/// Bindings file as written on disk.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct BindingsFile {
    #[serde(default)]
    endpoint: Option<EndpointId>,
    bindings: BTreeMap<String, String>,
}

/// One trigger and the message it sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    /// Trigger name.
    pub trigger: TriggerId,
    /// Message text sent when the trigger fires.
    pub message: Arc<str>,
}

// ============================================================================
// Bindings
// ============================================================================

/// Validated trigger bindings plus the endpoint they target.
///
/// Bindings are kept sorted by trigger name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bindings {
    endpoint: EndpointId,
    bindings: Vec<Binding>,
}

impl Bindings {
    /// Builds bindings from `(trigger, message)` pairs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if there are no bindings, a trigger name
    /// is blank or padded with whitespace, a trigger appears twice, or a
    /// message contains a newline or NUL byte.
    pub fn new<I, T, M>(endpoint: EndpointId, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (T, M)>,
        T: AsRef<str>,
        M: AsRef<str>,
    {
        let mut sorted = BTreeMap::new();
        for (trigger, message) in pairs {
            let trigger = trigger.as_ref();
            let message = message.as_ref();
            validate(trigger, message)?;

            if sorted.insert(trigger.to_string(), message.to_string()).is_some() {
                return Err(Error::config(format!("Duplicate trigger: {trigger}")));
            }
        }

        if sorted.is_empty() {
            return Err(Error::config("No bindings configured"));
        }

        let bindings = sorted
            .into_iter()
            .map(|(trigger, message)| Binding {
                trigger: TriggerId::from(trigger),
                message: Arc::from(message),
            })
            .collect();

        Ok(Self { endpoint, bindings })
    }

    /// Parses bindings from JSON text.
    ///
    /// # Errors
    ///
    /// - [`Error::Json`] if the text is not a valid bindings document
    /// - [`Error::Config`] if validation fails
    pub fn from_json(text: &str) -> Result<Self> {
        let file: BindingsFile = serde_json::from_str(text)?;
        Self::new(file.endpoint.unwrap_or_default(), file.bindings)
    }

    /// Loads bindings from a JSON file.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] if the file cannot be read or fails validation
    /// - [`Error::Json`] if the file is not a valid bindings document
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|e| {
            Error::config(format!(
                "Cannot read bindings file {}: {e}",
                path.display()
            ))
        })?;

        let bindings = Self::from_json(&text)?;
        debug!(
            path = %path.display(),
            count = bindings.len(),
            endpoint = %bindings.endpoint,
            "Bindings loaded"
        );

        Ok(bindings)
    }

    /// Returns the target endpoint.
    #[inline]
    #[must_use]
    pub fn endpoint(&self) -> &EndpointId {
        &self.endpoint
    }

    /// Returns the message bound to `trigger`.
    #[must_use]
    pub fn message(&self, trigger: &str) -> Option<&str> {
        self.bindings
            .binary_search_by(|b| b.trigger.as_str().cmp(trigger))
            .ok()
            .map(|i| &*self.bindings[i].message)
    }

    /// Iterates over bindings in trigger order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.iter()
    }

    /// Returns the number of bindings.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Always `false` for validated bindings.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<'a> IntoIterator for &'a Bindings {
    type Item = &'a Binding;
    type IntoIter = std::slice::Iter<'a, Binding>;

    fn into_iter(self) -> Self::IntoIter {
        self.bindings.iter()
    }
}

// ============================================================================
// Validation
// ============================================================================

fn validate(trigger: &str, message: &str) -> Result<()> {
    if trigger.trim().is_empty() {
        return Err(Error::config("Trigger name must not be blank"));
    }

    if trigger.trim() != trigger {
        return Err(Error::config(format!(
            "Trigger name has surrounding whitespace: {trigger:?}"
        )));
    }

    // '\n' ends a command on the receiving side.
    if message.contains('\n') {
        return Err(Error::config(format!(
            "Message for {trigger} contains a newline"
        )));
    }

    if message.contains('\0') {
        return Err(Error::config(format!(
            "Message for {trigger} contains a NUL byte"
        )));
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
