//! Operation options
//!
//! Optional parameters of the write and mass-delete operations.

use std::collections::HashMap;

use crate::value::Data;

/// Options for `Client::set`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Return the value the key held before the write
    pub get_old_value: bool,

    /// Type spec applied to the returned old value (`"int"`, `"bool_any"`, ...)
    pub convert_old_value_to: Option<String>,

    /// Time to live in seconds
    pub ttl_seconds: Option<u64>,

    /// Time to live in milliseconds; with `ttl_seconds` the shorter wins
    pub ttl_ms: Option<u64>,

    /// Write only if the key already exists
    pub if_exists: bool,

    /// Write only if the key does not exist yet
    pub if_not_exists: bool,

    /// Keep the current expiry of an existing key
    pub keep_ttl: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_old_value(mut self) -> Self {
        self.get_old_value = true;
        self
    }

    pub fn convert_old_value_to(mut self, spec: impl Into<String>) -> Self {
        self.get_old_value = true;
        self.convert_old_value_to = Some(spec.into());
        self
    }

    pub fn ttl_seconds(mut self, seconds: u64) -> Self {
        self.ttl_seconds = Some(seconds);
        self
    }

    pub fn ttl_ms(mut self, ms: u64) -> Self {
        self.ttl_ms = Some(ms);
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn keep_ttl(mut self) -> Self {
        self.keep_ttl = true;
        self
    }
}

/// Options for `Client::mass_delete` and `Client::mass_unlink`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MassDeleteOptions {
    /// Report keys that existed and were removed
    pub return_existing: bool,

    /// Report keys that were not found
    pub return_missing: bool,

    /// Report removed keys with their values
    pub return_values: bool,

    /// Type spec applied to reported values
    pub convert_values_to: Option<String>,
}

impl MassDeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn return_existing(mut self) -> Self {
        self.return_existing = true;
        self
    }

    pub fn return_missing(mut self) -> Self {
        self.return_missing = true;
        self
    }

    pub fn return_values(mut self) -> Self {
        self.return_values = true;
        self
    }

    pub fn convert_values_to(mut self, spec: impl Into<String>) -> Self {
        self.return_values = true;
        self.convert_values_to = Some(spec.into());
        self
    }

    /// True when any report was requested
    pub fn wants_report(&self) -> bool {
        self.return_existing || self.return_missing || self.return_values
    }
}

/// Result of a mass delete; parts that were not requested stay empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MassDeleteOutcome {
    pub existing: Vec<String>,
    pub missing: Vec<String>,
    pub values: HashMap<String, Data>,
}
