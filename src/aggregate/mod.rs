//! Thread-safe deduplicating store of discovered addresses
//!
//! Pipelines record addresses concurrently; the store keeps one record per
//! lowercase address with every URL it was seen on.

use crate::extract::{ExtractedEmail, ExtractionMethod};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Everything known about one address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressRecord {
    /// URL of the first resource the address was recorded from
    pub first_seen_url: String,
    /// Every resource the address was recorded from
    pub source_urls: BTreeSet<String>,
    /// When the address was first recorded
    pub discovered_at: DateTime<Utc>,
    /// Extraction methods that produced the address
    pub methods: BTreeSet<ExtractionMethod>,
}

/// Immutable view of the aggregated results, ordered by address
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultSet {
    entries: BTreeMap<String, AddressRecord>,
}

impl ResultSet {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, address: &str) -> Option<&AddressRecord> {
        self.entries.get(address)
    }

    /// Iterates in address order
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AddressRecord)> {
        self.entries.iter()
    }
}

#[derive(Debug, Default)]
pub struct Aggregator {
    entries: Mutex<BTreeMap<String, AddressRecord>>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, AddressRecord>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records that `address` was seen on `source_url`
    ///
    /// Returns true if the address was new.
    pub fn record(&self, address: &str, source_url: &str) -> bool {
        self.insert(address, source_url, None)
    }

    /// Records an extracted address along with its method
    pub fn record_email(&self, email: &ExtractedEmail) -> bool {
        self.insert(&email.address, &email.source_url, Some(email.method))
    }

    fn insert(&self, address: &str, source_url: &str, method: Option<ExtractionMethod>) -> bool {
        let key = address.trim().to_lowercase();
        if key.is_empty() {
            return false;
        }

        let mut entries = self.lock();
        let mut is_new = false;
        let record = entries.entry(key).or_insert_with(|| {
            is_new = true;
            AddressRecord {
                first_seen_url: source_url.to_string(),
                source_urls: BTreeSet::new(),
                discovered_at: Utc::now(),
                methods: BTreeSet::new(),
            }
        });

        record.source_urls.insert(source_url.to_string());
        if let Some(method) = method {
            record.methods.insert(method);
        }

        is_new
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the current contents
    pub fn snapshot(&self) -> ResultSet {
        ResultSet {
            entries: self.lock().clone(),
        }
    }
}
