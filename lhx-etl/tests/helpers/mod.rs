//! Test Helper Utilities
//!
//! Shared utilities for testing lhx-etl: fixture loading and a scripted
//! fetcher that records every request it receives.

#![allow(dead_code)]

use async_trait::async_trait;
use lhx_etl::cache::{CacheKey, Fetcher};
use lhx_etl::error::FetchError;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

/// Read a file from `tests/fixtures`
pub fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("fixture {} unreadable: {}", path.display(), e))
}

/// Scripted answer for one key
#[derive(Debug, Clone)]
pub enum Reply {
    Body(String),
    Transient,
    RateLimited,
    Permanent(u16),
}

/// Fetcher answering from a fixed table; unknown keys get a 404
#[derive(Default)]
pub struct StubFetcher {
    replies: HashMap<CacheKey, Reply>,
    calls: Mutex<Vec<CacheKey>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, key: CacheKey, body: impl Into<String>) -> Self {
        self.replies.insert(key, Reply::Body(body.into()));
        self
    }

    pub fn with_reply(mut self, key: CacheKey, reply: Reply) -> Self {
        self.replies.insert(key, reply);
        self
    }

    /// Every key requested so far, in order
    pub fn calls(&self) -> Vec<CacheKey> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_for(&self, key: &CacheKey) -> usize {
        self.calls.lock().unwrap().iter().filter(|k| *k == key).count()
    }
}

#[async_trait]
impl Fetcher for StubFetcher {
    async fn fetch(&self, key: &CacheKey) -> Result<String, FetchError> {
        self.calls.lock().unwrap().push(key.clone());

        match self.replies.get(key) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Transient) => Err(FetchError::Transient("connection reset".into())),
            Some(Reply::RateLimited) => Err(FetchError::RateLimited { retry_after: None }),
            Some(Reply::Permanent(status)) => Err(FetchError::Permanent {
                status: *status,
                message: "rejected".into(),
            }),
            None => Err(FetchError::Permanent {
                status: 404,
                message: format!("no reply scripted for {}", key),
            }),
        }
    }
}
