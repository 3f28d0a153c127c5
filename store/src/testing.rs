//! In-memory backends for unit tests.

use std::{
    collections::HashMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{Error, Result, SessionBackend};

/// A fixed wall clock so expiry boundaries can be asserted exactly.
pub(crate) fn fixed_now() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

#[derive(Default)]
pub(crate) struct MemoryBackend {
    records: Mutex<HashMap<String, (Vec<u8>, DateTime<Utc>)>>,
    sweeps: AtomicUsize,
}

impl MemoryBackend {
    pub(crate) fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub(crate) fn get(&self, token: &str) -> Option<(Vec<u8>, DateTime<Utc>)> {
        self.records.lock().unwrap().get(token).cloned()
    }

    pub(crate) fn sweeps(&self) -> usize {
        self.sweeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBackend for MemoryBackend {
    async fn create_table(&self) -> Result<()> {
        Ok(())
    }

    async fn find(&self, token: &str, now: DateTime<Utc>) -> Result<Option<Vec<u8>>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .get(token)
            .filter(|(_, expiry)| *expiry > now)
            .map(|(data, _)| data.clone()))
    }

    async fn upsert(&self, token: &str, data: &[u8], expiry: DateTime<Utc>) -> Result<()> {
        self.records
            .lock()
            .unwrap()
            .insert(token.to_string(), (data.to_vec(), expiry));
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.records.lock().unwrap().remove(token);
        Ok(())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|_, (_, expiry)| *expiry >= now);
        Ok((before - records.len()) as u64)
    }
}

/// Fails every operation, counting the sweeps it was asked to run.
#[derive(Default)]
pub(crate) struct FailingBackend {
    sweeps: AtomicUsize,
}

impl FailingBackend {
    pub(crate) fn sweeps(&self) -> usize {
        self.sweeps.load(Ordering::SeqCst)
    }

    fn unavailable() -> Error {
        Error::Backend("backend unavailable".into())
    }
}

#[async_trait]
impl SessionBackend for FailingBackend {
    async fn create_table(&self) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn find(&self, _token: &str, _now: DateTime<Utc>) -> Result<Option<Vec<u8>>> {
        Err(Self::unavailable())
    }

    async fn upsert(&self, _token: &str, _data: &[u8], _expiry: DateTime<Utc>) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn delete(&self, _token: &str) -> Result<()> {
        Err(Self::unavailable())
    }

    async fn delete_expired(&self, _now: DateTime<Utc>) -> Result<u64> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        Err(Self::unavailable())
    }
}

/// Never finishes a sweep, counting how many were started.
#[derive(Default)]
pub(crate) struct HangingBackend {
    sweeps: AtomicUsize,
}

impl HangingBackend {
    pub(crate) fn sweeps(&self) -> usize {
        self.sweeps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBackend for HangingBackend {
    async fn create_table(&self) -> Result<()> {
        Ok(())
    }

    async fn find(&self, _token: &str, _now: DateTime<Utc>) -> Result<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn upsert(&self, _token: &str, _data: &[u8], _expiry: DateTime<Utc>) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _token: &str) -> Result<()> {
        Ok(())
    }

    async fn delete_expired(&self, _now: DateTime<Utc>) -> Result<u64> {
        self.sweeps.fetch_add(1, Ordering::SeqCst);
        std::future::pending().await
    }
}
