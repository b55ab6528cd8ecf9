//! Test doubles and common utilities for engine contract tests
//!
//! The doubles share their counters through `Arc`s, so a test can keep a
//! clone while the engine owns the boxed original.

#![allow(dead_code)]

use ddns_core::config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{DnsProvider, DnsRecord, IpSource};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// An IpSource that plays back scripted answers, then repeats a fallback
#[derive(Clone)]
pub struct ScriptedIpSource {
    script: Arc<Mutex<VecDeque<std::result::Result<IpAddr, String>>>>,
    fallback: IpAddr,
    call_count: Arc<AtomicUsize>,
}

impl ScriptedIpSource {
    /// Always answer with `ip`
    pub fn fixed(ip: IpAddr) -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            fallback: ip,
            call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Fail the next call with `message`
    pub fn then_fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    /// Answer the next call with `ip`
    pub fn then_return(self, ip: IpAddr) -> Self {
        self.script.lock().unwrap().push_back(Ok(ip));
        self
    }

    /// Get the number of times current() was called
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl IpSource for ScriptedIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.call_count.fetch_add(1, Ordering::SeqCst);
        match self.script.lock().unwrap().pop_front() {
            Some(Ok(ip)) => Ok(ip),
            Some(Err(message)) => Err(Error::ip_source(message)),
            None => Ok(self.fallback),
        }
    }

    fn source_name(&self) -> &'static str {
        "scripted"
    }
}

/// An edit the mock provider received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditCall {
    pub root: String,
    pub record_id: String,
    pub data: String,
}

/// A mock DnsProvider backed by an in-memory zone
#[derive(Clone)]
pub struct MockDnsProvider {
    records: Arc<Mutex<Vec<DnsRecord>>>,
    list_call_count: Arc<AtomicUsize>,
    listed_roots: Arc<Mutex<Vec<String>>>,
    edits: Arc<Mutex<Vec<EditCall>>>,
    fail_list: Arc<Mutex<Option<String>>>,
    fail_edit: Arc<Mutex<Option<String>>>,
}

impl MockDnsProvider {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records: Arc::new(Mutex::new(records)),
            list_call_count: Arc::new(AtomicUsize::new(0)),
            listed_roots: Arc::new(Mutex::new(Vec::new())),
            edits: Arc::new(Mutex::new(Vec::new())),
            fail_list: Arc::new(Mutex::new(None)),
            fail_edit: Arc::new(Mutex::new(None)),
        }
    }

    /// Make list_records() fail with `message`
    pub fn failing_list(self, message: &str) -> Self {
        *self.fail_list.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Make edit_record() fail with `message`
    pub fn failing_edit(self, message: &str) -> Self {
        *self.fail_edit.lock().unwrap() = Some(message.to_string());
        self
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Roots passed to list_records(), in order
    pub fn listed_roots(&self) -> Vec<String> {
        self.listed_roots.lock().unwrap().clone()
    }

    /// Edits received, in order (failed edits included)
    pub fn edits(&self) -> Vec<EditCall> {
        self.edits.lock().unwrap().clone()
    }

    /// Current zone contents
    pub fn records(&self) -> Vec<DnsRecord> {
        self.records.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, root: &str) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);
        self.listed_roots.lock().unwrap().push(root.to_string());

        if let Some(message) = self.fail_list.lock().unwrap().clone() {
            return Err(Error::provider("mock", message));
        }
        Ok(self.records())
    }

    async fn edit_record(
        &self,
        root: &str,
        record: &DnsRecord,
        new_ip: IpAddr,
    ) -> Result<DnsRecord> {
        self.edits.lock().unwrap().push(EditCall {
            root: root.to_string(),
            record_id: record.id.clone(),
            data: new_ip.to_string(),
        });

        if let Some(message) = self.fail_edit.lock().unwrap().clone() {
            return Err(Error::provider("mock", message));
        }

        let mut records = self.records.lock().unwrap();
        let stored = records
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| Error::not_found(record.id.clone()))?;
        stored.data = new_ip.to_string();
        Ok(stored.clone())
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Build a record for the mock zone
pub fn record(id: &str, record_type: &str, name: &str, data: &str) -> DnsRecord {
    DnsRecord {
        id: id.to_string(),
        record_type: record_type.to_string(),
        name: name.to_string(),
        data: data.to_string(),
        ttl: Some(1800),
    }
}

pub fn ip(text: &str) -> IpAddr {
    text.parse().expect("valid test address")
}

/// Helper to create a minimal DdnsConfig for testing
pub fn minimal_config(domain: &str) -> DdnsConfig {
    DdnsConfig {
        domain: domain.to_string(),
        ip_source: IpSourceConfig::default(),
        provider: ProviderConfig::digitalocean("test-token"),
        engine: EngineConfig {
            interval: Duration::from_secs(300),
            event_channel_capacity: 100,
        },
    }
}

/// Collect every event currently queued
pub fn drain_events(
    rx: &mut tokio::sync::mpsc::Receiver<ddns_core::EngineEvent>,
) -> Vec<ddns_core::EngineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
