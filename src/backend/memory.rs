//! Scripted in-memory backend.
//!
//! Answers from per-path scripts and counts every call.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use super::Backend;
use crate::error::FetchError;

type Reply = Result<Value, FetchError>;

#[derive(Debug, Default)]
struct Script {
    once: HashMap<String, VecDeque<Reply>>,
    always: HashMap<String, Reply>,
    calls: Vec<String>,
    posts: Vec<(String, Value)>,
}

#[derive(Debug, Default)]
pub struct MemoryBackend {
    script: Mutex<Script>,
    latency: Option<Duration>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delays every answer, so concurrent callers overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Answers every request to `path` with `reply` until changed.
    pub fn respond(&self, path: &str, reply: Reply) -> &Self {
        self.script().always.insert(path.to_string(), reply);
        self
    }

    /// Queues a one-shot answer for `path`, used before the standing one.
    pub fn respond_once(&self, path: &str, reply: Reply) -> &Self {
        self.script()
            .once
            .entry(path.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    /// Number of GETs and POSTs issued for `path`.
    pub fn calls(&self, path: &str) -> usize {
        self.script().calls.iter().filter(|p| p.as_str() == path).count()
    }

    /// Bodies POSTed to `path`, oldest first.
    pub fn posts(&self, path: &str) -> Vec<Value> {
        self.script()
            .posts
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }

    async fn answer(&self, path: &str) -> Reply {
        let reply = {
            let mut script = self.script();
            script.calls.push(path.to_string());
            let queued = script.once.get_mut(path).and_then(VecDeque::pop_front);
            queued
                .or_else(|| script.always.get(path).cloned())
                .unwrap_or_else(|| Err(FetchError::Permanent(format!("no route for {path}"))))
        };

        match self.latency {
            Some(latency) => tokio::time::sleep(latency).await,
            None => tokio::task::yield_now().await,
        }
        reply
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get(&self, path: &str, _query: &[(&str, &str)]) -> Result<Value, FetchError> {
        self.answer(path).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<Value, FetchError> {
        self.script().posts.push((path.to_string(), body));
        self.answer(path).await
    }
}
