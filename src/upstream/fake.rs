//! Scripted in-memory `Fetcher` for unit tests

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::Fetcher;
use crate::error::{BridgeError, Result};

#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Status(u16),
}

/// Routes are keyed by URL path for GET and `path#<first equipmentId>` for POST
#[derive(Default)]
pub struct FakeFetcher {
    routes: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&self, key: impl Into<String>, reply: Reply) {
        self.routes.lock().unwrap().insert(key.into(), reply);
    }

    pub fn json(&self, key: impl Into<String>, body: Value) {
        self.route(key, Reply::Json(body));
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    fn answer(&self, key: String) -> Result<Value> {
        self.calls.lock().unwrap().push(key.clone());
        match self.routes.lock().unwrap().get(&key) {
            Some(Reply::Json(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(BridgeError::Upstream {
                status: *status,
                body: String::new(),
            }),
            None => Err(BridgeError::Upstream {
                status: 404,
                body: format!("no route for {}", key),
            }),
        }
    }
}

fn path_of(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.path().to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn get(&self, url: &str) -> Result<Value> {
        self.answer(path_of(url))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<Value> {
        let equipment = body["equipmentIds"][0].as_str().unwrap_or_default();
        self.answer(format!("{}#{}", path_of(url), equipment))
    }
}
