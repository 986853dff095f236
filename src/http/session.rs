//! Per-extractor HTTP client store.
//!
//! Each extractor gets its own `reqwest::Client`, keyed by code name, so
//! per-extractor proxies apply to every request it makes. Clients follow
//! redirects and carry no global timeout; deadlines are set per request.

use std::collections::HashMap;
use std::sync::RwLock;

use once_cell::sync::Lazy;
use reqwest::{Client, Proxy};

use crate::config::HttpSettings;

static HTTP_SETTINGS: Lazy<RwLock<HttpSettings>> =
    Lazy::new(|| RwLock::new(HttpSettings::default()));

static CLIENTS: Lazy<RwLock<HashMap<String, Client>>> = Lazy::new(|| RwLock::new(HashMap::new()));

/// Apply HTTP settings. Call once at startup, before any extraction.
///
/// Already-built clients are discarded so new proxies take effect.
pub fn configure(settings: &HttpSettings) {
    *HTTP_SETTINGS.write().unwrap() = settings.clone();
    CLIENTS.write().unwrap().clear();
}

/// The client used by the download subsystem.
pub fn default_client() -> Client {
    client_for("default")
}

/// Directory holding per-extractor cookie files.
pub fn cookies_dir() -> std::path::PathBuf {
    HTTP_SETTINGS.read().unwrap().cookies_dir.clone()
}

/// Client for the named extractor, built on first use and cached.
pub fn client_for(code_name: &str) -> Client {
    if let Some(client) = CLIENTS.read().unwrap().get(code_name) {
        return client.clone();
    }

    let client = build_client(code_name);
    CLIENTS
        .write()
        .unwrap()
        .entry(code_name.to_string())
        .or_insert(client)
        .clone()
}

fn build_client(code_name: &str) -> Client {
    let settings = HTTP_SETTINGS.read().unwrap();
    let proxy_url = settings
        .proxies
        .get(code_name)
        .cloned()
        .or_else(|| settings.proxy.clone());
    drop(settings);

    let mut builder = Client::builder();

    if let Some(url) = proxy_url {
        match Proxy::all(&url) {
            Ok(proxy) => builder = builder.proxy(proxy),
            Err(e) => {
                tracing::warn!("Ignoring invalid proxy for {}: {}", code_name, e);
            }
        }
    }

    builder.build().unwrap_or_else(|e| {
        tracing::warn!("Falling back to default client for {}: {}", code_name, e);
        Client::new()
    })
}
