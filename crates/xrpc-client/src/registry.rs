use std::collections::BTreeMap;
use std::sync::Arc;

use bytes::{Buf, Bytes};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};
use xrpc_frame::{Request, Response};

use crate::client::Client;
use crate::config::{ConfigError, XrpcConfig};
use crate::error::{Result, RpcError};
use crate::selector::RoundRobinSelector;

/// Logical service name → configured [`Client`].
///
/// Built once at startup and shared by reference (or `Arc`) with every
/// request handler.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    clients: BTreeMap<String, Client>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a client for every configured service.
    ///
    /// Fails if any service has no endpoints or an endpoint does not
    /// resolve.
    pub fn from_config(config: &XrpcConfig) -> std::result::Result<Self, ConfigError> {
        let mut registry = Self::new();
        for (name, service) in &config.services {
            let endpoints = service.endpoints();
            if endpoints.is_empty() {
                return Err(ConfigError::NoEndpoints(name.clone()));
            }

            let selector = RoundRobinSelector::new();
            selector
                .set_servers(&endpoints)
                .map_err(|source| ConfigError::InvalidEndpoint {
                    service: name.clone(),
                    source,
                })?;

            let client = Client::with_selector(Arc::new(selector), service.client_config());
            info!(service = %name, endpoints = endpoints.len(), "registered xrpc service");
            registry.register(name.clone(), client);
        }
        Ok(registry)
    }

    /// Add or replace the client for `name`.
    pub fn register(&mut self, name: impl Into<String>, client: Client) {
        self.clients.insert(name.into(), client);
    }

    pub fn client(&self, name: &str) -> Option<&Client> {
        self.clients.get(name)
    }

    /// Registered service names, sorted.
    pub fn services(&self) -> impl Iterator<Item = &str> {
        self.clients.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    /// Send `body` to `service` and return the raw response frame.
    pub fn call_raw(&self, service: &str, body: Bytes, log_id: u32) -> Result<Response> {
        let client = self
            .client(service)
            .ok_or_else(|| RpcError::UnknownService(service.to_string()))?;

        debug!(service, log_id, body_len = body.len(), "call");
        let request = Request::new(body.reader(), log_id).map_err(RpcError::Request)?;
        client.call(request)
    }

    /// Send `request` as a JSON body to `service` and decode the JSON reply.
    pub fn call<Req, Resp>(&self, service: &str, request: &Req, log_id: u32) -> Result<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let content = serde_json::to_vec(request).map_err(RpcError::Encode)?;
        let response = self.call_raw(service, Bytes::from(content), log_id)?;
        serde_json::from_slice(&response.body).map_err(RpcError::Decode)
    }
}
