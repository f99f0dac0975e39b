//! Service Dialer - inbound call surface
//!
//! Flow of one dial:
//! ```text
//! parse address → resolve (2 directory queries) → choose backend
//!               → TunnelBuilder.build() → TunnelConn
//! ```
//!
//! The `dial*` entry points differ only in where the namespace comes from;
//! they all share `dial_service`.
//!
//! Cancellation and `discovery_timeout_ms` cover discovery only. Once a
//! backend is chosen the tunnel build runs to completion or to its own
//! failure; dropping the returned future is still safe at any point.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::balance::choose;
use crate::common::{BackendCandidate, ServiceAddress};
use crate::config::DialerConfig;
use crate::directory::{resolve, Directory};
use crate::error::{Error, Result};
use crate::logger::{Logger, TracingLogger};
use crate::transport::{BackendTarget, TunnelTransport};
use crate::tunnel::{TunnelBuilder, TunnelConn};

/// Dials logical services through tunnels to one of their backends
pub struct ServiceDialer {
    directory: Arc<dyn Directory>,
    transport: Arc<dyn TunnelTransport>,
    logger: Arc<dyn Logger>,
    config: DialerConfig,
}

impl ServiceDialer {
    pub fn new(directory: Arc<dyn Directory>, transport: Arc<dyn TunnelTransport>) -> Self {
        Self {
            directory,
            transport,
            logger: Arc::new(TracingLogger),
            config: DialerConfig::default(),
        }
    }

    pub fn with_logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn with_config(mut self, config: DialerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &DialerConfig {
        &self.config
    }

    /// Dial `"name:port"` or `"name.namespace:port"`
    pub async fn dial(&self, addr: &str) -> Result<TunnelConn> {
        let service = self.parse(addr, None)?;
        self.dial_service(service, None).await
    }

    /// Same as [`dial`](Self::dial), with discovery bound to `cancel`
    pub async fn dial_with_cancel(
        &self,
        addr: &str,
        cancel: CancellationToken,
    ) -> Result<TunnelConn> {
        let service = self.parse(addr, None)?;
        self.dial_service(service, Some(cancel)).await
    }

    /// Dial `addr` inside an explicit namespace
    pub async fn dial_in_namespace(&self, namespace: &str, addr: &str) -> Result<TunnelConn> {
        let service = self.parse(addr, Some(namespace))?;
        self.dial_service(service, None).await
    }

    pub async fn dial_in_namespace_with_cancel(
        &self,
        namespace: &str,
        addr: &str,
        cancel: CancellationToken,
    ) -> Result<TunnelConn> {
        let service = self.parse(addr, Some(namespace))?;
        self.dial_service(service, Some(cancel)).await
    }

    /// Dial a known backend directly, skipping discovery
    pub async fn dial_backend(
        &self,
        namespace: &str,
        backend: &str,
        port: u16,
    ) -> Result<TunnelConn> {
        let target = BackendTarget::new(namespace, backend);
        TunnelBuilder::new(
            Arc::clone(&self.transport),
            Arc::clone(&self.logger),
            self.config.request_id.as_str(),
        )
        .with_monitor_grace(self.config.monitor_grace())
        .build(&target, port)
        .await
    }

    fn parse(&self, addr: &str, namespace: Option<&str>) -> Result<ServiceAddress> {
        let parsed = match namespace {
            Some(ns) => ServiceAddress::parse_in(addr, ns),
            None => ServiceAddress::parse(addr, &self.config.default_namespace),
        };
        parsed.map_err(|e| {
            self.logger.error(format_args!("invalid addr {}: {}", addr, e));
            e
        })
    }

    async fn dial_service(
        &self,
        service: ServiceAddress,
        cancel: Option<CancellationToken>,
    ) -> Result<TunnelConn> {
        let discovery = async {
            match self.config.discovery_timeout() {
                Some(limit) => match tokio::time::timeout(limit, self.discover(&service)).await {
                    Ok(result) => result,
                    Err(_) => Err(Error::Timeout(service.to_string())),
                },
                None => self.discover(&service).await,
            }
        };

        let backend = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => Err(Error::Cancelled(service.to_string())),
                result = discovery => result,
            },
            None => discovery.await,
        };
        let backend = backend.map_err(|e| {
            self.logger.error(format_args!("dial {} failed: {}", service, e));
            e
        })?;

        let conn = self
            .dial_backend(&backend.namespace, &backend.name, service.port())
            .await
            .map_err(|e| {
                self.logger.error(format_args!(
                    "dial {} via {} failed: {}",
                    service, backend, e
                ));
                e
            })?;

        self.logger
            .info(format_args!("dialed {} via {}", service, backend));
        Ok(conn)
    }

    async fn discover(&self, service: &ServiceAddress) -> Result<BackendCandidate> {
        let candidates =
            resolve(self.directory.as_ref(), service.name(), service.namespace()).await?;

        let backend = choose(&candidates)
            .cloned()
            .ok_or_else(|| Error::NoBackends {
                service: service.name().to_string(),
                namespace: service.namespace().to_string(),
                selector: Default::default(),
            })?;

        self.logger.debug(format_args!(
            "picked {} of {} backends for {}",
            backend,
            candidates.len(),
            service
        ));
        Ok(backend)
    }
}
