//! Logical service address

use crate::error::{Error, Result};

/// Namespace used when an address does not name one
pub const DEFAULT_NAMESPACE: &str = "default";

/// Logical service address (name + namespace + port)
///
/// Parsed from `"name:port"` or `"name.namespace:port"`. Never points at a
/// concrete backend; resolution happens through the directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServiceAddress {
    name: String,
    namespace: String,
    port: u16,
}

impl ServiceAddress {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>, port: u16) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            port,
        }
    }

    /// Parse `addr`, taking the namespace from the host when present and
    /// falling back to `default_namespace` otherwise.
    pub fn parse(addr: &str, default_namespace: &str) -> Result<Self> {
        let (host, port) = split_host_port(addr)?;
        let (name, namespace) = split_host(addr, host)?;

        Ok(Self::new(name, namespace.unwrap_or(default_namespace), port))
    }

    /// Parse `addr` inside an explicit namespace.
    ///
    /// A host of the form `name.ns` is accepted only when `ns` equals `namespace`.
    pub fn parse_in(addr: &str, namespace: &str) -> Result<Self> {
        if namespace.is_empty() {
            return Err(Error::address(addr, "empty namespace"));
        }

        let (host, port) = split_host_port(addr)?;
        let (name, host_namespace) = split_host(addr, host)?;

        match host_namespace {
            Some(ns) if ns != namespace => Err(Error::address(
                addr,
                format!("namespace {:?} conflicts with {:?}", ns, namespace),
            )),
            _ => Ok(Self::new(name, namespace, port)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl std::fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}:{}", self.name, self.namespace, self.port)
    }
}

fn split_host_port(addr: &str) -> Result<(&str, u16)> {
    let (host, port) = addr
        .split_once(':')
        .ok_or_else(|| Error::address(addr, "missing port"))?;

    if port.contains(':') {
        return Err(Error::address(addr, "too many colons"));
    }
    if port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::address(addr, format!("invalid port {:?}", port)));
    }

    let port: u16 = port
        .parse()
        .map_err(|_| Error::address(addr, format!("port {} out of range", port)))?;
    if port == 0 {
        return Err(Error::address(addr, "port must be non-zero"));
    }

    Ok((host, port))
}

fn split_host<'a>(addr: &str, host: &'a str) -> Result<(&'a str, Option<&'a str>)> {
    let mut segments = host.split('.');
    let name = segments.next().unwrap_or_default();
    let namespace = segments.next();

    if segments.next().is_some() {
        return Err(Error::address(addr, "host has more than two segments"));
    }
    if name.is_empty() {
        return Err(Error::address(addr, "empty service name"));
    }
    if namespace == Some("") {
        return Err(Error::address(addr, "empty namespace"));
    }

    Ok((name, namespace))
}
