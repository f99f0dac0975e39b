//! Tunnel targets and sub-stream headers

/// Header naming the stream's role
pub const STREAM_TYPE_HEADER: &str = "streamType";
/// Header carrying the target port on the backend
pub const PORT_HEADER: &str = "port";
/// Header pairing the error and data streams of one forward request
pub const REQUEST_ID_HEADER: &str = "requestID";

/// Concrete backend a tunnel is opened to
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BackendTarget {
    pub namespace: String,
    pub name: String,
}

impl BackendTarget {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Path of the backend's port-forward sub-resource
    pub fn portforward_path(&self) -> String {
        format!(
            "/api/v1/namespaces/{}/pods/{}/portforward",
            self.namespace, self.name
        )
    }
}

impl std::fmt::Display for BackendTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Role of a sub-stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamType {
    /// Out-of-band diagnostics from the remote side
    Error,
    /// Payload bytes
    Data,
}

impl StreamType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamType::Error => "error",
            StreamType::Data => "data",
        }
    }
}

impl std::fmt::Display for StreamType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Header set sent when creating a sub-stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeaders {
    pub stream_type: StreamType,
    pub port: u16,
    pub request_id: String,
}

impl StreamHeaders {
    pub fn new(stream_type: StreamType, port: u16, request_id: impl Into<String>) -> Self {
        Self {
            stream_type,
            port,
            request_id: request_id.into(),
        }
    }

    /// Same port and request id, different role
    pub fn with_type(&self, stream_type: StreamType) -> Self {
        Self {
            stream_type,
            ..self.clone()
        }
    }

    /// Header name/value pairs in wire form
    pub fn pairs(&self) -> [(&'static str, String); 3] {
        [
            (STREAM_TYPE_HEADER, self.stream_type.as_str().to_string()),
            (PORT_HEADER, self.port.to_string()),
            (REQUEST_ID_HEADER, self.request_id.clone()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_portforward_path() {
        let target = BackendTarget::new("default", "svc-user-7d9f");
        assert_eq!(
            target.portforward_path(),
            "/api/v1/namespaces/default/pods/svc-user-7d9f/portforward"
        );
    }

    #[test]
    fn test_header_pairs() {
        let error = StreamHeaders::new(StreamType::Error, 8000, "svcdial");
        let data = error.with_type(StreamType::Data);

        assert_eq!(
            error.pairs(),
            [
                ("streamType", "error".to_string()),
                ("port", "8000".to_string()),
                ("requestID", "svcdial".to_string()),
            ]
        );
        assert_eq!(data.pairs()[0].1, "data");
        assert_eq!(data.pairs()[1..], error.pairs()[1..]);
    }
}
