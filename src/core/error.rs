use std::fmt;

use thiserror::Error;

use crate::model::workload::WorkloadKind;

/// Failure reported by a cluster accessor.
#[derive(Debug, Clone, Error)]
pub enum ClusterError {
    #[error("Not Found - {0}")]
    NotFound(String),
    #[error("Conflict - {0}")]
    Conflict(String),
    #[error("Invalid object - {0}")]
    Invalid(String),
    #[error("Transport error - {0}")]
    Transport(String),
}

impl ClusterError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClusterError::NotFound(_))
    }
}

impl From<kube::Error> for ClusterError {
    fn from(err: kube::Error) -> Self {
        match err {
            kube::Error::Api(response) => match response.code {
                404 => ClusterError::NotFound(response.message),
                409 => ClusterError::Conflict(response.message),
                400 | 422 => ClusterError::Invalid(response.message),
                _ => ClusterError::Transport(format!("{} ({})", response.message, response.code)),
            },
            other => ClusterError::Transport(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Get => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        })
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("Failed to {operation} {kind} {namespace}/{name}: {source}")]
    Cluster {
        operation: Operation,
        kind: WorkloadKind,
        namespace: String,
        name: String,
        #[source]
        source: ClusterError,
    },
}

impl Error {
    pub fn cluster(operation: Operation, kind: WorkloadKind, namespace: &str, name: &str, source: ClusterError) -> Self {
        Error::Cluster {
            operation,
            kind,
            namespace: String::from(namespace),
            name: String::from(name),
            source,
        }
    }

    pub fn operation(&self) -> Operation {
        match self {
            Error::Cluster { operation, .. } => *operation,
        }
    }

    pub fn kind(&self) -> WorkloadKind {
        match self {
            Error::Cluster { kind, .. } => *kind,
        }
    }

    pub fn cluster_error(&self) -> &ClusterError {
        match self {
            Error::Cluster { source, .. } => source,
        }
    }

    /// Whether invoking the same pass again may succeed without upstream changes.
    pub fn is_retryable(&self) -> bool {
        !matches!(self.cluster_error(), ClusterError::Invalid(_))
    }
}

#[cfg(test)]
mod tests {
    use kube::error::ErrorResponse;

    use super::*;

    fn api_error(code: u16) -> kube::Error {
        kube::Error::Api(ErrorResponse {
            status: String::from("Failure"),
            message: format!("status {code}"),
            reason: String::new(),
            code,
        })
    }

    #[test]
    fn classifies_api_errors() {
        assert!(matches!(ClusterError::from(api_error(404)), ClusterError::NotFound(_)));
        assert!(matches!(ClusterError::from(api_error(409)), ClusterError::Conflict(_)));
        assert!(matches!(ClusterError::from(api_error(422)), ClusterError::Invalid(_)));
        assert!(matches!(ClusterError::from(api_error(400)), ClusterError::Invalid(_)));
        assert!(matches!(ClusterError::from(api_error(503)), ClusterError::Transport(_)));
    }

    #[test]
    fn only_invalid_is_terminal() {
        let invalid = Error::cluster(Operation::Update, WorkloadKind::ReplicaManaged, "ns", "envoy", ClusterError::Invalid(String::from("bad quantity")));
        let conflict = Error::cluster(Operation::Update, WorkloadKind::ReplicaManaged, "ns", "envoy", ClusterError::Conflict(String::from("stale")));

        assert!(!invalid.is_retryable());
        assert!(conflict.is_retryable());
        assert_eq!(conflict.operation(), Operation::Update);
        assert_eq!(conflict.to_string(), "Failed to update Deployment ns/envoy: Conflict - stale");
    }
}
