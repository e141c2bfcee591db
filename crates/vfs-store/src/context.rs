//! Per-request fetch attribution.
//!
//! A [`FetchContext`] is created by whoever starts a request (a filesystem
//! callback, an RPC) and handed unchanged to every store and live-node call
//! that request makes. Nothing below the caller interprets it beyond logging.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What kind of request triggered a fetch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchCause {
    Unknown,
    /// A kernel filesystem request.
    Fs,
    /// A service RPC.
    Rpc,
    /// Background prefetching.
    Prefetch,
}

impl fmt::Display for FetchCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Fs => write!(f, "fs"),
            Self::Rpc => write!(f, "rpc"),
            Self::Prefetch => write!(f, "prefetch"),
        }
    }
}

#[derive(Debug)]
struct Inner {
    request_id: Uuid,
    cause: FetchCause,
    client_pid: Option<u32>,
    detail: Option<String>,
}

/// Opaque, cheaply clonable attribution token for fetches.
#[derive(Clone, Debug)]
pub struct FetchContext(Arc<Inner>);

impl FetchContext {
    /// A fresh context with a new request id.
    pub fn new(cause: FetchCause) -> Self {
        Self::build(cause, None, None)
    }

    /// A context for callers with nothing to attribute.
    pub fn null() -> Self {
        Self::new(FetchCause::Unknown)
    }

    /// Attach the pid of the process that caused the request.
    pub fn with_client_pid(&self, pid: u32) -> Self {
        Self::build(self.0.cause, Some(pid), self.0.detail.clone())
    }

    /// Attach a free-form description (an RPC name, say).
    pub fn with_detail(&self, detail: impl Into<String>) -> Self {
        Self::build(self.0.cause, self.0.client_pid, Some(detail.into()))
    }

    fn build(cause: FetchCause, client_pid: Option<u32>, detail: Option<String>) -> Self {
        Self(Arc::new(Inner {
            request_id: Uuid::now_v7(),
            cause,
            client_pid,
            detail,
        }))
    }

    /// Time-ordered id shared by every fetch of one request.
    pub fn request_id(&self) -> Uuid {
        self.0.request_id
    }

    /// What triggered the request.
    pub fn cause(&self) -> FetchCause {
        self.0.cause
    }

    /// Pid of the requesting process, if known.
    pub fn client_pid(&self) -> Option<u32> {
        self.0.client_pid
    }

    /// Free-form description attached by the caller.
    pub fn detail(&self) -> Option<&str> {
        self.0.detail.as_deref()
    }
}

impl Default for FetchContext {
    fn default() -> Self {
        Self::null()
    }
}
