// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0
use thiserror::Error;

/// Failures of a single call against the control plane
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClientError {
    /// Transient: the control plane could not be reached or asked us to back off
    #[error("control plane unavailable: {0}")]
    ControlPlaneUnavailable(String),

    /// Permanent: the control plane validated and refused the request
    #[error("rejected by control plane: {0}")]
    Rejected(String),
}

impl ClientError {
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::ControlPlaneUnavailable(_))
    }
}

impl From<kube::Error> for ClientError {
    fn from(err: kube::Error) -> Self {
        match &err {
            kube::Error::Api(resp) => match resp.code {
                408 | 409 | 429 | 500..=599 => {
                    ClientError::ControlPlaneUnavailable(err.to_string())
                }
                _ => ClientError::Rejected(err.to_string()),
            },
            kube::Error::HyperError(_) | kube::Error::Service(_) => {
                ClientError::ControlPlaneUnavailable(err.to_string())
            }
            _ => ClientError::Rejected(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
