// This file is part of the terraform-provider-spotinst project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// Errors returned by the Spotinst API client
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be received
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error envelope
    #[error("{code}: {message} (status {status})")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    /// The API answered with an error status and a body that is not an envelope
    #[error("unexpected status {status}: {body}")]
    Status { status: u16, body: String },

    /// The API answered successfully but without the expected item
    #[error("empty response from {0}")]
    EmptyResponse(String),

    /// The response body could not be decoded
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ApiError {
    /// Check if the error means the remote object does not exist (anymore)
    pub fn is_not_found(&self) -> bool {
        match self {
            ApiError::Api { status, code, .. } => {
                *status == 404
                    || code == "NOT_FOUND"
                    || code.ends_with("_NOT_FOUND")
                    || code.ends_with("_DOESNT_EXIST")
            }
            ApiError::Status { status, .. } => *status == 404,
            _ => false,
        }
    }
}
