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

use std::fmt::Debug;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value as Json;
use tracing::debug;

use super::{ApiError, Request, SpotinstApi};

/// Public endpoint of the Spotinst API
pub const DEFAULT_BASE_URL: &str = "https://api.spotinst.io";

const USER_AGENT: &str = concat!("terraform-provider-spotinst/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Spotinst API client over HTTPS
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
    account: Option<String>,
}

/// Headers sent on every call, bodies or not
fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers
}

impl HttpClient {
    pub fn new(base_url: &str, token: &str, account: Option<&str>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(default_headers())
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_owned(),
            token: token.to_owned(),
            account: account.map(str::to_owned),
        })
    }

    pub fn account(&self) -> Option<&str> {
        self.account.as_deref()
    }
}

impl Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

#[async_trait]
impl SpotinstApi for HttpClient {
    async fn call(&self, request: Request) -> Result<Vec<Json>, ApiError> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .bearer_auth(&self.token)
            .query(&request.query);
        let has_account = request.query.iter().any(|(key, _)| key == "accountId");
        if let (Some(account), false) = (&self.account, has_account) {
            builder = builder.query(&[("accountId", account)]);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        debug!(method = %request.method, path = %request.path, "sending request");
        let response = builder.send().await?;
        let status = response.status().as_u16();
        let text = response.text().await?;
        debug!(method = %request.method, path = %request.path, status, "received response");

        decode(status, &text)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    response: EnvelopeResponse,
}

#[derive(Debug, Default, Deserialize)]
struct EnvelopeResponse {
    #[serde(default)]
    items: Vec<Json>,
    #[serde(default)]
    errors: Vec<EnvelopeError>,
}

#[derive(Debug, Deserialize)]
struct EnvelopeError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    field: Option<String>,
}

/// Decode the envelope of a response
fn decode(status: u16, body: &str) -> Result<Vec<Json>, ApiError> {
    let success = (200..300).contains(&status);
    if body.trim().is_empty() {
        return if success {
            Ok(Vec::new())
        } else {
            Err(ApiError::Status {
                status,
                body: String::new(),
            })
        };
    }

    let envelope = match serde_json::from_str::<Envelope>(body) {
        Ok(envelope) => envelope,
        Err(err) if success => return Err(err.into()),
        Err(_) => {
            return Err(ApiError::Status {
                status,
                body: body.to_owned(),
            })
        }
    };

    if success {
        return Ok(envelope.response.items);
    }

    match envelope.response.errors.into_iter().next() {
        Some(error) => Err(ApiError::Api {
            status,
            code: error.code,
            message: match error.field {
                Some(field) if !field.is_empty() => format!("{} (field: {})", error.message, field),
                _ => error.message,
            },
        }),
        None => Err(ApiError::Status {
            status,
            body: body.to_owned(),
        }),
    }
}
