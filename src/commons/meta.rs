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

use std::sync::{Arc, PoisonError, RwLock};

use tf_provider::Diagnostics;

use crate::client::SpotinstApi;
use crate::config::FeatureFlags;

/// What `configure` produced and the resources need
#[derive(Debug, Clone)]
pub struct ProviderMeta {
    pub api: Arc<dyn SpotinstApi>,
    pub flags: FeatureFlags,
}

/// Handle on the configured client, shared between the provider and its resources
///
/// Resources are instantiated before the provider is configured,
/// so they get an empty handle that is filled by `configure`.
#[derive(Debug, Clone, Default)]
pub struct ClientHandle {
    inner: Arc<RwLock<Option<ProviderMeta>>>,
}

impl ClientHandle {
    /// Build a handle already configured with `api`
    pub fn with_api(api: Arc<dyn SpotinstApi>, flags: FeatureFlags) -> Self {
        let handle = Self::default();
        handle.install(api, flags);
        handle
    }

    /// Install the configured client
    pub fn install(&self, api: Arc<dyn SpotinstApi>, flags: FeatureFlags) {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        *inner = Some(ProviderMeta { api, flags });
    }

    pub fn is_configured(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Get the configured client, or record an error if the provider is not configured yet
    pub fn get(&self, diags: &mut Diagnostics) -> Option<ProviderMeta> {
        let meta = self
            .inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if meta.is_none() {
            diags.root_error(
                "Provider is not configured",
                "The spotinst provider must be configured before managing resources",
            );
        }
        meta
    }

    /// Get the configured API client
    pub fn api(&self, diags: &mut Diagnostics) -> Option<Arc<dyn SpotinstApi>> {
        self.get(diags).map(|meta| meta.api)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tf_provider::Diagnostics;

    use super::ClientHandle;
    use crate::client::MemoryApi;

    #[test]
    fn unconfigured_handle_reports_error() {
        let handle = ClientHandle::default();
        let mut diags = Diagnostics::default();
        assert!(handle.api(&mut diags).is_none());
        assert_eq!(diags.errors.len(), 1);
        assert_eq!(diags.errors[0].summary, "Provider is not configured");
    }

    #[test]
    fn clones_share_configuration() {
        let handle = ClientHandle::default();
        let resource_side = handle.clone();
        assert!(!resource_side.is_configured());

        handle.install(Arc::new(MemoryApi::default()), Default::default());

        let mut diags = Diagnostics::default();
        assert!(resource_side.api(&mut diags).is_some());
        assert!(diags.errors.is_empty());
    }
}
