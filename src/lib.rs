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

//! Terraform provider for Spotinst
//!
//! Every resource maps Terraform states to the objects of the Spotinst REST API.
//! Most of them are described by an [`ApiObject`](commons::ApiObject) and served by
//! the generic [`SpotinstResource`](commons::SpotinstResource), the others
//! (suspensions and credentials) implement [`tf_provider::Resource`] directly.

pub mod client;
pub mod commons;
pub mod config;
pub mod credentials;
pub mod elastigroup;
pub mod health_check;
pub mod managed_instance;
pub mod mrscaler;
pub mod multai;
pub mod ocean;
pub mod provider;
pub mod stateful_node;
pub mod subscription;
pub mod sweep;
mod utils;

pub use provider::SpotinstProvider;
