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

use tf_provider::ValueString;

/// States of the objects identified by an `id` attribute
pub trait WithId<'a> {
    fn id(&self) -> &ValueString<'a>;
    fn id_mut(&mut self) -> &mut ValueString<'a>;
}

/// Implement [`WithId`] for a state struct with an `id` field
macro_rules! with_id {
    ($state:ident) => {
        impl<'a> $crate::utils::WithId<'a> for $state<'a> {
            fn id(&self) -> &tf_provider::ValueString<'a> {
                &self.id
            }
            fn id_mut(&mut self) -> &mut tf_provider::ValueString<'a> {
                &mut self.id
            }
        }
    };
}

pub(crate) use with_id;
