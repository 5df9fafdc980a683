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

//! Provider settings: feature flags and credentials
//!
//! Credentials are looked up in order:
//!
//! 1. the `token` and `account` attributes of the provider block
//! 2. the `SPOTINST_TOKEN` and `SPOTINST_ACCOUNT` environment variables
//! 3. the shared credentials file (`SPOTINST_SHARED_CREDENTIALS_FILE`,
//!    or `$HOME/.spotinst/credentials`), profile `SPOTINST_PROFILE` or `default`
//!
//! The first source with a token wins. An account set in the provider block
//! overrides the account of that source.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::client::DEFAULT_BASE_URL;

pub const ENV_TOKEN: &str = "SPOTINST_TOKEN";
pub const ENV_ACCOUNT: &str = "SPOTINST_ACCOUNT";
pub const ENV_CREDENTIALS_FILE: &str = "SPOTINST_SHARED_CREDENTIALS_FILE";
pub const ENV_PROFILE: &str = "SPOTINST_PROFILE";
pub const ENV_BASE_URL: &str = "SPOTINST_BASE_URL";
pub const ENV_FEATURE_FLAGS: &str = "SPOTINST_FEATURE_FLAGS";

pub const DEFAULT_PROFILE: &str = "default";

/// Switches changing the behavior of the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureFlags {
    /// Import every attribute of the remote object instead of the id only
    pub import_full_state: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            import_full_state: true,
        }
    }
}

impl FromStr for FeatureFlags {
    type Err = anyhow::Error;

    /// Parse `Name=bool` pairs separated by commas, a bare `Name` enables the flag
    fn from_str(s: &str) -> Result<Self> {
        let mut flags = Self::default();
        for item in s.split(',').map(str::trim).filter(|item| !item.is_empty()) {
            let (name, enabled) = match item.split_once('=') {
                Some((name, value)) => {
                    let enabled = value.trim().parse::<bool>().map_err(|_| {
                        anyhow!("invalid value `{}` for feature flag `{}`", value, name)
                    })?;
                    (name.trim(), enabled)
                }
                None => (item, true),
            };
            match name {
                "ImportFullState" => flags.import_full_state = enabled,
                _ => warn!(flag = name, "ignoring unknown feature flag"),
            }
        }
        Ok(flags)
    }
}

/// Spotinst API credentials
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub account: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

/// Source of the settings not given in the provider block
///
/// Reads the process environment by default, tests provide their own lookup.
pub struct Settings<F> {
    lookup: F,
}

impl Settings<fn(&str) -> Option<String>> {
    /// Settings taken from the process environment
    pub fn from_env() -> Self {
        Self {
            lookup: |name| std::env::var(name).ok(),
        }
    }
}

impl<F> Settings<F>
where
    F: Fn(&str) -> Option<String>,
{
    pub fn new(lookup: F) -> Self {
        Self { lookup }
    }

    fn var(&self, name: &str) -> Option<String> {
        (self.lookup)(name).filter(|value| !value.is_empty())
    }

    /// Base url of the API
    pub fn base_url(&self) -> String {
        self.var(ENV_BASE_URL)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
    }

    /// Feature flags from the provider block, or from the environment
    pub fn feature_flags(&self, configured: Option<&str>) -> Result<FeatureFlags> {
        match configured.map(str::to_owned).or_else(|| self.var(ENV_FEATURE_FLAGS)) {
            Some(flags) => flags.parse(),
            None => Ok(FeatureFlags::default()),
        }
    }

    /// Resolve the credentials through the chain
    pub fn credentials(&self, token: Option<&str>, account: Option<&str>) -> Result<Credentials> {
        let token = token.filter(|token| !token.is_empty());
        let account = account.filter(|account| !account.is_empty());

        let mut credentials = match token {
            Some(token) => {
                debug!("using credentials from the provider configuration");
                Credentials {
                    token: token.to_owned(),
                    account: None,
                }
            }
            None => match self.env_credentials() {
                Some(credentials) => {
                    debug!("using credentials from the environment");
                    credentials
                }
                None => match self.file_credentials()? {
                    Some(credentials) => credentials,
                    None => bail!(
                        "no Spotinst token found: set `token` in the provider block, \
                         the {} environment variable, or a shared credentials file",
                        ENV_TOKEN
                    ),
                },
            },
        };

        if let Some(account) = account {
            credentials.account = Some(account.to_owned());
        }
        Ok(credentials)
    }

    fn env_credentials(&self) -> Option<Credentials> {
        Some(Credentials {
            token: self.var(ENV_TOKEN)?,
            account: self.var(ENV_ACCOUNT),
        })
    }

    fn credentials_file(&self) -> Option<(PathBuf, bool)> {
        if let Some(path) = self.var(ENV_CREDENTIALS_FILE) {
            return Some((PathBuf::from(path), true));
        }
        let home = self.var("HOME")?;
        Some((Path::new(&home).join(".spotinst").join("credentials"), false))
    }

    fn file_credentials(&self) -> Result<Option<Credentials>> {
        let Some((path, explicit)) = self.credentials_file() else {
            return Ok(None);
        };
        if !path.is_file() {
            if explicit {
                bail!("<{}> is not a file", path.display());
            }
            return Ok(None);
        }

        let profile = self
            .var(ENV_PROFILE)
            .unwrap_or_else(|| DEFAULT_PROFILE.to_owned());
        let credentials = load_profile(&path, &profile)?;
        if credentials.is_some() {
            debug!(
                path = %path.display(),
                profile = %profile,
                "using credentials from the shared credentials file"
            );
        }
        Ok(credentials)
    }
}

/// Read a profile from a shared credentials file
///
/// ```yaml
/// default:
///   token: xxxxxxxx
///   account: act-12345678
/// ```
pub fn load_profile(path: &Path, profile: &str) -> Result<Option<Credentials>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read <{}>", path.display()))?;
    let mut profiles: BTreeMap<String, Credentials> = serde_yaml::from_str(&contents)
        .with_context(|| format!("failed to parse <{}>", path.display()))?;

    Ok(profiles
        .remove(profile)
        .filter(|credentials| !credentials.token.is_empty()))
}

/// Check the format of an account id
pub fn validate_account(account: &str) -> Result<()> {
    if account.starts_with("act-") && account.len() > "act-".len() {
        Ok(())
    } else {
        bail!("account `{}` must look like `act-12345678`", account)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::{validate_account, FeatureFlags, Settings, DEFAULT_BASE_URL};

    fn settings(vars: &[(&str, &str)]) -> Settings<impl Fn(&str) -> Option<String>> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::new(move |name| vars.get(name).cloned())
    }

    fn credentials_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn feature_flags() {
        assert_eq!("".parse::<FeatureFlags>().unwrap(), FeatureFlags::default());
        assert!(
            !"ImportFullState=false"
                .parse::<FeatureFlags>()
                .unwrap()
                .import_full_state
        );
        assert!(
            " Unknown=true , ImportFullState "
                .parse::<FeatureFlags>()
                .unwrap()
                .import_full_state
        );
        assert!("ImportFullState=maybe".parse::<FeatureFlags>().is_err());
    }

    #[test]
    fn static_credentials_win() {
        let settings = settings(&[("SPOTINST_TOKEN", "env-token"), ("SPOTINST_ACCOUNT", "act-env")]);
        let credentials = settings.credentials(Some("static"), None).unwrap();
        assert_eq!(credentials.token, "static");
        assert_eq!(credentials.account, None);
    }

    #[test]
    fn environment_credentials() {
        let settings = settings(&[("SPOTINST_TOKEN", "env-token"), ("SPOTINST_ACCOUNT", "act-env")]);
        let credentials = settings.credentials(None, None).unwrap();
        assert_eq!(credentials.token, "env-token");
        assert_eq!(credentials.account.as_deref(), Some("act-env"));

        let credentials = settings.credentials(Some(""), Some("act-override")).unwrap();
        assert_eq!(credentials.token, "env-token");
        assert_eq!(credentials.account.as_deref(), Some("act-override"));
    }

    #[test]
    fn file_credentials() {
        let file = credentials_file(
            "default:\n  token: default-token\nstaging:\n  token: staging-token\n  account: act-staging\n",
        );
        let path = file.path().to_str().unwrap();

        let credentials = settings(&[("SPOTINST_SHARED_CREDENTIALS_FILE", path)])
            .credentials(None, None)
            .unwrap();
        assert_eq!(credentials.token, "default-token");
        assert_eq!(credentials.account, None);

        let credentials = settings(&[
            ("SPOTINST_SHARED_CREDENTIALS_FILE", path),
            ("SPOTINST_PROFILE", "staging"),
        ])
        .credentials(None, None)
        .unwrap();
        assert_eq!(credentials.token, "staging-token");
        assert_eq!(credentials.account.as_deref(), Some("act-staging"));
    }

    #[test]
    fn home_credentials_file() {
        let home = tempfile::tempdir().unwrap();
        std::fs::create_dir(home.path().join(".spotinst")).unwrap();
        std::fs::write(
            home.path().join(".spotinst").join("credentials"),
            "default:\n  token: home-token\n",
        )
        .unwrap();

        let credentials = settings(&[("HOME", home.path().to_str().unwrap())])
            .credentials(None, Some("act-1"))
            .unwrap();
        assert_eq!(credentials.token, "home-token");
        assert_eq!(credentials.account.as_deref(), Some("act-1"));
    }

    #[test]
    fn missing_credentials() {
        assert!(settings(&[]).credentials(None, None).is_err());
        assert!(settings(&[("SPOTINST_SHARED_CREDENTIALS_FILE", "/nonexistent/credentials")])
            .credentials(None, None)
            .is_err());

        let file = credentials_file("default:\n  token: t\n");
        let missing_profile = settings(&[
            ("SPOTINST_SHARED_CREDENTIALS_FILE", file.path().to_str().unwrap()),
            ("SPOTINST_PROFILE", "prod"),
        ]);
        assert!(missing_profile.credentials(None, None).is_err());
    }

    #[test]
    fn base_url() {
        assert_eq!(settings(&[]).base_url(), DEFAULT_BASE_URL);
        assert_eq!(
            settings(&[("SPOTINST_BASE_URL", "http://localhost:8080")]).base_url(),
            "http://localhost:8080"
        );
    }

    #[test]
    fn account_format() {
        assert!(validate_account("act-12345678").is_ok());
        assert!(validate_account("act-").is_err());
        assert!(validate_account("12345678").is_err());
    }

    #[test]
    fn credentials_are_redacted() {
        let credentials = super::Credentials {
            token: "secret".to_owned(),
            account: None,
        };
        assert!(!format!("{:?}", credentials).contains("secret"));
    }
}
