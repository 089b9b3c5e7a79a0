// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use serde::{Deserialize, Deserializer, Serialize};
use typed_builder::TypedBuilder;

use crate::{in_page_provider::InPageErrorCode, Error};

/// Wallet state that the provider answers from without asking the node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SyncOptions {
    /// The current account.
    #[builder(default, setter(into, strip_option))]
    #[serde(default)]
    pub address: Option<String>,
    /// Decimal chain id, eg. "137". Legacy MetaMask api needs string.
    #[builder(default, setter(into, strip_option))]
    #[serde(default, deserialize_with = "string_or_number")]
    pub network_version: Option<String>,
}

impl SyncOptions {
    /// `[address]` or empty if no account is configured.
    pub fn accounts(&self) -> Vec<String> {
        self.address.iter().cloned().collect()
    }

    /// Network version as 0x-prefixed hex, eg. "0x89". None if no network is configured.
    pub fn hex_chain_id(&self) -> Result<Option<String>, Error> {
        self.network_version
            .as_deref()
            .map(network_version_to_hex)
            .transpose()
    }
}

fn network_version_to_hex(network_version: &str) -> Result<String, Error> {
    let chain_id = match network_version.strip_prefix("0x") {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => network_version.parse::<u64>(),
    }
    .map_err(|_| Error::JsonRpc {
        code: InPageErrorCode::InternalError.into(),
        message: format!("Invalid network version: '{network_version}'"),
    })?;
    Ok(format!("{chain_id:#x}"))
}

/// Host apps send the network version both as string and number.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(u64),
    }

    let value: Option<StringOrNumber> = Option::deserialize(deserializer)?;
    Ok(value.map(|value| match value {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use super::*;

    #[test]
    fn deserializes_host_json() -> Result<()> {
        let options: SyncOptions =
            serde_json::from_str(r#"{"address":"0xabc","networkVersion":137}"#)?;
        assert_eq!(
            options,
            SyncOptions::builder()
                .address("0xabc")
                .network_version("137")
                .build()
        );

        let options: SyncOptions = serde_json::from_str(r#"{"networkVersion":"5"}"#)?;
        assert_eq!(options.network_version.as_deref(), Some("5"));
        assert_eq!(options.address, None);

        let options: SyncOptions = serde_json::from_str("{}")?;
        assert_eq!(options, SyncOptions::default());
        Ok(())
    }

    #[test]
    fn accounts_from_address() {
        let options = SyncOptions::builder().address("0xabc").build();
        assert_eq!(options.accounts(), vec!["0xabc".to_string()]);
        assert!(SyncOptions::default().accounts().is_empty());
    }

    #[test]
    fn renders_hex_chain_id() -> Result<()> {
        let options = SyncOptions::builder().network_version("137").build();
        assert_eq!(options.hex_chain_id()?, Some("0x89".into()));
        let options = SyncOptions::builder().network_version("0x1").build();
        assert_eq!(options.hex_chain_id()?, Some("0x1".into()));
        assert_eq!(SyncOptions::default().hex_chain_id()?, None);
        Ok(())
    }

    #[test]
    fn invalid_network_version_is_error() {
        let options = SyncOptions::builder().network_version("mainnet").build();
        assert!(matches!(options.hex_chain_id(), Err(Error::JsonRpc { .. })));
    }
}
