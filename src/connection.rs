use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum ConnectionError {
    #[error("empty connection string")]
    #[diagnostic(
        code(zipctl::connection::empty),
        help("Pass the connection string on the command line or set it in zipctl.toml")
    )]
    Empty,

    #[error("malformed connection string setting: '{pair}'")]
    #[diagnostic(
        code(zipctl::connection::missing_value),
        help("Every setting must look like 'Key=value', separated by ';'")
    )]
    MissingValue { pair: String },

    #[error("connection string has no AccountName")]
    #[diagnostic(code(zipctl::connection::missing_account_name))]
    MissingAccountName,

    #[error("connection string has no AccountKey")]
    #[diagnostic(code(zipctl::connection::missing_account_key))]
    MissingAccountKey,

    #[error("invalid storage account name: '{name}'")]
    #[diagnostic(
        code(zipctl::connection::invalid_account_name),
        help("Account names are 3-24 lowercase letters and digits")
    )]
    InvalidAccountName { name: String },

    #[error("account key is not valid base64")]
    #[diagnostic(code(zipctl::connection::invalid_account_key))]
    InvalidAccountKey {
        #[source]
        source: base64::DecodeError,
    },

    #[error("unsupported endpoints protocol: '{value}'")]
    #[diagnostic(
        code(zipctl::connection::invalid_protocol),
        help("DefaultEndpointsProtocol must be 'http' or 'https'")
    )]
    InvalidProtocol { value: String },
}

const DEFAULT_PROTOCOL: &str = "https";
const DEFAULT_ENDPOINT_SUFFIX: &str = "core.windows.net";

// Well-known local emulator account, the `UseDevelopmentStorage=true` shorthand.
const DEV_STORE_ACCOUNT: &str = "devstoreaccount1";
const DEV_STORE_KEY: &str =
    "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";
const DEV_STORE_BLOB_ENDPOINT: &str = "http://127.0.0.1:10000/devstoreaccount1";

/// A parsed and validated blob-storage connection string.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionString {
    pub account_name: String,
    pub account_key: String,
    pub protocol: String,
    pub endpoint_suffix: String,
    pub blob_endpoint: Option<String>,
}
impl ConnectionString {
    fn development_storage() -> Self {
        ConnectionString {
            account_name: DEV_STORE_ACCOUNT.to_string(),
            account_key: DEV_STORE_KEY.to_string(),
            protocol: "http".to_string(),
            endpoint_suffix: DEFAULT_ENDPOINT_SUFFIX.to_string(),
            blob_endpoint: Some(DEV_STORE_BLOB_ENDPOINT.to_string()),
        }
    }

    fn is_valid_account_name(name: &str) -> bool {
        lazy_static::lazy_static! {
            static ref ACCOUNT_NAME_REGEX: regex::Regex =
                regex::Regex::new(r"^[a-z0-9]{3,24}$").expect("a valid regex pattern");
        }

        ACCOUNT_NAME_REGEX.is_match(name)
    }

    /// Parses a `Key=value;Key=value` storage connection string.
    ///
    /// `UseDevelopmentStorage=true` short-circuits to the well-known local
    /// emulator account. Otherwise `AccountName` and `AccountKey` are
    /// required; protocol and endpoint suffix fall back to the service
    /// defaults. Settings this tool has no use for (table endpoints and the
    /// like) are ignored with a debug log.
    ///
    /// # Errors
    ///
    /// Returns a [`ConnectionError`] if the string is empty, a setting has no
    /// `=`, a required setting is missing, or a value fails validation.
    pub fn parse(input: &str) -> Result<Self, ConnectionError> {
        if input.trim().is_empty() {
            return Err(ConnectionError::Empty);
        }

        let mut account_name: Option<String> = None;
        let mut account_key: Option<String> = None;
        let mut protocol = DEFAULT_PROTOCOL.to_string();
        let mut endpoint_suffix = DEFAULT_ENDPOINT_SUFFIX.to_string();
        let mut blob_endpoint: Option<String> = None;

        for pair in input.split(';') {
            let pair = pair.trim();
            if pair.is_empty() {
                continue;
            }

            // Split at the first '='; account keys carry base64 padding.
            let Some((key, value)) = pair.split_once('=') else {
                return Err(ConnectionError::MissingValue {
                    pair: pair.to_string(),
                });
            };

            match key {
                "UseDevelopmentStorage" if value.eq_ignore_ascii_case("true") => {
                    return Ok(ConnectionString::development_storage());
                }
                "DefaultEndpointsProtocol" => {
                    if value != "http" && value != "https" {
                        return Err(ConnectionError::InvalidProtocol {
                            value: value.to_string(),
                        });
                    }
                    protocol = value.to_string();
                }
                "AccountName" => account_name = Some(value.to_string()),
                "AccountKey" => account_key = Some(value.to_string()),
                "EndpointSuffix" => endpoint_suffix = value.to_string(),
                "BlobEndpoint" => blob_endpoint = Some(value.to_string()),
                other => {
                    log::debug!("ignoring connection string setting '{}'", other);
                }
            }
        }

        let account_name = account_name.ok_or(ConnectionError::MissingAccountName)?;

        if !ConnectionString::is_valid_account_name(&account_name) {
            return Err(ConnectionError::InvalidAccountName { name: account_name });
        }

        // An empty `AccountKey=` decodes as valid base64; treat it as missing.
        let account_key = account_key
            .filter(|key| !key.is_empty())
            .ok_or(ConnectionError::MissingAccountKey)?;

        BASE64
            .decode(&account_key)
            .map_err(|error| ConnectionError::InvalidAccountKey { source: error })?;

        Ok(ConnectionString {
            account_name,
            account_key,
            protocol,
            endpoint_suffix,
            blob_endpoint,
        })
    }

    /// The blob service endpoint, explicit or derived from the account name.
    pub fn blob_endpoint(&self) -> String {
        match &self.blob_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!(
                "{}://{}.blob.{}",
                self.protocol, self.account_name, self.endpoint_suffix
            ),
        }
    }

    /// The full URL a blob with the given name would live at.
    pub fn blob_url(&self, blob_name: &str) -> String {
        format!("{}/{}", self.blob_endpoint(), blob_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: &str = "dGhpcyBpcyBub3QgYSByZWFsIHN0b3JhZ2Uga2V5IGF0IGFsbA==";

    #[test]
    fn parses_a_full_connection_string() {
        let input = format!(
            "DefaultEndpointsProtocol=https;AccountName=mystore;AccountKey={};EndpointSuffix=core.windows.net",
            KEY
        );

        let parsed = ConnectionString::parse(&input).unwrap();

        assert_eq!(parsed.account_name, "mystore");
        assert_eq!(parsed.account_key, KEY);
        assert_eq!(parsed.blob_endpoint(), "https://mystore.blob.core.windows.net");
    }

    #[test]
    fn protocol_and_suffix_have_defaults() {
        let input = format!("AccountName=mystore;AccountKey={}", KEY);

        let parsed = ConnectionString::parse(&input).unwrap();

        assert_eq!(parsed.protocol, "https");
        assert_eq!(parsed.endpoint_suffix, "core.windows.net");
    }

    #[test]
    fn development_storage_shorthand() {
        let parsed = ConnectionString::parse("UseDevelopmentStorage=true").unwrap();

        assert_eq!(parsed.account_name, "devstoreaccount1");
        assert_eq!(parsed.blob_endpoint(), "http://127.0.0.1:10000/devstoreaccount1");
    }

    #[test]
    fn key_padding_survives_the_split() {
        let input = format!("AccountName=mystore;AccountKey={}", KEY);

        let parsed = ConnectionString::parse(&input).unwrap();

        assert!(parsed.account_key.ends_with("=="));
    }

    #[test]
    fn explicit_blob_endpoint_wins() {
        let input = format!(
            "AccountName=mystore;AccountKey={};BlobEndpoint=https://cdn.example.com/blobs/",
            KEY
        );

        let parsed = ConnectionString::parse(&input).unwrap();

        assert_eq!(parsed.blob_url("a.txt"), "https://cdn.example.com/blobs/a.txt");
    }

    #[test]
    fn unknown_settings_are_ignored() {
        let input = format!(
            "AccountName=mystore;AccountKey={};TableEndpoint=https://t.example.com",
            KEY
        );

        assert!(ConnectionString::parse(&input).is_ok());
    }

    #[test]
    fn empty_input_is_rejected() {
        assert!(matches!(
            ConnectionString::parse("   "),
            Err(ConnectionError::Empty)
        ));
    }

    #[test]
    fn setting_without_equals_is_rejected() {
        let result = ConnectionString::parse("AccountName=mystore;garbage");

        assert!(matches!(result, Err(ConnectionError::MissingValue { .. })));
    }

    #[test]
    fn uppercase_account_name_is_rejected() {
        let input = format!("AccountName=MyStore;AccountKey={}", KEY);

        assert!(matches!(
            ConnectionString::parse(&input),
            Err(ConnectionError::InvalidAccountName { .. })
        ));
    }

    #[test]
    fn non_base64_key_is_rejected() {
        let result = ConnectionString::parse("AccountName=mystore;AccountKey=not*base64");

        assert!(matches!(
            result,
            Err(ConnectionError::InvalidAccountKey { .. })
        ));
    }

    #[test]
    fn missing_key_is_rejected() {
        assert!(matches!(
            ConnectionString::parse("AccountName=mystore"),
            Err(ConnectionError::MissingAccountKey)
        ));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            ConnectionString::parse("AccountName=mystore;AccountKey="),
            Err(ConnectionError::MissingAccountKey)
        ));
    }

    #[test]
    fn bogus_protocol_is_rejected() {
        let input = format!(
            "DefaultEndpointsProtocol=ftp;AccountName=mystore;AccountKey={}",
            KEY
        );

        assert!(matches!(
            ConnectionString::parse(&input),
            Err(ConnectionError::InvalidProtocol { .. })
        ));
    }
}
