use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header names the backend reads Redis Cloud API credentials from.
pub const CLOUD_API_KEY_HEADER: &str = "x-cloud-api-key";
pub const CLOUD_API_SECRET_HEADER: &str = "x-cloud-api-secret";

/// Redis Cloud API key pair. The secret never leaves memory except as a header.
#[derive(Clone)]
pub struct CloudCredentials {
    pub access_key: String,
    secret_key: SecretString,
}

impl CloudCredentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: SecretString::from(secret_key.into()),
        }
    }

    pub fn headers(&self) -> [(&'static str, String); 2] {
        [
            (CLOUD_API_KEY_HEADER, self.access_key.clone()),
            (
                CLOUD_API_SECRET_HEADER,
                self.secret_key.expose_secret().to_string(),
            ),
        ]
    }
}

impl PartialEq for CloudCredentials {
    fn eq(&self, other: &Self) -> bool {
        self.access_key == other.access_key
            && self.secret_key.expose_secret() == other.secret_key.expose_secret()
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudAccount {
    pub account_id: i64,
    pub account_name: String,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub owner_email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSubscription {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub number_of_databases: i64,
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudInstance {
    pub subscription_id: i64,
    pub database_id: i64,
    pub name: String,
    #[serde(default)]
    pub public_endpoint: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub free: bool,
    #[serde(default)]
    pub subscription_name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudSubscriptionRef {
    pub subscription_id: i64,
    pub free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GetCloudInstancesRequest {
    pub subscriptions: Vec<CloudSubscriptionRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudDatabaseRef {
    pub subscription_id: i64,
    pub database_id: i64,
    pub free: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportCloudDatabasesRequest {
    pub databases: Vec<CloudDatabaseRef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImportStatus {
    Success,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CloudImportResult {
    pub subscription_id: i64,
    pub database_id: i64,
    pub status: ImportStatus,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub database_details: Option<CloudInstance>,
}

/// Instance row of the import result table.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudInstanceAdded {
    pub instance: Option<CloudInstance>,
    pub subscription_id_added: i64,
    pub database_id_added: i64,
    pub status_added: ImportStatus,
    pub message_added: String,
    pub subscription_name: Option<String>,
}

// Azure

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureSubscription {
    pub subscription_id: String,
    pub display_name: String,
    #[serde(default)]
    pub state: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDatabase {
    pub id: String,
    pub name: String,
    pub subscription_id: String,
    #[serde(default)]
    pub resource_group: String,
    #[serde(default)]
    pub location: String,
    pub host: String,
    pub port: u16,
    #[serde(rename = "type", default)]
    pub database_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AzureDatabaseRef {
    pub id: String,
    pub subscription_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportAzureDatabasesRequest {
    pub databases: Vec<AzureDatabaseRef>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AzureImportResult {
    pub id: String,
    pub status: ImportStatus,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AzureDatabaseAdded {
    pub database: Option<AzureDatabase>,
    pub id: String,
    pub status_added: ImportStatus,
    pub message_added: String,
}

// Microsoft sign-in

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MicrosoftAuthStatus {
    #[default]
    SignedOut,
    Pending,
    SignedIn,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicrosoftAccount {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MicrosoftAuthStatusResponse {
    pub status: MicrosoftAuthStatus,
    #[serde(default)]
    pub account: Option<MicrosoftAccount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MicrosoftLoginResponse {
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_hide_secret_in_debug_output() {
        let credentials = CloudCredentials::new("key", "very-secret");
        let rendered = format!("{credentials:?}");

        assert!(rendered.contains("key"));
        assert!(!rendered.contains("very-secret"));
    }

    #[test]
    fn credentials_expose_secret_only_as_header() {
        let credentials = CloudCredentials::new("key", "very-secret");
        let headers = credentials.headers();

        assert_eq!(headers[0], (CLOUD_API_KEY_HEADER, "key".to_string()));
        assert_eq!(headers[1], (CLOUD_API_SECRET_HEADER, "very-secret".to_string()));
        assert_eq!(credentials, CloudCredentials::new("key", "very-secret"));
    }
}
