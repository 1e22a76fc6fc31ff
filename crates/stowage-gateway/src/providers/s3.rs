use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{
    BehaviorVersion, Credentials, Region, RequestChecksumCalculation, ResponseChecksumValidation,
};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use stowage_core::{ObjectKey, ObjectStore, StoreError, StoredObject};
use tracing::debug;

use crate::config::{ENV_ACCESS_KEY, StoreConfig};
use crate::error::GatewayError;

const CREDENTIALS_PROVIDER: &str = "stowage";

/// [`ObjectStore`] backed by an S3 or S3-compatible bucket.
///
/// S3 reports success for deletes of missing keys, so `delete` never
/// returns [`StoreError::NotFound`].
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    /// Build a client from static configuration.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::MissingSetting`] if `config` carries no
    /// credentials. Use [`S3Store::from_client`] for ambient credentials.
    pub fn from_config(config: &StoreConfig) -> Result<Self, GatewayError> {
        let credentials = config
            .credentials
            .as_ref()
            .ok_or(GatewayError::MissingSetting {
                name: ENV_ACCESS_KEY,
            })?;

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .credentials_provider(Credentials::new(
                credentials.access_key.clone(),
                credentials.secret_key.clone(),
                None,
                None,
                CREDENTIALS_PROVIDER,
            ))
            .request_checksum_calculation(RequestChecksumCalculation::WhenRequired)
            .response_checksum_validation(ResponseChecksumValidation::WhenRequired)
            .force_path_style(config.force_path_style);
        if let Some(endpoint) = &config.endpoint {
            builder = builder.endpoint_url(endpoint.clone());
        }

        Ok(Self::from_client(
            Client::from_conf(builder.build()),
            config.bucket.clone(),
        ))
    }

    #[must_use]
    pub fn from_client(client: Client, bucket: impl Into<String>) -> Self {
        Self {
            client,
            bucket: bucket.into(),
        }
    }

    #[must_use]
    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &ObjectKey,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|err| StoreError::transport("put_object", key, err))?;
        debug!(bucket = %self.bucket, key = %key, "put_object succeeded");
        Ok(())
    }

    async fn get(&self, key: &ObjectKey) -> Result<StoredObject, StoreError> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|err| {
                if err
                    .as_service_error()
                    .is_some_and(GetObjectError::is_no_such_key)
                {
                    StoreError::NotFound { key: key.clone() }
                } else {
                    StoreError::transport("get_object", key, err)
                }
            })?;

        let content_type = output.content_type.clone();
        let body = output
            .body
            .collect()
            .await
            .map_err(|err| StoreError::transport("get_object", key, err))?
            .into_bytes();
        Ok(StoredObject { body, content_type })
    }

    async fn delete(&self, key: &ObjectKey) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key.as_str())
            .send()
            .await
            .map_err(|err| StoreError::transport("delete_object", key, err))?;
        debug!(bucket = %self.bucket, key = %key, "delete_object succeeded");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_config_requires_credentials() {
        let err = S3Store::from_config(&StoreConfig::new("assets", "eu-west-1"))
            .expect_err("no credentials");
        assert!(matches!(err, GatewayError::MissingSetting { name } if name == ENV_ACCESS_KEY));
    }

    #[test]
    fn from_config_targets_configured_bucket() -> anyhow::Result<()> {
        let config = StoreConfig::new("assets", "eu-west-1").with_credentials("AKIA", "secret");
        let store = S3Store::from_config(&config)?;
        assert_eq!(store.bucket(), "assets");
        Ok(())
    }
}
