use std::sync::Arc;

use bytes::Bytes;
use stowage_core::{Action, ObjectKey, ObjectStore};
use stowage_ledger::Ledger;
use tracing::debug;

use crate::config::StoreConfig;
use crate::content_type::resolve_content_type;
use crate::error::GatewayError;
use crate::link::LinkTranslator;
use crate::scope::Scope;
use crate::sniff::{MagicSniffer, MediaSniffer, SNIFF_LEN};

/// An object read back from the store, ready to serve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedObject {
    pub body: Bytes,
    pub content_type: String,
    /// Last segment of the key, for download headers.
    pub file_name: String,
}

/// Entry point for storage operations.
///
/// Calls made directly on the gateway record nothing. Calls made through a
/// [`Scope`] from [`Gateway::begin`] record a compensating action for every
/// successful upload or replace.
///
/// The gateway is cheap to clone and safe to share between concurrent
/// workflows; each workflow owns its own scope.
#[derive(Clone)]
pub struct Gateway {
    store: Arc<dyn ObjectStore>,
    sniffer: Arc<dyn MediaSniffer>,
    links: LinkTranslator,
}

impl Gateway {
    #[must_use]
    pub fn new(
        store: Arc<dyn ObjectStore>,
        sniffer: Arc<dyn MediaSniffer>,
        links: LinkTranslator,
    ) -> Self {
        Self {
            store,
            sniffer,
            links,
        }
    }

    /// Gateway with the default [`MagicSniffer`] and links for `config`.
    #[must_use]
    pub fn from_config(store: Arc<dyn ObjectStore>, config: &StoreConfig) -> Self {
        Self::new(
            store,
            Arc::new(MagicSniffer),
            LinkTranslator::from_config(config),
        )
    }

    /// Open a fresh scope that records this workflow's mutations.
    #[must_use]
    pub fn begin(&self) -> Scope<'_> {
        Scope::new(self)
    }

    #[must_use]
    pub fn links(&self) -> &LinkTranslator {
        &self.links
    }

    pub(crate) fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Upload `content` as `folder/name` and return its key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidMediaType`] if `allowed` is non-empty
    /// and does not contain the sniffed type, [`GatewayError::InvalidKey`]
    /// for a malformed folder or name, and [`GatewayError::Transport`] if
    /// the store rejects the upload. No remote call is made on validation
    /// failure.
    pub async fn put(
        &self,
        name: &str,
        content: Bytes,
        folder: &str,
        allowed: &[&str],
    ) -> Result<ObjectKey, GatewayError> {
        self.put_recorded(name, content, folder, allowed, None).await
    }

    /// Overwrite the object at `key`.
    ///
    /// # Errors
    ///
    /// Same as [`Gateway::put`].
    pub async fn replace(
        &self,
        key: &ObjectKey,
        content: Bytes,
        allowed: &[&str],
    ) -> Result<ObjectKey, GatewayError> {
        self.replace_recorded(key, content, allowed, None).await
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if the store reports the object
    /// missing and [`GatewayError::Transport`] for any other failure.
    pub async fn delete(&self, key: &ObjectKey) -> Result<(), GatewayError> {
        self.store.delete(key).await?;
        debug!(key = %key, "deleted object");
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no object exists under `key`.
    pub async fn fetch(&self, key: &ObjectKey) -> Result<FetchedObject, GatewayError> {
        let object = self.store.get(key).await?;
        Ok(FetchedObject {
            content_type: resolve_content_type(key, object.content_type.as_deref()),
            file_name: key.file_name().to_string(),
            body: object.body,
        })
    }

    /// Resolve a previously issued link to an object key.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidKey`] if the translated value is not a
    /// valid key.
    pub fn translate(&self, link: &str) -> Result<ObjectKey, GatewayError> {
        Ok(ObjectKey::parse(self.links.translate(link))?)
    }

    #[must_use]
    pub fn public_link(&self, key: &ObjectKey) -> String {
        self.links.public_link(key)
    }

    pub(crate) async fn put_recorded(
        &self,
        name: &str,
        content: Bytes,
        folder: &str,
        allowed: &[&str],
        ledger: Option<&mut Ledger>,
    ) -> Result<ObjectKey, GatewayError> {
        let content_type = self.check_media_type(&content, allowed)?;
        let key = ObjectKey::new(folder, name)?;

        self.store.put(&key, content, &content_type).await?;
        debug!(key = %key, content_type = %content_type, "uploaded object");

        if let Some(ledger) = ledger {
            ledger.record_if_active(Action::upload(key.clone()));
        }
        Ok(key)
    }

    pub(crate) async fn replace_recorded(
        &self,
        key: &ObjectKey,
        content: Bytes,
        allowed: &[&str],
        ledger: Option<&mut Ledger>,
    ) -> Result<ObjectKey, GatewayError> {
        let content_type = self.check_media_type(&content, allowed)?;

        self.store.put(key, content, &content_type).await?;
        debug!(key = %key, content_type = %content_type, "replaced object");

        if let Some(ledger) = ledger {
            ledger.record_if_active(Action::update(key.clone()));
        }
        Ok(key.clone())
    }

    fn check_media_type(&self, content: &[u8], allowed: &[&str]) -> Result<String, GatewayError> {
        let head = &content[..content.len().min(SNIFF_LEN)];
        let detected = self.sniffer.sniff(head);
        if allowed.is_empty() || allowed.contains(&detected.as_str()) {
            Ok(detected)
        } else {
            Err(GatewayError::InvalidMediaType {
                detected,
                allowed: allowed.iter().map(ToString::to_string).collect(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use stowage_core::testing::{RecordingStore, StoreCall};

    use super::*;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    fn gateway(store: &Arc<RecordingStore>) -> Gateway {
        Gateway::from_config(store.clone(), &StoreConfig::new("assets", "eu-west-1"))
    }

    #[tokio::test]
    async fn put_stores_under_folder_with_sniffed_type() -> anyhow::Result<()> {
        let store = Arc::new(RecordingStore::new());

        let key = gateway(&store)
            .put("avatar.png", Bytes::from_static(PNG), "users/42", &["image/png"])
            .await?;

        assert_eq!(key.as_str(), "users/42/avatar.png");
        assert_eq!(
            store.calls(),
            vec![StoreCall::Put {
                key: key.clone(),
                content_type: "image/png".to_string(),
            }]
        );
        Ok(())
    }

    #[tokio::test]
    async fn disallowed_media_type_makes_no_remote_call() {
        let store = Arc::new(RecordingStore::new());

        let err = gateway(&store)
            .put(
                "avatar.png",
                Bytes::from_static(b"GIF89a\x01\x00"),
                "users/42",
                &["image/png", "image/jpeg"],
            )
            .await
            .expect_err("gif is not allowed");

        assert!(matches!(
            &err,
            GatewayError::InvalidMediaType { detected, .. } if detected == "image/gif"
        ));
        assert!(err.is_validation());
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn empty_allow_list_accepts_anything() -> anyhow::Result<()> {
        let store = Arc::new(RecordingStore::new());

        gateway(&store)
            .put("blob.bin", Bytes::from_static(b"\x00\x01\x02"), "misc", &[])
            .await?;

        assert_eq!(store.call_count(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn malformed_name_makes_no_remote_call() {
        let store = Arc::new(RecordingStore::new());

        let err = gateway(&store)
            .put("../x.png", Bytes::from_static(PNG), "users", &[])
            .await
            .expect_err("name with separator");

        assert!(matches!(err, GatewayError::InvalidKey(_)));
        assert_eq!(store.call_count(), 0);
    }

    #[tokio::test]
    async fn fetch_resolves_type_and_display_name() -> anyhow::Result<()> {
        let store = Arc::new(RecordingStore::new());
        let key = ObjectKey::parse("docs/2024/report.PDF")?;
        store.seed(&key, b"%PDF-1.4", Some("binary/octet-stream"));

        let fetched = gateway(&store).fetch(&key).await?;

        assert_eq!(fetched.content_type, "application/pdf");
        assert_eq!(fetched.file_name, "report.PDF");
        assert_eq!(fetched.body, Bytes::from_static(b"%PDF-1.4"));
        Ok(())
    }

    #[tokio::test]
    async fn fetch_and_delete_of_missing_object_report_not_found() -> anyhow::Result<()> {
        let store = Arc::new(RecordingStore::new());
        let gateway = gateway(&store);
        let key = ObjectKey::parse("docs/missing.pdf")?;

        assert!(matches!(
            gateway.fetch(&key).await,
            Err(GatewayError::NotFound { .. })
        ));
        assert!(matches!(
            gateway.delete(&key).await,
            Err(GatewayError::NotFound { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn transport_failure_surfaces_as_transport_error() {
        let store = Arc::new(RecordingStore::new().failing_all_puts());

        let err = gateway(&store)
            .put("a.png", Bytes::from_static(PNG), "users", &[])
            .await
            .expect_err("put fails");

        assert!(matches!(err, GatewayError::Transport(_)));
        assert!(!err.is_validation());
    }

    #[test]
    fn translate_validates_resulting_key() -> anyhow::Result<()> {
        let store = Arc::new(RecordingStore::new());
        let gateway = gateway(&store);

        let key = gateway.translate("https://assets.s3.eu-west-1.amazonaws.com/users/1.png")?;
        assert_eq!(key.as_str(), "users/1.png");

        assert!(matches!(
            gateway.translate("https://assets.s3.eu-west-1.amazonaws.com/"),
            Err(GatewayError::InvalidKey(_))
        ));
        Ok(())
    }
}
