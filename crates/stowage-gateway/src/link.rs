use stowage_core::ObjectKey;

use crate::config::{DEFAULT_MIGRATION_HOST, StoreConfig};

fn root_of(host: &str) -> String {
    format!("{}/", host.trim_end_matches('/'))
}

/// Maps previously issued public links back to object keys.
///
/// Prefixes are tried in a fixed order: the legacy host first, then the
/// virtual-hosted-style URL, then the path-style URL. Links from the legacy
/// host and the current store can coexist during a migration, and a legacy
/// link must never be misread as a current one.
///
/// Link migration ([`LinkTranslator::is_legacy_link`] and
/// [`LinkTranslator::legacy_key`]) checks a separate migration host, which
/// defaults to [`DEFAULT_MIGRATION_HOST`] and is not the legacy host that
/// [`LinkTranslator::translate`] strips.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkTranslator {
    bucket: String,
    legacy_prefix: String,
    migration_root: String,
    migration_prefix: String,
    virtual_hosted_prefix: String,
    path_style_prefix: String,
}

impl LinkTranslator {
    #[must_use]
    pub fn new(bucket: &str, region: &str, legacy_host: &str) -> Self {
        let migration_root = root_of(DEFAULT_MIGRATION_HOST);
        Self {
            legacy_prefix: format!("{}{bucket}/", root_of(legacy_host)),
            migration_prefix: format!("{migration_root}{bucket}/"),
            migration_root,
            bucket: bucket.to_string(),
            virtual_hosted_prefix: format!("https://{bucket}.s3.{region}.amazonaws.com/"),
            path_style_prefix: format!("https://s3.{region}.amazonaws.com/{bucket}/"),
        }
    }

    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(&config.bucket, &config.region, &config.legacy_host)
            .with_migration_host(&config.migration_host)
    }

    /// Use `host` for [`LinkTranslator::is_legacy_link`] and
    /// [`LinkTranslator::legacy_key`].
    #[must_use]
    pub fn with_migration_host(mut self, host: &str) -> Self {
        self.migration_root = root_of(host);
        self.migration_prefix = format!("{}{}/", self.migration_root, self.bucket);
        self
    }

    /// Strip the first matching prefix; return the link unchanged otherwise.
    #[must_use]
    pub fn translate<'a>(&self, link: &'a str) -> &'a str {
        [
            &self.legacy_prefix,
            &self.virtual_hosted_prefix,
            &self.path_style_prefix,
        ]
        .into_iter()
        .find_map(|prefix| link.strip_prefix(prefix.as_str()))
        .unwrap_or(link)
    }

    /// Whether the link points at the migration host at all, for any bucket.
    #[must_use]
    pub fn is_legacy_link(&self, link: &str) -> bool {
        link.starts_with(&self.migration_root)
    }

    /// Key of a migration-host link for this bucket, or `None` for any
    /// other link.
    #[must_use]
    pub fn legacy_key<'a>(&self, link: &'a str) -> Option<&'a str> {
        link.strip_prefix(self.migration_prefix.as_str())
    }

    /// Virtual-hosted-style URL for `key`.
    #[must_use]
    pub fn public_link(&self, key: &ObjectKey) -> String {
        format!("{}{key}", self.virtual_hosted_prefix)
    }
}
