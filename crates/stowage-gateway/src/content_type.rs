use stowage_core::ObjectKey;

/// Used when neither the extension nor the store identifies the object.
pub const FALLBACK_CONTENT_TYPE: &str = "application/pdf";

fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension {
        "pdf" => Some("application/pdf"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        _ => None,
    }
}

/// Content type to serve for a fetched object.
///
/// The key's extension wins for the common document and image types since
/// stores often report `application/octet-stream` for them; otherwise the
/// store-reported type is used.
#[must_use]
pub fn resolve_content_type(key: &ObjectKey, reported: Option<&str>) -> String {
    let extension = key
        .file_name()
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase());

    extension
        .as_deref()
        .and_then(content_type_for_extension)
        .or(reported.filter(|value| !value.is_empty()))
        .unwrap_or(FALLBACK_CONTENT_TYPE)
        .to_string()
}
