use serde::Serialize;

/// One entry of a bucket listing snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RemoteObject {
    pub key: String,
    /// Opaque content token reported by the store (ETag without quotes).
    pub fingerprint: String,
}

impl RemoteObject {
    pub fn new(key: impl Into<String>, fingerprint: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fingerprint: fingerprint.into(),
        }
    }
}

/// Who may read an uploaded object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Visibility {
    #[default]
    PublicRead,
}

/// Transfer metadata attached to an upload.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ObjectMetadata {
    pub cache_control: Option<String>,
    pub content_type: Option<String>,
    pub content_encoding: Option<String>,
    pub visibility: Visibility,
}

impl ObjectMetadata {
    /// Short labels for the report line, in a fixed order:
    /// `cache-headers`, `gzip`, `charset=<value>`.
    pub fn extra_info(&self) -> Vec<String> {
        let mut info = Vec::new();
        if self.cache_control.is_some() {
            info.push("cache-headers".to_string());
        }
        if self.content_encoding.is_some() {
            info.push("gzip".to_string());
        }
        if let Some(charset) = self.charset() {
            info.push(format!("charset={}", charset));
        }
        info
    }

    /// The `charset` parameter of the content type, if any.
    pub fn charset(&self) -> Option<&str> {
        self.content_type
            .as_deref()?
            .split(';')
            .map(str::trim)
            .find_map(|param| param.strip_prefix("charset="))
    }
}
