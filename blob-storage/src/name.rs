use std::fmt::{self, Display, Formatter};

use crate::digest::{canonical_name, digest, DIGEST_HEX_LEN};
use crate::extension::extension_of;

/// A name of the form `<digest>.<extension>`.
///
/// The key is kept exactly as given so lookups hit the same object that was
/// requested, while the digest comparison ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobName {
    key: String,
    extension: String,
}

impl BlobName {
    /// Builds the canonical name for `data` stored with `extension`.
    pub(crate) fn for_content(data: &[u8], extension: &str) -> Self {
        let extension = extension.to_ascii_lowercase();
        Self {
            key: canonical_name(&digest(data), &extension),
            extension,
        }
    }

    /// Parses a requested name. Anything that is not a hex digest followed by
    /// an allowed extension is not a blob name, including path tricks.
    pub fn parse(name: &str) -> Option<Self> {
        let (digest, _) = name.split_once('.')?;
        if digest.len() != DIGEST_HEX_LEN || !digest.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        // exactly one dot
        let extension = extension_of(name)?;
        if name.len() != DIGEST_HEX_LEN + 1 + extension.len() {
            return None;
        }
        Some(Self {
            key: name.to_string(),
            extension,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn digest(&self) -> &str {
        &self.key[..DIGEST_HEX_LEN]
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    pub fn content_type(&self) -> String {
        format!("image/{}", self.extension)
    }

    /// Integrity re-check: does `data` still hash to this name's digest?
    pub fn matches(&self, data: &[u8]) -> bool {
        digest(data).eq_ignore_ascii_case(self.digest())
    }
}

impl Display for BlobName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key)
    }
}

impl AsRef<str> for BlobName {
    fn as_ref(&self) -> &str {
        &self.key
    }
}
