use md5::{Digest, Md5};

/// Length of a hex-encoded content digest.
pub const DIGEST_HEX_LEN: usize = 32;

/// Computes the content digest of `data` as lowercase hex.
///
/// MD5, not a security boundary. Names must stay identical to those already
/// written by earlier deployments of the gallery.
pub fn digest(data: &[u8]) -> String {
    format!("{:x}", Md5::digest(data))
}

/// Joins a digest and an extension into the name a blob is stored under.
pub fn canonical_name(digest: &str, extension: &str) -> String {
    format!("{digest}.{extension}")
}
