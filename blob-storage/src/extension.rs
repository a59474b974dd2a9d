/// Image extensions accepted for upload and serving. Checked against the
/// filename only; the content itself is never inspected.
pub const ALLOWED_EXTENSIONS: [&str; 7] = ["bmp", "gif", "jpg", "jpeg", "png", "tiff", "svg"];

/// Returns the lowercased extension of `filename` if it is an allowed one.
pub fn extension_of(filename: &str) -> Option<String> {
    let (_, ext) = filename.rsplit_once('.')?;
    let ext = ext.to_ascii_lowercase();
    ALLOWED_EXTENSIONS.contains(&ext.as_str()).then_some(ext)
}

pub fn is_allowed(filename: &str) -> bool {
    extension_of(filename).is_some()
}
