//! Upload content-type lookup

use std::path::Path;

/// MIME type of Android packages
pub const APK_CONTENT_TYPE: &str = "application/vnd.android.package-archive";

/// Fallback for unknown extensions
pub const OCTET_STREAM: &str = "application/octet-stream";

/// Resolve the content type of an upload from its file extension
pub fn content_type_for(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "apk" => APK_CONTENT_TYPE.to_string(),
        "" => OCTET_STREAM.to_string(),
        _ => mime_guess::from_ext(&ext).first_or_octet_stream().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_extensions() {
        assert_eq!(content_type_for(Path::new("app-release.apk")), APK_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("APP.APK")), APK_CONTENT_TYPE);
        assert_eq!(content_type_for(Path::new("icon.png")), "image/png");
        assert_eq!(content_type_for(Path::new("shot.jpg")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("trailer.mp4")), "video/mp4");
    }

    #[test]
    fn test_unknown_extensions_fall_back() {
        assert_eq!(content_type_for(Path::new("blob")), OCTET_STREAM);
        assert_eq!(content_type_for(Path::new("file.zzzunknown")), OCTET_STREAM);
    }
}
