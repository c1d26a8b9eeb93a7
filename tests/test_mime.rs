use lantern::http::mime::{DEFAULT_CONTENT_TYPE, content_type};

#[test]
fn test_known_extensions() {
    let table = [
        ("html", "text/html"),
        ("htm", "text/html"),
        ("js", "application/javascript"),
        ("mjs", "application/javascript"),
        ("css", "text/css"),
        ("jpg", "image/jpg"),
        ("jpeg", "image/jpg"),
        ("png", "image/png"),
        ("webp", "image/webp"),
        ("gif", "image/gif"),
        ("mp3", "audio/mpeg"),
        ("mp4", "video/mp4"),
        ("mpeg", "video/mpeg"),
        ("txt", "text/plain"),
        ("doc", "application/msword"),
        ("zip", "application/zip"),
        ("7z", "application/x-7z-compressed"),
    ];

    for (ext, mime) in table {
        assert_eq!(content_type(ext), mime, "extension {}", ext);
        assert_eq!(content_type(&ext.to_uppercase()), mime, "extension {}", ext);
    }
}

#[test]
fn test_unknown_extensions_default() {
    for ext in ["exe", "", "tar.gz", "html5"] {
        assert_eq!(content_type(ext), DEFAULT_CONTENT_TYPE);
    }
    assert_eq!(DEFAULT_CONTENT_TYPE, "application/octet-stream");
}
