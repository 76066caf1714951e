use super::types::{DailyRecord, ToDoItem};
use crate::shared::errors::DiaryError;
use base64::engine::general_purpose::STANDARD as B64;
use base64::Engine;
use std::path::Path;
use uuid::Uuid;

pub fn find_todo<'a>(record: &'a DailyRecord, id: &str) -> Option<&'a ToDoItem> {
    record.todo.iter().find(|item| item.id == id)
}

pub fn find_todo_mut<'a>(record: &'a mut DailyRecord, id: &str) -> Option<&'a mut ToDoItem> {
    record.todo.iter_mut().find(|item| item.id == id)
}

/// Creation time in milliseconds plus a short random suffix, so two items
/// created in the same millisecond still differ.
pub fn new_todo_id() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", chrono::Utc::now().timestamp_millis(), &suffix[..6])
}

fn mime_for_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "bmp" => Some("image/bmp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Encode raw image bytes as a `data:` URL.
pub fn to_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, B64.encode(bytes))
}

/// Read an image file into a `data:` URL, picking the MIME type from the extension.
pub fn read_photo_file(path: &Path) -> Result<String, DiaryError> {
    let mime = mime_for_extension(path).ok_or_else(|| {
        DiaryError::invalid(format!("unsupported image type: {}", path.display()))
    })?;
    let bytes = std::fs::read(path).map_err(|e| {
        DiaryError::invalid(format!("cannot read {}: {}", path.display(), e))
    })?;
    Ok(to_data_url(mime, &bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_todo_ids_are_unique() {
        let a = new_todo_id();
        let b = new_todo_id();
        assert_ne!(a, b);
        let (millis, suffix) = a.split_once('-').unwrap();
        assert!(millis.parse::<i64>().is_ok());
        assert_eq!(suffix.len(), 6);
    }

    #[test]
    fn test_mime_for_extension() {
        assert_eq!(mime_for_extension(Path::new("a.PNG")), Some("image/png"));
        assert_eq!(mime_for_extension(Path::new("b.jpeg")), Some("image/jpeg"));
        assert_eq!(mime_for_extension(Path::new("c.txt")), None);
        assert_eq!(mime_for_extension(Path::new("noext")), None);
    }

    #[test]
    fn test_read_photo_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("dot.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();
        assert_eq!(read_photo_file(&path).unwrap(), "data:image/png;base64,AQID");

        let bad = tmp.path().join("notes.txt");
        std::fs::write(&bad, "x").unwrap();
        assert!(matches!(read_photo_file(&bad), Err(DiaryError::InvalidInput(_))));
    }
}
