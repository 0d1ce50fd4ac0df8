use std::path::Path;

/// The parts of a logical key that a hashed upload keeps.
///
/// The leaf name is replaced by the content address, so only the directory and the
/// extension survive. The directory is everything before the last `/`; a key ending in
/// `/` is entirely a directory and `.` means "no directory".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadKey {
    directory: String,
    extension: Option<String>,
}

impl UploadKey {
    #[must_use]
    pub fn parse(key: &str) -> Self {
        let (directory, leaf) = key.rsplit_once('/').unwrap_or(("", key));
        let directory = if directory == "." { "" } else { directory };

        Self { directory: directory.to_owned(), extension: extension_of(leaf) }
    }

    /// Directory part of the key, empty for the bucket root.
    #[must_use]
    pub fn directory(&self) -> &str {
        &self.directory
    }

    /// Extension for the stored object, including the leading dot.
    ///
    /// Falls back to the extension of `original_name` when the key's leaf has none.
    #[must_use]
    pub fn extension(&self, original_name: Option<&str>) -> String {
        self.extension
            .clone()
            .or_else(|| original_name.and_then(|name| extension_of(leaf_of(name))))
            .unwrap_or_default()
    }
}

fn leaf_of(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

fn extension_of(leaf: &str) -> Option<String> {
    Path::new(leaf)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{ext}"))
}
