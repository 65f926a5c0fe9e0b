/// File categorization for organizing files by type.
///
/// Maps MIME types and file extensions to one of a closed set of seven
/// categories. Classification is a pure function of the inputs: the same
/// MIME type / extension pair always yields the same category, with no
/// filesystem access involved.
///
/// # Examples
///
/// ```
/// use dupesort::file_category::{Category, FileMapper};
///
/// let mapper = FileMapper::default();
/// assert_eq!(mapper.mime_to_category("image/png"), Some(Category::Image));
/// assert_eq!(mapper.extension_to_category("pdf"), Some(Category::Document));
/// assert_eq!(mapper.categorize(None, None), Category::Other);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One of the fixed classification buckets assigned to every file.
///
/// The set is closed: unrecognized types always land in [`Category::Other`],
/// so every file gets exactly one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Documents (PDF, DOCX, TXT, Markdown, CSV, XLSX, ...)
    Document,
    /// Images (PNG, JPG, GIF, SVG, HEIC, ...)
    Image,
    /// Videos (MP4, MOV, AVI, MKV, ...)
    Video,
    /// Audio (MP3, WAV, M4A, FLAC, ...)
    Audio,
    /// Source code and structured text (Python, JS, Rust, JSON, ...)
    Code,
    /// Archives (ZIP, RAR, TAR, GZ, ...)
    Archive,
    /// Everything else, including files with no extension.
    Other,
}

impl Category {
    /// All categories, in report order.
    pub const ALL: [Category; 7] = [
        Category::Document,
        Category::Image,
        Category::Video,
        Category::Audio,
        Category::Code,
        Category::Archive,
        Category::Other,
    ];

    /// Returns the directory name used for this category under the
    /// destination root.
    ///
    /// # Examples
    ///
    /// ```
    /// use dupesort::file_category::Category;
    ///
    /// assert_eq!(Category::Image.dir_name(), "image");
    /// assert_eq!(Category::Other.dir_name(), "other");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Document => "document",
            Category::Image => "image",
            Category::Video => "video",
            Category::Audio => "audio",
            Category::Code => "code",
            Category::Archive => "archive",
            Category::Other => "other",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Maps MIME types and file extensions to categories.
///
/// Lookups are case-insensitive. The standard tables can be extended with
/// custom mappings, but the category set itself is fixed.
#[derive(Debug, Clone)]
pub struct FileMapper {
    mime_map: HashMap<String, Category>,
    extension_map: HashMap<String, Category>,
}

impl FileMapper {
    /// Creates a new `FileMapper` with all standard mappings.
    pub fn new() -> Self {
        let mut mapper = Self {
            mime_map: HashMap::new(),
            extension_map: HashMap::new(),
        };
        mapper.populate_standard_mappings();
        mapper
    }

    fn populate_standard_mappings(&mut self) {
        // Image MIME types
        for mime in [
            "image/png",
            "image/jpeg",
            "image/jpg",
            "image/gif",
            "image/webp",
            "image/svg+xml",
            "image/bmp",
            "image/tiff",
            "image/heic",
            "image/heif",
            "image/x-icon",
        ] {
            self.add_mime_mapping(mime, Category::Image);
        }

        // Audio MIME types
        for mime in [
            "audio/mpeg",
            "audio/wav",
            "audio/x-wav",
            "audio/ogg",
            "audio/flac",
            "audio/aac",
            "audio/x-m4a",
            "audio/midi",
            "audio/webm",
        ] {
            self.add_mime_mapping(mime, Category::Audio);
        }

        // Video MIME types
        for mime in [
            "video/mp4",
            "video/mpeg",
            "video/quicktime",
            "video/x-msvideo",
            "video/x-matroska",
            "video/webm",
            "video/x-flv",
            "video/x-ms-wmv",
            "video/3gpp",
        ] {
            self.add_mime_mapping(mime, Category::Video);
        }

        // Document MIME types. Spreadsheets and presentations are documents
        // here; the category set is fixed at seven buckets.
        for mime in [
            "application/pdf",
            "text/plain",
            "text/html",
            "text/markdown",
            "text/csv",
            "application/msword",
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            "application/vnd.ms-excel",
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            "application/vnd.ms-powerpoint",
            "application/vnd.openxmlformats-officedocument.presentationml.presentation",
            "application/vnd.oasis.opendocument.text",
            "application/vnd.oasis.opendocument.spreadsheet",
            "application/vnd.oasis.opendocument.presentation",
            "application/rtf",
            "application/epub+zip",
        ] {
            self.add_mime_mapping(mime, Category::Document);
        }

        // Archive MIME types
        for mime in [
            "application/zip",
            "application/x-rar-compressed",
            "application/vnd.rar",
            "application/x-7z-compressed",
            "application/x-tar",
            "application/gzip",
            "application/x-bzip2",
            "application/x-xz",
        ] {
            self.add_mime_mapping(mime, Category::Archive);
        }

        // Code MIME types
        for mime in [
            "text/x-python",
            "text/x-java",
            "text/x-c",
            "text/x-c++src",
            "text/x-rust",
            "text/x-go",
            "text/x-shellscript",
            "text/javascript",
            "application/javascript",
            "application/json",
            "application/xml",
            "text/xml",
            "text/x-yaml",
            "text/x-toml",
            "application/x-sql",
        ] {
            self.add_mime_mapping(mime, Category::Code);
        }

        // Extension mappings (case-insensitive)
        for ext in [
            "pdf", "doc", "docx", "txt", "md", "rtf", "odt", "epub", "csv", "xls", "xlsx", "ods",
            "ppt", "pptx", "odp", "html", "htm",
        ] {
            self.add_extension_mapping(ext, Category::Document);
        }

        for ext in [
            "jpg", "jpeg", "png", "gif", "svg", "webp", "bmp", "tiff", "tif", "ico", "heic",
            "heif",
        ] {
            self.add_extension_mapping(ext, Category::Image);
        }

        for ext in ["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm", "mpeg", "mpg", "3gp"] {
            self.add_extension_mapping(ext, Category::Video);
        }

        for ext in ["mp3", "wav", "m4a", "flac", "aac", "ogg", "wma", "mid", "midi"] {
            self.add_extension_mapping(ext, Category::Audio);
        }

        for ext in [
            "py", "js", "ts", "jsx", "tsx", "java", "c", "cpp", "h", "hpp", "cs", "go", "rs",
            "rb", "php", "swift", "kt", "sh", "bash", "css", "json", "xml", "yaml", "yml", "toml",
            "sql", "lua", "pl",
        ] {
            self.add_extension_mapping(ext, Category::Code);
        }

        for ext in ["zip", "rar", "7z", "tar", "gz", "bz2", "xz", "tgz", "iso"] {
            self.add_extension_mapping(ext, Category::Archive);
        }
    }

    /// Adds a MIME type to category mapping.
    pub fn add_mime_mapping(&mut self, mime: &str, category: Category) {
        self.mime_map.insert(mime.to_lowercase(), category);
    }

    /// Adds a file extension to category mapping.
    pub fn add_extension_mapping(&mut self, ext: &str, category: Category) {
        self.extension_map.insert(ext.to_lowercase(), category);
    }

    /// Maps a MIME type to a category.
    pub fn mime_to_category(&self, mime_type: &str) -> Option<Category> {
        self.mime_map.get(&mime_type.to_lowercase()).copied()
    }

    /// Maps a file extension to a category.
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(&ext.to_lowercase()).copied()
    }

    /// Determines the category for a file given its sniffed MIME type
    /// and/or extension.
    ///
    /// Strategy:
    /// 1. Match by MIME type first (content sniffing is more reliable)
    /// 2. Fall back to the file extension
    /// 3. Return [`Category::Other`] if neither matches
    ///
    /// # Examples
    ///
    /// ```
    /// use dupesort::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::default();
    /// assert_eq!(mapper.categorize(Some("image/png"), Some("png")), Category::Image);
    /// assert_eq!(mapper.categorize(None, Some("pdf")), Category::Document);
    /// assert_eq!(mapper.categorize(None, None), Category::Other);
    /// ```
    pub fn categorize(&self, mime_type: Option<&str>, ext: Option<&str>) -> Category {
        if let Some(mime) = mime_type
            && let Some(category) = self.mime_to_category(mime)
        {
            return category;
        }

        if let Some(extension) = ext
            && let Some(category) = self.extension_to_category(extension)
        {
            return category;
        }

        Category::Other
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_dir_names() {
        assert_eq!(Category::Document.dir_name(), "document");
        assert_eq!(Category::Image.dir_name(), "image");
        assert_eq!(Category::Video.dir_name(), "video");
        assert_eq!(Category::Audio.dir_name(), "audio");
        assert_eq!(Category::Code.dir_name(), "code");
        assert_eq!(Category::Archive.dir_name(), "archive");
        assert_eq!(Category::Other.dir_name(), "other");
    }

    #[test]
    fn test_all_covers_every_bucket() {
        assert_eq!(Category::ALL.len(), 7);
        let names: Vec<_> = Category::ALL.iter().map(|c| c.dir_name()).collect();
        assert!(names.contains(&"document"));
        assert!(names.contains(&"other"));
    }

    #[test]
    fn test_mime_to_category() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.mime_to_category("image/png"), Some(Category::Image));
        assert_eq!(mapper.mime_to_category("audio/mpeg"), Some(Category::Audio));
        assert_eq!(
            mapper.mime_to_category("application/pdf"),
            Some(Category::Document)
        );
        assert_eq!(
            mapper.mime_to_category("application/zip"),
            Some(Category::Archive)
        );
        assert_eq!(mapper.mime_to_category("unknown/type"), None);
    }

    #[test]
    fn test_mime_lookup_case_insensitive() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.mime_to_category("IMAGE/PNG"), Some(Category::Image));
        assert_eq!(mapper.mime_to_category("Image/Png"), Some(Category::Image));
    }

    #[test]
    fn test_extension_to_category() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.extension_to_category("pdf"), Some(Category::Document));
        assert_eq!(mapper.extension_to_category("mp3"), Some(Category::Audio));
        assert_eq!(mapper.extension_to_category("rs"), Some(Category::Code));
        assert_eq!(mapper.extension_to_category("PNG"), Some(Category::Image));
    }

    #[test]
    fn test_spreadsheets_and_presentations_are_documents() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.extension_to_category("csv"), Some(Category::Document));
        assert_eq!(
            mapper.extension_to_category("xlsx"),
            Some(Category::Document)
        );
        assert_eq!(
            mapper.extension_to_category("pptx"),
            Some(Category::Document)
        );
    }

    #[test]
    fn test_categorize_prefers_mime() {
        let mapper = FileMapper::default();
        // A PNG renamed to .txt is still an image.
        assert_eq!(
            mapper.categorize(Some("image/png"), Some("txt")),
            Category::Image
        );
    }

    #[test]
    fn test_categorize_falls_back_to_extension() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.categorize(None, Some("pdf")), Category::Document);
        assert_eq!(
            mapper.categorize(Some("application/octet-stream"), Some("py")),
            Category::Code
        );
    }

    #[test]
    fn test_categorize_defaults_to_other() {
        let mapper = FileMapper::default();
        assert_eq!(mapper.categorize(None, None), Category::Other);
        assert_eq!(
            mapper.categorize(Some("unknown/type"), Some("xyz")),
            Category::Other
        );
    }

    #[test]
    fn test_custom_mapping() {
        let mut mapper = FileMapper::default();
        mapper.add_extension_mapping("parquet", Category::Code);
        assert_eq!(
            mapper.extension_to_category("parquet"),
            Some(Category::Code)
        );
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&Category::Document).unwrap();
        assert_eq!(json, "\"document\"");
    }
}
