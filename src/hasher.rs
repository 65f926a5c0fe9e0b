//! Streaming content hashing for duplicate detection.
//!
//! Files are read in bounded chunks so that hashing a multi-gigabyte video
//! costs the same memory as hashing a text file. The digest is a pure
//! function of the file's bytes: two files with identical content always
//! produce identical digests regardless of name, path or timestamps.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Read buffer size for streaming hashes.
const HASH_CHUNK_SIZE: usize = 64 * 1024;

/// Computes the SHA-256 digest of a file's full content, returned as a
/// lowercase hex string.
///
/// Open and read failures (permissions, file removed mid-scan, broken
/// symlink) surface as `io::Error` for the caller to record; this function
/// never panics on bad input.
///
/// # Examples
///
/// ```no_run
/// use dupesort::hasher::hash_file;
/// use std::path::Path;
///
/// let digest = hash_file(Path::new("report.pdf"))?;
/// assert_eq!(digest.len(), 64);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; HASH_CHUNK_SIZE];

    loop {
        let bytes_read = file.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex_digest(hasher))
}

/// Computes the SHA-256 digest of an in-memory byte slice.
///
/// Used by tests and by callers that already hold the content.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex_digest(hasher)
}

fn hex_digest(hasher: Sha256) -> String {
    use std::fmt::Write as _;

    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        let _ = write!(out, "{:02x}", byte);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_hash_file_matches_known_digest() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("hello.txt");
        fs::write(&path, b"hello world").expect("Failed to write file");

        // sha256("hello world")
        assert_eq!(
            hash_file(&path).expect("Failed to hash file"),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_hash_is_pure_function_of_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("sub");
        fs::create_dir(&b).expect("Failed to create subdirectory");
        let b = b.join("b.bin");

        fs::write(&a, b"same bytes").expect("Failed to write a");
        fs::write(&b, b"same bytes").expect("Failed to write b");

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_differs_on_different_content() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let a = temp_dir.path().join("a.bin");
        let b = temp_dir.path().join("b.bin");
        fs::write(&a, b"content one").unwrap();
        fs::write(&b, b"content two").unwrap();

        assert_ne!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_hash_empty_file() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("empty");
        fs::write(&path, b"").unwrap();

        // sha256 of the empty string
        assert_eq!(
            hash_file(&path).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_large_file_spanning_chunks() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("big.bin");
        let data = vec![0xABu8; HASH_CHUNK_SIZE * 2 + 17];
        fs::write(&path, &data).unwrap();

        assert_eq!(hash_file(&path).unwrap(), hash_bytes(&data));
    }

    #[test]
    fn test_hash_missing_file_is_io_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let result = hash_file(&temp_dir.path().join("does-not-exist"));
        assert!(result.is_err());
    }
}
