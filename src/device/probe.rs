//! Device validation and size query

use super::error::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Seek, SeekFrom};
use std::os::unix::fs::FileTypeExt;
use std::path::Path;

/// Check that `path` names a regular file or block device and return its
/// opened handle together with its length in bytes.
///
/// The length comes from seeking to the end rather than from metadata, since
/// block devices report a metadata length of zero.
pub(crate) fn probe(path: &Path) -> Result<(File, u64)> {
    let metadata = match fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(Error::NotFound {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    let file_type = metadata.file_type();
    if !file_type.is_file() && !file_type.is_block_device() {
        return Err(Error::InvalidDeviceType {
            path: path.to_path_buf(),
        });
    }

    let size_query_failed = |source| Error::SizeQueryFailed {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(size_query_failed)?;
    let size = file.seek(SeekFrom::End(0)).map_err(size_query_failed)?;

    Ok((file, size))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, tempdir};

    #[test]
    fn test_probe_regular_file() {
        let mut tmp = NamedTempFile::new().unwrap();
        tmp.write_all(&[7u8; 1234]).unwrap();
        tmp.flush().unwrap();

        let (_, size) = probe(tmp.path()).unwrap();
        assert_eq!(size, 1234);
    }

    #[test]
    fn test_probe_missing_path() {
        let dir = tempdir().unwrap();
        let err = probe(&dir.path().join("missing.img")).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_probe_directory() {
        let dir = tempdir().unwrap();
        let err = probe(dir.path()).unwrap_err();
        assert!(matches!(err, Error::InvalidDeviceType { .. }));
    }
}
