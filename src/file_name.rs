use std::fmt::Display;
use std::fmt::Formatter;
use std::fmt::Result as FmtResult;
use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;

use crate::message::FileNameMsg;
use crate::mmap::Mmap;
use crate::util::crc64;
use crate::ErrorExt as _;
use crate::Result;


/// The name of a file, along with a checksum of its contents.
///
/// The checksum identifies a particular version of the file. It is
/// computed with CRC-64/ECMA-182 over the entire file. A checksum of
/// zero means that the contents are unknown, e.g., because the path
/// does not refer to a regular file.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileName {
    path: PathBuf,
    checksum: u64,
}

impl FileName {
    /// Create a `FileName` for the file at `path`, checksumming its
    /// contents if it is a regular file.
    ///
    /// A `path` that does not exist is not an error: it results in a
    /// zero checksum.
    pub fn from_path<P>(path: P) -> Result<Self>
    where
        P: Into<PathBuf>,
    {
        let path = path.into();
        let checksum = checksum(&path)?;
        Ok(Self { path, checksum })
    }

    /// Create a `FileName` from a path and a previously computed
    /// checksum.
    #[inline]
    pub fn with_checksum<P>(path: P, checksum: u64) -> Self
    where
        P: Into<PathBuf>,
    {
        Self {
            path: path.into(),
            checksum,
        }
    }

    /// Retrieve the path of the file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Retrieve the checksum of the file's contents, or zero if
    /// unknown.
    #[inline]
    pub fn checksum(&self) -> u64 {
        self.checksum
    }

    /// Check whether `self` and `other` may refer to the same version
    /// of the same file.
    ///
    /// The paths have to be equal. The checksums have to be equal as
    /// well, unless one of them is unknown.
    pub fn matches(&self, other: &Self) -> bool {
        self.path == other.path
            && (self.checksum == 0 || other.checksum == 0 || self.checksum == other.checksum)
    }

    /// Check whether the file on disk still has the contents described
    /// by this object.
    pub fn is_current(&self) -> Result<bool> {
        let current = Self::from_path(self.path.clone())?;
        Ok(current.checksum == self.checksum)
    }
}

impl From<&FileNameMsg> for FileName {
    fn from(other: &FileNameMsg) -> Self {
        Self::with_checksum(other.path.clone(), other.checksum)
    }
}

impl From<&FileName> for FileNameMsg {
    fn from(other: &FileName) -> Self {
        Self {
            path: other.path.clone(),
            checksum: other.checksum,
        }
    }
}

impl Display for FileName {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "0x{:016X}: {:?}", self.checksum, self.path)
    }
}


fn checksum(path: &Path) -> Result<u64> {
    let is_file = match fs::metadata(path) {
        Ok(meta) => meta.is_file(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => false,
        Err(err) => {
            return Err(err.with_context(|| format!("failed to stat `{}`", path.display())))
        }
    };

    if !is_file {
        return Ok(0)
    }

    let mmap = Mmap::open(path)?;
    Ok(crc64(0, &mmap))
}


#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write as _;

    use tempfile::tempdir;
    use tempfile::NamedTempFile;
    use test_log::test;
    use test_tag::tag;


    /// Exercise the `Display` representation.
    #[tag(miri)]
    #[test]
    fn display() {
        let name = FileName::with_checksum("/lib/libfoo.so", 0x6c40df5f0b497347);
        assert_eq!(name.to_string(), r#"0x6C40DF5F0B497347: "/lib/libfoo.so""#);
        assert_ne!(format!("{name:?}"), "");
    }

    /// Check that we checksum the contents of regular files.
    #[test]
    fn checksum_regular_file() {
        let mut file = NamedTempFile::new().unwrap();
        let () = file.write_all(b"123456789").unwrap();
        let () = file.as_file().sync_all().unwrap();

        let name = FileName::from_path(file.path()).unwrap();
        assert_eq!(name.path(), file.path());
        assert_eq!(name.checksum(), 0x6c40df5f0b497347);
        assert!(name.is_current().unwrap());

        let () = file.write_all(b"0").unwrap();
        let () = file.as_file().sync_all().unwrap();
        assert!(!name.is_current().unwrap());
    }

    /// Check that an empty file has a zero checksum.
    #[test]
    fn checksum_empty_file() {
        let file = NamedTempFile::new().unwrap();
        let name = FileName::from_path(file.path()).unwrap();
        assert_eq!(name.checksum(), 0);
    }

    /// Check that paths not referring to regular files are not an
    /// error.
    #[test]
    fn checksum_non_file() {
        let dir = tempdir().unwrap();
        let name = FileName::from_path(dir.path()).unwrap();
        assert_eq!(name.checksum(), 0);

        let name = FileName::from_path(dir.path().join("does-not-exist")).unwrap();
        assert_eq!(name.checksum(), 0);
    }

    /// Check the matching semantics in the presence of unknown
    /// checksums.
    #[tag(miri)]
    #[test]
    fn matching() {
        let a = FileName::with_checksum("/bin/ls", 1);
        let b = FileName::with_checksum("/bin/ls", 2);
        let unknown = FileName::with_checksum("/bin/ls", 0);
        let other = FileName::with_checksum("/bin/cat", 1);

        assert!(a.matches(&a));
        assert!(!a.matches(&b));
        assert!(a.matches(&unknown));
        assert!(unknown.matches(&b));
        assert!(!a.matches(&other));
        assert_ne!(a, unknown);
    }

    /// Check conversion from and to messages.
    #[tag(miri)]
    #[test]
    fn message_conversion() {
        let name = FileName::with_checksum("/bin/ls", 42);
        let msg = FileNameMsg::from(&name);
        assert_eq!(msg.path, Path::new("/bin/ls"));
        assert_eq!(msg.checksum, 42);
        assert_eq!(FileName::from(&msg), name);
    }
}
