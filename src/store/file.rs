//! Data file handles
//!
//! One handle for positional reads, one append-only handle for writes.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

/// Open (creating if absent) the read and append handles of a data file
pub(crate) fn open_handles(path: &Path) -> io::Result<(File, File)> {
    // The append handle goes first: a read-only open cannot create the file.
    let writer = private_options().append(true).open(path)?;
    let reader = OpenOptions::new().read(true).open(path)?;
    Ok((reader, writer))
}

/// Create (or empty) a file readable and writable by the owner only
pub(crate) fn create_private(path: &Path) -> io::Result<File> {
    private_options().write(true).truncate(true).open(path)
}

fn private_options() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options
}

/// Read exactly `buf.len()` bytes at `offset` without moving a shared cursor
#[cfg(unix)]
pub(crate) fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
pub(crate) fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;
    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "failed to fill whole buffer",
                ))
            }
            Ok(n) => {
                buf = &mut buf[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Sibling path a compaction is written to before it replaces the data file
pub(crate) fn compaction_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".compact");
    PathBuf::from(name)
}
