use crate::error::Result;
use memmap2::Mmap;
use std::fs::File;
use std::path::Path;

/// Open a file and map it into memory (read-only)
pub fn mmap_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and dropped before the caller returns
    let mmap = unsafe { Mmap::map(&file)? };
    Ok(mmap)
}
