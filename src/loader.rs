use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::debug;
use memmap2::Mmap;

use crate::error::LoadError;

pub const WORD_BYTES: usize = 4;

/// Reads a program image: consecutive little-endian 32-bit words, in file order.
pub fn load_image(path: &Path) -> Result<Vec<u32>, LoadError> {
    let io_err = |source| LoadError::Io { path: path.to_path_buf(), source };

    let mut file = File::open(path).map_err(io_err)?;
    let metadata = file.metadata().map_err(io_err)?;

    // pipes and character devices report a length of 0 and cannot be mapped
    if !metadata.is_file() {
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes).map_err(io_err)?;
        let words = parse_image(&bytes)?;
        debug!("Read {} words from stream {}", words.len(), path.display());
        return Ok(words);
    }
    // zero-length files cannot be mapped on every platform
    if metadata.len() == 0 {
        debug!("Program image {} is empty", path.display());
        return Ok(Vec::new());
    }

    // SAFETY: the map is read-only and dropped before this function returns; the image
    // is not expected to change while it is being read.
    let map = unsafe { Mmap::map(&file) }.map_err(io_err)?;
    let words = parse_image(&map)?;
    debug!("Read {} words from {}", words.len(), path.display());
    Ok(words)
}

pub fn parse_image(bytes: &[u8]) -> Result<Vec<u32>, LoadError> {
    if bytes.len() % WORD_BYTES != 0 {
        return Err(LoadError::Truncated { bytes: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(WORD_BYTES)
        .map(|chunk| u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}
