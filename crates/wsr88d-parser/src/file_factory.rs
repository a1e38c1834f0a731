//! Detect and decode a NEXRAD file from its bytes.

use std::borrow::Cow;
use std::io::Read;

use flate2::read::MultiGzDecoder;
use tracing::{debug, trace, warn};

use crate::ar2v::Ar2vFile;
use crate::error::{DecodeError, DecodeResult};
use crate::level3::Level3File;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const AR2V_MAGIC: &[u8] = b"AR2V";

/// A decoded Level II volume or Level III product.
#[derive(Debug, Clone)]
pub enum NexradFile {
    Level2(Ar2vFile),
    Level3(Box<Level3File>),
}

impl NexradFile {
    pub fn as_level2(&self) -> Option<&Ar2vFile> {
        match self {
            NexradFile::Level2(file) => Some(file),
            NexradFile::Level3(_) => None,
        }
    }

    pub fn as_level3(&self) -> Option<&Level3File> {
        match self {
            NexradFile::Level3(file) => Some(file),
            NexradFile::Level2(_) => None,
        }
    }
}

/// Decode `data`, gunzipping it first if needed.
///
/// Data starting with `AR2V` is an Archive II volume; anything else is
/// treated as a Level III product.
pub fn load_file(data: &[u8]) -> DecodeResult<NexradFile> {
    if data.len() < 4 {
        warn!(size = data.len(), "Error reading file");
        return Err(DecodeError::UnexpectedEof {
            offset: 0,
            needed: 4,
            available: data.len(),
        });
    }

    let data = if data.starts_with(GZIP_MAGIC) {
        let mut out = Vec::new();
        MultiGzDecoder::new(data).read_to_end(&mut out).map_err(|e| {
            warn!(error = %e, "Error decompressing file");
            DecodeError::Decompression(e.to_string())
        })?;
        trace!(size = out.len(), "Decompressed file");
        Cow::Owned(out)
    } else {
        Cow::Borrowed(data)
    };

    if data.starts_with(AR2V_MAGIC) {
        debug!("Loading Archive II volume");
        Ar2vFile::load(&data).map(NexradFile::Level2)
    } else {
        debug!("Loading Level III product");
        Level3File::load(&data).map(|file| NexradFile::Level3(Box::new(file)))
    }
}
