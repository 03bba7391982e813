use std::io::SeekFrom;
use std::path::Path;

use crate::decode::reader::ByteSource;
use crate::foundation::error::{SpriteError, SpriteResult};

/// Leading bytes of a chunked (MNG-family) animation.
pub const MNG_SIGNATURE: [u8; 8] = [0x8A, 0x4D, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
/// Leading bytes of a run-length animation.
pub const RLE_SIGNATURE: [u8; 8] = [0xF2, 0x65, 0x6C, 0x72, 0x00, 0x00, 0x20, 0x4D];

/// Container formats the runtime can decode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Chunked, zlib-compressed container (`.mng`).
    Mng,
    /// Run-length encoded container (`.rle`).
    Rle,
}

impl Format {
    /// Map a filename extension (with or without leading dot, any case) to a format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        if ext.eq_ignore_ascii_case("mng") {
            Some(Self::Mng)
        } else if ext.eq_ignore_ascii_case("rle") {
            Some(Self::Rle)
        } else {
            None
        }
    }

    /// Format selected by the extension of `path`.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    /// Recognize a format by its 8-byte signature.
    pub fn sniff(magic: &[u8]) -> Option<Self> {
        if magic.starts_with(&MNG_SIGNATURE) {
            Some(Self::Mng)
        } else if magic.starts_with(&RLE_SIGNATURE) {
            Some(Self::Rle)
        } else {
            None
        }
    }

    /// Signature the decoder expects at the start of the stream.
    pub fn signature(self) -> &'static [u8; 8] {
        match self {
            Self::Mng => &MNG_SIGNATURE,
            Self::Rle => &RLE_SIGNATURE,
        }
    }

    /// Canonical lowercase extension.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Mng => "mng",
            Self::Rle => "rle",
        }
    }
}

/// How [`AnimationRuntime::load`](crate::AnimationRuntime::load) picks a decoder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormatHint<'a> {
    /// Filename extension; unknown extensions fail the load.
    Extension(&'a str),
    /// Explicit format.
    Format(Format),
    /// Peek at the signature, then rewind.
    Sniff,
}

impl FormatHint<'_> {
    /// Resolve the hint, peeking at `src` for [`FormatHint::Sniff`].
    ///
    /// The stream position is restored after sniffing.
    pub(crate) fn resolve<R: ByteSource + ?Sized>(self, src: &mut R) -> SpriteResult<Format> {
        match self {
            Self::Format(f) => Ok(f),
            Self::Extension(ext) => Format::from_extension(ext).ok_or_else(|| {
                SpriteError::unknown_format(format!("no decoder for extension '{ext}'"))
            }),
            Self::Sniff => {
                let start = src.stream_position()?;
                let mut magic = [0u8; 8];
                let read = read_up_to(src, &mut magic)?;
                src.seek(SeekFrom::Start(start))?;
                Format::sniff(&magic[..read]).ok_or_else(|| {
                    SpriteError::unknown_format(format!(
                        "unrecognized signature {:02x?}",
                        &magic[..read]
                    ))
                })
            }
        }
    }
}

fn read_up_to<R: ByteSource + ?Sized>(src: &mut R, buf: &mut [u8]) -> SpriteResult<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
#[path = "../../tests/unit/decode/format.rs"]
mod tests;
