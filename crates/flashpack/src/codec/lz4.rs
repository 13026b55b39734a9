//! LZ4 frame backend

use super::stream::StreamCodec;
use lz4_flex::frame::FrameDecoder;

const FRAME_MAGIC: u32 = 0x184D_2204;

/// LZ4 frame format streams
pub(crate) struct Lz4;

impl StreamCodec for Lz4 {
    const NAME: &'static str = "lz4";

    type Reader<'a> = FrameDecoder<&'a [u8]>;

    fn check_header(stored: &[u8]) -> Result<(), String> {
        match flashpack_format::read_u32_le(stored, 0) {
            Some(FRAME_MAGIC) => Ok(()),
            Some(magic) => Err(format!("bad frame magic {magic:08x}")),
            None => Err(format!("{} byte stream has no frame header", stored.len())),
        }
    }

    fn reader(stored: &[u8]) -> Self::Reader<'_> {
        FrameDecoder::new(stored)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::codec::Decoder;
    use crate::codec::stream::StreamDecoder;
    use crate::error::FsError;
    use flashpack_format::{Compression, compress};
    use std::io::SeekFrom;

    fn payload() -> Vec<u8> {
        (0..40_000u32).map(|i| (i % 251) as u8).collect()
    }

    #[test]
    fn test_decodes_and_seeks() {
        let plain = payload();
        let stored = compress(&plain, Compression::Lz4).expect("Operation should succeed");
        let mut decoder = StreamDecoder::<Lz4>::open(&stored, plain.len() as u64)
            .expect("Operation should succeed");
        assert_eq!(decoder.name(), "lz4");

        let mut buf = [0u8; 100];
        decoder.seek(SeekFrom::Start(30_000)).expect("Operation should succeed");
        let n = decoder.read(&mut buf).expect("Operation should succeed");
        assert_eq!(&buf[..n], &plain[30_000..30_000 + n]);

        decoder.seek(SeekFrom::Current(-1000)).expect("Operation should succeed");
        assert_eq!(
            decoder.tell().expect("Operation should succeed"),
            (30_000 + n - 1000) as u64
        );
        let n2 = decoder.read(&mut buf).expect("Operation should succeed");
        assert_eq!(&buf[..n2], &plain[30_000 + n - 1000..30_000 + n - 1000 + n2]);
    }

    #[test]
    fn test_read_stops_at_declared_size() {
        let plain = payload();
        let stored = compress(&plain, Compression::Lz4).expect("Operation should succeed");
        let mut decoder = StreamDecoder::<Lz4>::open(&stored, 10).expect("Operation should succeed");

        let mut buf = [0u8; 64];
        let mut out = Vec::new();
        loop {
            let n = decoder.read(&mut buf).expect("Operation should succeed");
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, &plain[..10]);
    }

    #[test]
    fn test_rejects_bad_magic() {
        let deflated = compress(b"abc", Compression::Deflate).expect("Operation should succeed");
        for stored in [&b"\x04\x22"[..], deflated.as_slice()] {
            assert!(matches!(
                StreamDecoder::<Lz4>::open(stored, 3),
                Err(FsError::BackendOpen { codec: "lz4", .. })
            ));
        }
    }
}
