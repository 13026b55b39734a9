//! zlib/deflate backend

use super::stream::StreamCodec;
use flate2::read::ZlibDecoder;

/// zlib-wrapped deflate streams
pub(crate) struct Deflate;

impl StreamCodec for Deflate {
    const NAME: &'static str = "deflate";

    type Reader<'a> = ZlibDecoder<&'a [u8]>;

    fn check_header(stored: &[u8]) -> Result<(), String> {
        let [cmf, flg, ..] = *stored else {
            return Err(format!("{} byte stream has no zlib header", stored.len()));
        };
        if cmf & 0x0F != 8 {
            return Err(format!("compression method {} is not deflate", cmf & 0x0F));
        }
        if (u16::from(cmf) << 8 | u16::from(flg)) % 31 != 0 {
            return Err("zlib header check bits do not match".to_string());
        }
        if flg & 0x20 != 0 {
            return Err("preset dictionaries are not supported".to_string());
        }
        Ok(())
    }

    fn reader(stored: &[u8]) -> Self::Reader<'_> {
        ZlibDecoder::new(stored)
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

    fn text() -> Vec<u8> {
        (0..2000u32).flat_map(|i| format!("line {i}\n").into_bytes()).collect()
    }

    fn read_all(decoder: &mut dyn Decoder) -> Vec<u8> {
        let mut out = Vec::new();
        let mut buf = [0u8; 333];
        loop {
            let n = decoder.read(&mut buf).expect("Operation should succeed");
            if n == 0 {
                return out;
            }
            out.extend_from_slice(&buf[..n]);
        }
    }

    #[test]
    fn test_decodes_whole_stream() {
        let plain = text();
        let stored = compress(&plain, Compression::Deflate).expect("Operation should succeed");
        let mut decoder = StreamDecoder::<Deflate>::open(&stored, plain.len() as u64)
            .expect("Operation should succeed");

        assert_eq!(decoder.name(), "deflate");
        assert_eq!(read_all(&mut decoder), plain);
        assert_eq!(decoder.tell().expect("Operation should succeed"), plain.len() as u64);
    }

    #[test]
    fn test_seek_forward_and_back() {
        let plain = text();
        let stored = compress(&plain, Compression::Deflate).expect("Operation should succeed");
        let mut decoder = StreamDecoder::<Deflate>::open(&stored, plain.len() as u64)
            .expect("Operation should succeed");
        let mut buf = [0u8; 16];

        decoder.seek(SeekFrom::Start(5000)).expect("Operation should succeed");
        decoder.read(&mut buf).expect("Operation should succeed");
        assert_eq!(&buf[..], &plain[5000..5016]);

        decoder.seek(SeekFrom::Start(10)).expect("Operation should succeed");
        decoder.read(&mut buf).expect("Operation should succeed");
        assert_eq!(&buf[..], &plain[10..26]);

        assert_eq!(
            decoder.seek(SeekFrom::End(-4)).expect("Operation should succeed"),
            plain.len() as u64 - 4
        );
        assert_eq!(read_all(&mut decoder), &plain[plain.len() - 4..]);
    }

    #[test]
    fn test_rejects_bad_header() {
        for stored in [&b""[..], b"\x78", b"\x00\x00", b"\x78\x00", b"\x78\xBB"] {
            assert!(matches!(
                StreamDecoder::<Deflate>::open(stored, 10),
                Err(FsError::BackendOpen {
                    codec: "deflate",
                    ..
                })
            ));
        }
    }

    #[test]
    fn test_short_stream_is_an_error() {
        let plain = b"only a few bytes".to_vec();
        let stored = compress(&plain, Compression::Deflate).expect("Operation should succeed");
        let mut decoder =
            StreamDecoder::<Deflate>::open(&stored, 1000).expect("Operation should succeed");
        let mut buf = [0u8; 64];
        let mut out = Vec::new();

        let err = loop {
            match decoder.read(&mut buf) {
                Ok(n) => out.extend_from_slice(&buf[..n]),
                Err(e) => break e,
            }
        };
        assert_eq!(out, plain);
        assert!(matches!(err, FsError::Decompression(_)));
    }
}
