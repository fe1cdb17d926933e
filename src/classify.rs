use crate::config::SearchConfig;
use crate::encoding::{self, Encoding};
use flate2::read::GzDecoder;
use std::borrow::Cow;
use std::fs;
use std::io::{self, Read};
use std::path::Path;

/// Leading bytes of every gzip stream. Content without this marker is never
/// run through the decompressor.
pub const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Per-file classification outcome. `Binary`, `GzipCorrupt` and `Unreadable`
/// are ordinary values, not errors; only the open/read failure in
/// [`classify`] propagates as `io::Error`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedContent {
    Text {
        encoding: Encoding,
        lines: Vec<String>,
    },
    Binary,
    GzipCorrupt,
    Unreadable {
        cause: String,
    },
}

pub fn classify(path: &Path, config: &SearchConfig) -> io::Result<ClassifiedContent> {
    let raw = fs::read(path)?;
    Ok(classify_bytes(&raw, config))
}

pub fn classify_bytes(raw: &[u8], config: &SearchConfig) -> ClassifiedContent {
    let data: Cow<[u8]> = if raw.starts_with(&GZIP_MAGIC) {
        match gunzip(raw) {
            Ok(inflated) => Cow::Owned(inflated),
            Err(e) => {
                log::debug!("gzip decompression failed: {e}");
                return ClassifiedContent::GzipCorrupt;
            }
        }
    } else {
        Cow::Borrowed(raw)
    };

    // Resolution order: forced encoding, then BOM, then locale. Only the
    // locale guess may fall back to latin-1 on a decode failure.
    let (candidate, from_locale) = match config.encoding {
        Some(forced) => (forced, false),
        None => match encoding::sniff_bom(&data) {
            Some((sniffed, _)) => (sniffed, false),
            None => (encoding::locale_default(), true),
        },
    };

    if is_binary(&data, candidate, config.binary_sample) {
        return ClassifiedContent::Binary;
    }

    match encoding::decode(&data, candidate) {
        Ok(text) => ClassifiedContent::Text {
            encoding: candidate,
            lines: split_lines(&text),
        },
        Err(_) if from_locale => {
            let text = encoding::decode_latin1(&data);
            ClassifiedContent::Text {
                encoding: Encoding::Latin1,
                lines: split_lines(&text),
            }
        }
        Err(e) => ClassifiedContent::Unreadable {
            cause: e.to_string(),
        },
    }
}

/// Bounded-prefix heuristic. For 8-bit candidates any byte outside the
/// file(1) text set is evidence of binary content; a UTF-16 candidate is
/// judged on its decoded scalars, since NUL code-unit halves are normal
/// there.
fn is_binary(data: &[u8], candidate: Encoding, sample_bytes: usize) -> bool {
    let sample = &data[..data.len().min(sample_bytes)];
    match candidate {
        Encoding::Utf16Le | Encoding::Utf16Be => {
            encoding::decode_utf16_lossy(sample, candidate).contains('\u{0}')
        }
        _ => sample.iter().any(|&b| !is_text_byte(b)),
    }
}

// file(1)'s text bytes: BEL BS TAB LF FF CR ESC plus everything from SPACE up.
fn is_text_byte(b: u8) -> bool {
    b >= 0x20 || matches!(b, 7 | 8 | 9 | 10 | 12 | 13 | 27)
}

fn gunzip(raw: &[u8]) -> io::Result<Vec<u8>> {
    let mut inflated = Vec::new();
    GzDecoder::new(raw).read_to_end(&mut inflated)?;
    Ok(inflated)
}

fn split_lines(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn config() -> SearchConfig {
        SearchConfig::default()
    }

    fn forced(encoding: Encoding) -> SearchConfig {
        SearchConfig {
            encoding: Some(encoding),
            ..SearchConfig::default()
        }
    }

    fn gzip(content: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap()
    }

    fn expect_lines(result: ClassifiedContent) -> Vec<String> {
        match result {
            ClassifiedContent::Text { lines, .. } => lines,
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn plain_text_splits_into_lines() {
        let lines = expect_lines(classify_bytes(b"alpha\nbeta\r\ngamma", &config()));
        assert_eq!(lines, ["alpha", "beta", "gamma"]);
    }

    #[test]
    fn empty_content_is_text_with_no_lines() {
        assert!(expect_lines(classify_bytes(b"", &config())).is_empty());
    }

    #[test]
    fn nul_byte_is_binary() {
        let result = classify_bytes(b"before\x00after", &config());
        assert_eq!(result, ClassifiedContent::Binary);
    }

    #[test]
    fn low_control_bytes_are_binary() {
        let result = classify_bytes(b"lead\x01trail", &config());
        assert_eq!(result, ClassifiedContent::Binary);
    }

    #[test]
    fn tabs_escapes_and_high_bytes_are_text() {
        let result = classify_bytes(b"a\tb\x1b[0m\xe9\n", &config());
        assert!(matches!(result, ClassifiedContent::Text { .. }));
    }

    #[test]
    fn nul_outside_sample_is_not_binary() {
        let sample = config().binary_sample;
        let mut content = vec![b'x'; sample];
        content.push(0);
        // Inside the sample window the same byte flips the verdict.
        let mut inside = content.clone();
        inside[sample - 1] = 0;
        assert!(matches!(
            classify_bytes(&content, &forced(Encoding::Latin1)),
            ClassifiedContent::Text { .. }
        ));
        assert_eq!(
            classify_bytes(&inside, &forced(Encoding::Latin1)),
            ClassifiedContent::Binary
        );
    }

    #[test]
    fn utf16le_bom_text_is_not_binary() {
        let mut bytes = vec![0xff, 0xfe];
        for unit in "hello utf16\nsecond line".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let result = classify_bytes(&bytes, &config());
        match result {
            ClassifiedContent::Text { encoding, lines } => {
                assert_eq!(encoding, Encoding::Utf16Le);
                assert_eq!(lines, ["hello utf16", "second line"]);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn utf16_with_decoded_nul_is_binary() {
        let mut bytes = vec![0xfe, 0xff];
        for unit in "a\u{0}b".encode_utf16() {
            bytes.extend_from_slice(&unit.to_be_bytes());
        }
        assert_eq!(classify_bytes(&bytes, &config()), ClassifiedContent::Binary);
    }

    #[test]
    fn gzip_content_is_transparently_decompressed() {
        let lines = expect_lines(classify_bytes(&gzip(b"packed\ntext\n"), &config()));
        assert_eq!(lines, ["packed", "text"]);
    }

    #[test]
    fn gzip_of_binary_payload_is_binary() {
        let result = classify_bytes(&gzip(b"\x00\x01\x02"), &config());
        assert_eq!(result, ClassifiedContent::Binary);
    }

    #[test]
    fn gzip_magic_with_garbage_is_corrupt() {
        let mut bytes = GZIP_MAGIC.to_vec();
        bytes.extend_from_slice(b"not a deflate stream at all");
        assert_eq!(classify_bytes(&bytes, &config()), ClassifiedContent::GzipCorrupt);
    }

    #[test]
    fn truncated_gzip_is_corrupt() {
        let full = gzip(b"some reasonably long content to compress\n");
        let truncated = &full[..full.len() / 2];
        assert_eq!(classify_bytes(truncated, &config()), ClassifiedContent::GzipCorrupt);
    }

    #[test]
    fn non_gzip_content_is_never_decompressed() {
        // 0x1f alone is not the magic.
        let result = classify_bytes(b"\x1fplain", &forced(Encoding::Latin1));
        assert!(matches!(result, ClassifiedContent::Text { .. }));
    }

    #[test]
    fn forced_utf8_failure_is_unreadable() {
        let result = classify_bytes(b"caf\xe9", &forced(Encoding::Utf8));
        assert!(matches!(result, ClassifiedContent::Unreadable { .. }));
    }

    #[test]
    fn auto_detection_falls_back_to_latin1() {
        let result = classify_bytes(b"caf\xe9 au lait", &config());
        match result {
            ClassifiedContent::Text { encoding, lines } => {
                assert_eq!(encoding, Encoding::Latin1);
                assert_eq!(lines, ["caf\u{e9} au lait"]);
            }
            other => panic!("expected text, got {other:?}"),
        }
    }

    #[test]
    fn bom_derived_failure_is_unreadable_not_fallback() {
        // A UTF-16LE BOM followed by an odd byte count cannot decode.
        let bytes = [0xff, 0xfe, b'x'];
        assert!(matches!(
            classify_bytes(&bytes, &config()),
            ClassifiedContent::Unreadable { .. }
        ));
    }
}
