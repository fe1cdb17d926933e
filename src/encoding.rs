use clap::ValueEnum;
use std::env;
use std::fmt;

const BOM_UTF8: [u8; 3] = [0xef, 0xbb, 0xbf];
const BOM_UTF16_LE: [u8; 2] = [0xff, 0xfe];
const BOM_UTF16_BE: [u8; 2] = [0xfe, 0xff];

/// Character encodings the classifier can resolve. Latin-1 is the permissive
/// fallback: every byte sequence decodes under it.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    #[value(name = "utf-8", alias = "utf8")]
    Utf8,
    #[value(name = "utf-16le", alias = "utf-16", alias = "utf16")]
    Utf16Le,
    #[value(name = "utf-16be")]
    Utf16Be,
    #[value(name = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Utf8 => write!(f, "utf-8"),
            Encoding::Utf16Le => write!(f, "utf-16le"),
            Encoding::Utf16Be => write!(f, "utf-16be"),
            Encoding::Latin1 => write!(f, "latin-1"),
        }
    }
}

#[derive(Debug)]
pub struct DecodeError {
    pub encoding: Encoding,
    pub detail: String,
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot decode as {}: {}", self.encoding, self.detail)
    }
}

impl std::error::Error for DecodeError {}

/// Sniff a byte-order mark. Returns the indicated encoding and the BOM length.
pub fn sniff_bom(bytes: &[u8]) -> Option<(Encoding, usize)> {
    if bytes.starts_with(&BOM_UTF8) {
        Some((Encoding::Utf8, BOM_UTF8.len()))
    } else if bytes.starts_with(&BOM_UTF16_LE) {
        Some((Encoding::Utf16Le, BOM_UTF16_LE.len()))
    } else if bytes.starts_with(&BOM_UTF16_BE) {
        Some((Encoding::Utf16Be, BOM_UTF16_BE.len()))
    } else {
        None
    }
}

/// The encoding implied by the process locale: first of LC_ALL, LC_CTYPE,
/// LANG that is set and non-empty decides; unset means UTF-8.
pub fn locale_default() -> Encoding {
    for key in ["LC_ALL", "LC_CTYPE", "LANG"] {
        if let Ok(value) = env::var(key) {
            if !value.is_empty() {
                return from_locale_value(&value);
            }
        }
    }
    Encoding::Utf8
}

fn from_locale_value(value: &str) -> Encoding {
    if value.to_ascii_lowercase().replace('-', "").contains("utf8") {
        Encoding::Utf8
    } else {
        Encoding::Latin1
    }
}

/// Decode `bytes` under `encoding`. Latin-1 is total; the others report the
/// first offending position. A leading BOM matching `encoding` is stripped.
pub fn decode(bytes: &[u8], encoding: Encoding) -> Result<String, DecodeError> {
    let bytes = match sniff_bom(bytes) {
        Some((sniffed, len)) if sniffed == encoding => &bytes[len..],
        _ => bytes,
    };
    match encoding {
        Encoding::Utf8 => match std::str::from_utf8(bytes) {
            Ok(text) => Ok(text.to_owned()),
            Err(e) => Err(DecodeError {
                encoding,
                detail: format!("invalid byte sequence at offset {}", e.valid_up_to()),
            }),
        },
        Encoding::Utf16Le | Encoding::Utf16Be => decode_utf16(bytes, encoding),
        Encoding::Latin1 => Ok(decode_latin1(bytes)),
    }
}

/// Total: every byte maps to the scalar with the same value.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}

fn decode_utf16(bytes: &[u8], encoding: Encoding) -> Result<String, DecodeError> {
    let mut chunks = bytes.chunks_exact(2);
    let units: Vec<u16> = (&mut chunks)
        .map(|pair| {
            let pair = [pair[0], pair[1]];
            if encoding == Encoding::Utf16Le {
                u16::from_le_bytes(pair)
            } else {
                u16::from_be_bytes(pair)
            }
        })
        .collect();
    if !chunks.remainder().is_empty() {
        return Err(DecodeError {
            encoding,
            detail: "odd number of bytes".to_string(),
        });
    }
    char::decode_utf16(units).collect::<Result<String, _>>().map_err(|e| DecodeError {
        encoding,
        detail: format!("unpaired surrogate {:#06x}", e.unpaired_surrogate()),
    })
}

/// Decode the UTF-16 code units of `bytes`, replacing errors, for heuristics
/// that inspect decoded scalars without caring about strict validity.
pub fn decode_utf16_lossy(bytes: &[u8], encoding: Encoding) -> String {
    let units = bytes.chunks_exact(2).map(|pair| {
        let pair = [pair[0], pair[1]];
        if encoding == Encoding::Utf16Le {
            u16::from_le_bytes(pair)
        } else {
            u16::from_be_bytes(pair)
        }
    });
    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
