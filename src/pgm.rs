//! Netpbm PGM (portable graymap) reading and writing.
//!
//! - `read_pgm` / `load_pgm`: parse `P2` (ASCII) or `P5` (binary) into a `PgmImage`.
//! - `write_pgm` / `save_pgm`: serialize a `PgmImage` in its declared encoding.
//!
//! Binary samples are one byte when the max value is below 256, otherwise
//! two bytes, most significant first. The declared max value is preserved,
//! since it defines the histogram domain.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use imgref::ImgVec;
use log::debug;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PgmError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not a PGM file (magic number {0:?})")]
    BadMagic(String),

    #[error("malformed header: {0}")]
    Header(&'static str),

    #[error("image dimensions cannot be zero")]
    ZeroDimension,

    #[error("max value must be between 1 and 65535, got {0}")]
    InvalidMaxValue(u64),

    #[error("sample {value} exceeds max value {max_value}")]
    SampleOutOfRange { value: u64, max_value: u16 },

    #[error("pixel data ends after {read} of {expected} samples")]
    Truncated { read: usize, expected: usize },

    #[error("unexpected byte {byte:#04x} at offset {offset}")]
    UnexpectedByte { byte: u8, offset: usize },
}

/// Sample encoding of a PGM file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgmEncoding {
    /// `P2`: decimal samples separated by whitespace.
    Ascii,
    /// `P5`: raw big-endian samples.
    Binary,
}

impl PgmEncoding {
    fn magic(self) -> &'static str {
        match self {
            Self::Ascii => "P2",
            Self::Binary => "P5",
        }
    }
}

/// A decoded grayscale image with its declared max value.
#[derive(Debug, Clone, PartialEq)]
pub struct PgmImage {
    pub encoding: PgmEncoding,
    pub max_value: u16,
    pub pixels: ImgVec<u16>,
}

impl PgmImage {
    pub fn width(&self) -> usize {
        self.pixels.width()
    }

    pub fn height(&self) -> usize {
        self.pixels.height()
    }
}

/// Byte cursor over the whole file.
struct Scanner<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Skip whitespace and `#` comments (which run to end of line).
    fn skip_blank(&mut self) {
        while let Some(&b) = self.data.get(self.pos) {
            if b == b'#' {
                while let Some(&c) = self.data.get(self.pos) {
                    self.pos += 1;
                    if c == b'\n' || c == b'\r' {
                        break;
                    }
                }
            } else if b.is_ascii_whitespace() {
                self.pos += 1;
            } else {
                break;
            }
        }
    }

    /// Next unsigned decimal token, or `None` at end of input or on a non-digit.
    fn number(&mut self) -> Option<u64> {
        self.skip_blank();
        let start = self.pos;
        let mut value: u64 = 0;
        while let Some(&b) = self.data.get(self.pos) {
            if !b.is_ascii_digit() {
                break;
            }
            value = value.checked_mul(10)?.checked_add((b - b'0') as u64)?;
            self.pos += 1;
        }
        (self.pos > start).then_some(value)
    }

    fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    fn header_field(&mut self, what: &'static str) -> Result<u64, PgmError> {
        self.number().ok_or(PgmError::Header(what))
    }
}

/// Parse a PGM image from `reader`.
pub fn read_pgm(mut reader: impl Read) -> Result<PgmImage, PgmError> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;

    let magic = data.get(..2).unwrap_or(&data[..]);
    let encoding = match magic {
        b"P2" => PgmEncoding::Ascii,
        b"P5" => PgmEncoding::Binary,
        other => return Err(PgmError::BadMagic(String::from_utf8_lossy(other).into_owned())),
    };

    let mut scan = Scanner::new(&data[2..]);
    let width = dimension(scan.header_field("missing width")?)?;
    let height = dimension(scan.header_field("missing height")?)?;
    let max_value = scan.header_field("missing max value")?;
    if width == 0 || height == 0 {
        return Err(PgmError::ZeroDimension);
    }
    if max_value == 0 || max_value > u16::MAX as u64 {
        return Err(PgmError::InvalidMaxValue(max_value));
    }
    let max_value = max_value as u16;
    let expected = width
        .checked_mul(height)
        .ok_or(PgmError::Header("dimensions overflow"))?;

    let pixels = match encoding {
        PgmEncoding::Ascii => read_ascii_samples(&mut scan, expected, max_value)?,
        PgmEncoding::Binary => {
            // exactly one whitespace byte separates the header from the raster
            let raster: &[u8] = match scan.data.get(scan.pos) {
                Some(b) if b.is_ascii_whitespace() => &scan.data[scan.pos + 1..],
                Some(&byte) => {
                    return Err(PgmError::UnexpectedByte {
                        byte,
                        offset: scan.pos + 2,
                    });
                }
                None => &[],
            };
            read_binary_samples(raster, expected, max_value)?
        }
    };

    debug!("read {} {width}x{height} PGM, max value {max_value}", encoding.magic());
    Ok(PgmImage {
        encoding,
        max_value,
        pixels: ImgVec::new(pixels, width, height),
    })
}

/// Every sample takes at least one byte, so the input bounds the allocation.
fn read_ascii_samples(
    scan: &mut Scanner<'_>,
    expected: usize,
    max_value: u16,
) -> Result<Vec<u16>, PgmError> {
    let mut pixels = Vec::with_capacity(expected.min(scan.remaining()));
    while pixels.len() < expected {
        match scan.number() {
            Some(value) => pixels.push(check_sample(value, max_value)?),
            None => {
                return Err(match scan.data.get(scan.pos) {
                    Some(&byte) => PgmError::UnexpectedByte {
                        byte,
                        offset: scan.pos + 2,
                    },
                    None => PgmError::Truncated {
                        read: pixels.len(),
                        expected,
                    },
                });
            }
        }
    }
    Ok(pixels)
}

fn read_binary_samples(
    raster: &[u8],
    expected: usize,
    max_value: u16,
) -> Result<Vec<u16>, PgmError> {
    let wide = max_value > 255;
    let step = if wide { 2 } else { 1 };
    let available = raster.len() / step;
    if available < expected {
        return Err(PgmError::Truncated {
            read: available,
            expected,
        });
    }

    let mut pixels = Vec::with_capacity(expected);
    for chunk in raster.chunks_exact(step).take(expected) {
        let value = if wide {
            u16::from_be_bytes([chunk[0], chunk[1]])
        } else {
            chunk[0] as u16
        };
        pixels.push(check_sample(value as u64, max_value)?);
    }
    Ok(pixels)
}

fn dimension(value: u64) -> Result<usize, PgmError> {
    usize::try_from(value).map_err(|_| PgmError::Header("dimensions overflow"))
}

fn check_sample(value: u64, max_value: u16) -> Result<u16, PgmError> {
    if value > max_value as u64 {
        return Err(PgmError::SampleOutOfRange { value, max_value });
    }
    Ok(value as u16)
}

/// Serialize `image` to `writer` in its declared encoding.
pub fn write_pgm(mut writer: impl Write, image: &PgmImage) -> Result<(), PgmError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(PgmError::ZeroDimension);
    }
    if image.max_value == 0 {
        return Err(PgmError::InvalidMaxValue(0));
    }

    write!(
        writer,
        "{}\n{} {}\n{}\n",
        image.encoding.magic(),
        image.width(),
        image.height(),
        image.max_value
    )?;

    let wide = image.max_value > 255;
    let mut line = String::new();
    let mut raw = Vec::with_capacity(image.width() * if wide { 2 } else { 1 });
    for row in image.pixels.as_ref().rows() {
        for &p in row {
            check_sample(p as u64, image.max_value)?;
        }
        match image.encoding {
            PgmEncoding::Ascii => {
                line.clear();
                for (i, p) in row.iter().enumerate() {
                    if i > 0 {
                        line.push(' ');
                    }
                    line.push_str(&p.to_string());
                }
                line.push('\n');
                writer.write_all(line.as_bytes())?;
            }
            PgmEncoding::Binary => {
                raw.clear();
                for &p in row {
                    if wide {
                        raw.extend_from_slice(&p.to_be_bytes());
                    } else {
                        raw.push(p as u8);
                    }
                }
                writer.write_all(&raw)?;
            }
        }
    }
    writer.flush()?;
    Ok(())
}

/// Read a PGM file from disk.
pub fn load_pgm(path: impl AsRef<Path>) -> Result<PgmImage, PgmError> {
    let file = File::open(path.as_ref())?;
    read_pgm(BufReader::new(file))
}

/// Write a PGM file to disk, replacing any existing file.
pub fn save_pgm(path: impl AsRef<Path>, image: &PgmImage) -> Result<(), PgmError> {
    let file = File::create(path.as_ref())?;
    write_pgm(BufWriter::new(file), image)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(encoding: PgmEncoding, max_value: u16) -> PgmImage {
        let buf = (0..12u32)
            .map(|i| (i * max_value as u32 / 11) as u16)
            .collect();
        PgmImage {
            encoding,
            max_value,
            pixels: ImgVec::new(buf, 4, 3),
        }
    }

    fn round_trip(image: &PgmImage) -> PgmImage {
        let mut bytes = Vec::new();
        write_pgm(&mut bytes, image).unwrap();
        read_pgm(bytes.as_slice()).unwrap()
    }

    #[test]
    fn ascii_with_comments() {
        let text = b"P2\n# made by hand\n3 2 # width height\n15\n0 7 15\n 1  2\n3\n";
        let img = read_pgm(&text[..]).unwrap();
        assert_eq!(img.encoding, PgmEncoding::Ascii);
        assert_eq!((img.width(), img.height()), (3, 2));
        assert_eq!(img.max_value, 15);
        assert_eq!(img.pixels.buf(), &vec![0, 7, 15, 1, 2, 3]);
    }

    #[test]
    fn binary_8_bit() {
        let mut data = b"P5 2 2 255\n".to_vec();
        data.extend_from_slice(&[0, 10, 200, 255]);
        let img = read_pgm(data.as_slice()).unwrap();
        assert_eq!(img.encoding, PgmEncoding::Binary);
        assert_eq!(img.pixels.buf(), &vec![0, 10, 200, 255]);
    }

    #[test]
    fn binary_16_bit_is_big_endian() {
        let mut data = b"P5\n2 1\n1000\n".to_vec();
        data.extend_from_slice(&[0x03, 0xE8, 0x00, 0x01]);
        let img = read_pgm(data.as_slice()).unwrap();
        assert_eq!(img.pixels.buf(), &vec![1000, 1]);
    }

    #[test]
    fn binary_raster_may_start_with_whitespace_byte() {
        // first sample is 0x0A ('\n'), must not be skipped as header whitespace
        let mut data = b"P5 2 1 255\n".to_vec();
        data.extend_from_slice(&[0x0A, 0x20]);
        let img = read_pgm(data.as_slice()).unwrap();
        assert_eq!(img.pixels.buf(), &vec![10, 32]);
    }

    #[test]
    fn round_trips_every_encoding() {
        for encoding in [PgmEncoding::Ascii, PgmEncoding::Binary] {
            for max_value in [1u16, 15, 255, 256, 65535] {
                let img = sample(encoding, max_value);
                assert_eq!(round_trip(&img), img, "{encoding:?} max {max_value}");
            }
        }
    }

    #[test]
    fn rejects_bad_magic() {
        assert!(matches!(
            read_pgm(&b"P6 1 1 255\n\0\0\0"[..]),
            Err(PgmError::BadMagic(m)) if m == "P6"
        ));
        assert!(matches!(read_pgm(&b""[..]), Err(PgmError::BadMagic(_))));
    }

    #[test]
    fn rejects_bad_headers() {
        assert!(matches!(
            read_pgm(&b"P2 3\n"[..]),
            Err(PgmError::Header(_))
        ));
        assert!(matches!(
            read_pgm(&b"P2 0 3 255\n"[..]),
            Err(PgmError::ZeroDimension)
        ));
        assert!(matches!(
            read_pgm(&b"P2 1 1 70000\n0\n"[..]),
            Err(PgmError::InvalidMaxValue(70000))
        ));
        assert!(matches!(
            read_pgm(&b"P2 1 1 0\n0\n"[..]),
            Err(PgmError::InvalidMaxValue(0))
        ));
    }

    #[test]
    fn rejects_bad_samples() {
        assert!(matches!(
            read_pgm(&b"P2 2 1 9\n3 12\n"[..]),
            Err(PgmError::SampleOutOfRange {
                value: 12,
                max_value: 9
            })
        ));
        assert!(matches!(
            read_pgm(&b"P2 2 2 9\n3 1 2\n"[..]),
            Err(PgmError::Truncated {
                read: 3,
                expected: 4
            })
        ));
        assert!(matches!(
            read_pgm(&b"P5 2 2 255\n\x01\x02"[..]),
            Err(PgmError::Truncated {
                read: 2,
                expected: 4
            })
        ));
    }

    #[test]
    fn huge_header_without_raster() {
        assert!(matches!(
            read_pgm(&b"P5 4294967296 4294967295 255\n\x00"[..]),
            Err(PgmError::Truncated { read: 1, .. })
        ));
        assert!(matches!(
            read_pgm(&b"P2 4294967296 4294967295 255\n7 8"[..]),
            Err(PgmError::Truncated { read: 2, .. })
        ));
    }

    #[test]
    fn rejects_garbage_in_raster() {
        assert!(matches!(
            read_pgm(&b"P2 2 1 9\n3 x\n"[..]),
            Err(PgmError::UnexpectedByte {
                byte: b'x',
                offset: 11
            })
        ));
        assert!(matches!(
            read_pgm(&b"P5 1 1 255x\x07"[..]),
            Err(PgmError::UnexpectedByte {
                byte: b'x',
                offset: 10
            })
        ));
    }

    #[test]
    fn write_refuses_out_of_range_pixels() {
        let img = PgmImage {
            encoding: PgmEncoding::Binary,
            max_value: 3,
            pixels: ImgVec::new(vec![0, 4], 2, 1),
        };
        let mut out = Vec::new();
        assert!(matches!(
            write_pgm(&mut out, &img),
            Err(PgmError::SampleOutOfRange { value: 4, .. })
        ));
    }

    #[test]
    fn files_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ramp.pgm");
        let img = sample(PgmEncoding::Binary, 255);
        save_pgm(&path, &img).unwrap();
        assert_eq!(load_pgm(&path).unwrap(), img);
        assert!(matches!(
            load_pgm(dir.path().join("missing.pgm")),
            Err(PgmError::Io(_))
        ));
    }
}
