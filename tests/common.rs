#![allow(dead_code)]

use folio::{Color, Paint, Rect, SerializeSettings};

pub trait SerializeSettingsExt {
    fn uncompressed() -> Self;
}

impl SerializeSettingsExt for SerializeSettings {
    fn uncompressed() -> Self {
        Self {
            compress_content_streams: false,
            ..Self::default()
        }
    }
}

pub fn rect(x: f32, y: f32, w: f32, h: f32) -> Rect {
    Rect::from_xywh(x, y, w, h).unwrap()
}

pub fn red() -> Paint {
    Paint::from(Color::new(255, 0, 0))
}

pub fn blue() -> Paint {
    Paint::from(Color::new(0, 0, 255))
}

pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

pub fn count(haystack: &[u8], needle: &str) -> usize {
    haystack
        .windows(needle.len())
        .filter(|w| *w == needle.as_bytes())
        .count()
}

/// The raw data of every stream.
pub fn raw_streams(pdf: &[u8]) -> Vec<&[u8]> {
    let mut streams = vec![];
    let mut rest = pdf;

    while let Some(start) = find(rest, b"\nstream\n") {
        rest = &rest[start + 8..];
        let end = find(rest, b"\nendstream").unwrap();
        streams.push(&rest[..end]);
        rest = &rest[end..];
    }

    streams
}

/// The data of every stream in an uncompressed PDF.
pub fn streams(pdf: &[u8]) -> Vec<String> {
    raw_streams(pdf)
        .into_iter()
        .map(|data| String::from_utf8_lossy(data).into_owned())
        .collect()
}

/// The data of a deflated stream.
pub fn inflate(data: &[u8]) -> String {
    let data = miniz_oxide::inflate::decompress_to_vec_zlib(data).unwrap();
    String::from_utf8(data).unwrap()
}

/// Check that the cross-reference table points at the start of every object
/// and return the number of objects.
pub fn check_xref(pdf: &[u8]) -> usize {
    let start = find(pdf, b"startxref\n").unwrap() + 10;
    let end = start + find(&pdf[start..], b"\n").unwrap();
    let xref: usize = std::str::from_utf8(&pdf[start..end]).unwrap().parse().unwrap();
    assert!(pdf.ends_with(b"%%EOF"));

    let table = std::str::from_utf8(&pdf[xref..start]).unwrap();
    let mut lines = table.lines();
    assert_eq!(lines.next(), Some("xref"));
    let size: usize = lines.next().unwrap().strip_prefix("0 ").unwrap().parse().unwrap();
    assert_eq!(lines.next(), Some("0000000000 65535 f"));

    for number in 1..size {
        let line = lines.next().unwrap();
        assert!(line.ends_with(" 00000 n"));
        let offset: usize = line[..10].parse().unwrap();
        let expected = format!("{number} 0 obj\n");
        assert!(
            pdf[offset..].starts_with(expected.as_bytes()),
            "object {number} is not at offset {offset}"
        );
    }

    assert_eq!(lines.next(), Some("trailer"));
    assert!(table.contains(&format!("  /Size {size}\n")));

    size - 1
}
