//! Fuzzy output comparator
//!
//! Classifies two byte streams as identical, similar (only blanks and ASCII
//! letter case differ) or different. Streams are consumed lazily through
//! buffered cursors, so neither side is materialized in memory.

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Bytes, Read};
use std::path::Path;

/// Result of comparing two outputs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Identical,
    Similar,
    Different,
}

/// Exit codes of the standalone `compare` command
mod exit_codes {
    pub const IDENTICAL: i32 = 1;
    pub const DIFFERENT: i32 = 2;
    pub const SIMILAR: i32 = 3;
}

impl Classification {
    pub fn exit_code(self) -> i32 {
        match self {
            Classification::Identical => exit_codes::IDENTICAL,
            Classification::Different => exit_codes::DIFFERENT,
            Classification::Similar => exit_codes::SIMILAR,
        }
    }

    pub fn from_exit_code(code: i32) -> Option<Self> {
        match code {
            exit_codes::IDENTICAL => Some(Classification::Identical),
            exit_codes::DIFFERENT => Some(Classification::Different),
            exit_codes::SIMILAR => Some(Classification::Similar),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Classification::Identical => "identical",
            Classification::Similar => "similar",
            Classification::Different => "different",
        };
        write!(f, "{}", s)
    }
}

/// Space and line breaks carry no meaning for the tolerant comparison
fn is_blank(byte: u8) -> bool {
    matches!(byte, b' ' | b'\n' | b'\r')
}

fn are_similar(a: u8, b: u8) -> bool {
    a.eq_ignore_ascii_case(&b)
}

struct ByteCursor<R: Read> {
    bytes: Bytes<BufReader<R>>,
}

impl<R: Read> ByteCursor<R> {
    fn new(reader: R) -> Self {
        Self {
            bytes: BufReader::new(reader).bytes(),
        }
    }

    fn next_byte(&mut self) -> io::Result<Option<u8>> {
        self.bytes.next().transpose()
    }

    /// Next byte that is not blank, or `None` at end of stream
    fn next_substantive(&mut self) -> io::Result<Option<u8>> {
        while let Some(byte) = self.next_byte()? {
            if !is_blank(byte) {
                return Ok(Some(byte));
            }
        }
        Ok(None)
    }
}

/// Compare two streams
pub fn compare<A: Read, B: Read>(a: A, b: B) -> io::Result<Classification> {
    let mut left = ByteCursor::new(a);
    let mut right = ByteCursor::new(b);

    let (l, r) = loop {
        match (left.next_byte()?, right.next_byte()?) {
            (None, None) => return Ok(Classification::Identical),
            (Some(x), Some(y)) if x == y => continue,
            (Some(x), Some(y)) => break (x, y),
            // One side is exhausted; the other may only carry trailing blanks.
            (None, Some(rest)) => return trailing_only_blanks(rest, &mut right),
            (Some(rest), None) => return trailing_only_blanks(rest, &mut left),
        }
    };

    let mut l = if is_blank(l) {
        left.next_substantive()?
    } else {
        Some(l)
    };
    let mut r = if is_blank(r) {
        right.next_substantive()?
    } else {
        Some(r)
    };

    loop {
        match (l, r) {
            (None, None) => return Ok(Classification::Similar),
            (Some(x), Some(y)) if are_similar(x, y) => {
                l = left.next_substantive()?;
                r = right.next_substantive()?;
            }
            _ => return Ok(Classification::Different),
        }
    }
}

fn trailing_only_blanks<R: Read>(
    first: u8,
    rest: &mut ByteCursor<R>,
) -> io::Result<Classification> {
    if is_blank(first) && rest.next_substantive()?.is_none() {
        Ok(Classification::Identical)
    } else {
        Ok(Classification::Different)
    }
}

/// Compare the contents of two files
pub fn compare_files(a: &Path, b: &Path) -> io::Result<Classification> {
    let a = File::open(a)?;
    let b = File::open(b)?;
    compare(a, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cmp(a: &str, b: &str) -> Classification {
        compare(a.as_bytes(), b.as_bytes()).unwrap()
    }

    fn flip_case(s: &str) -> String {
        s.chars()
            .map(|c| {
                if c.is_ascii_uppercase() {
                    c.to_ascii_lowercase()
                } else {
                    c.to_ascii_uppercase()
                }
            })
            .collect()
    }

    const SAMPLES: &[&str] = &[
        "",
        "hello\n",
        "Hello World",
        "1 2 3\n4 5 6\n",
        "The answer is 42.\n\n",
        "  leading blanks",
        "x",
        "MiXeD cAsE\r\nwith crlf\r\n",
        "tabs\tare\tcontent\n",
    ];

    #[test]
    fn test_identical() {
        assert_eq!(cmp("hello\n", "hello\n"), Classification::Identical);
        assert_eq!(cmp("", ""), Classification::Identical);
    }

    #[test]
    fn test_case_only_is_similar() {
        assert_eq!(cmp("Hello World", "hello world"), Classification::Similar);
    }

    #[test]
    fn test_trailing_blank_is_identical() {
        assert_eq!(cmp("hello", "hello "), Classification::Identical);
        assert_eq!(cmp("hello ", "hello"), Classification::Identical);
        assert_eq!(cmp("hello", "hello\n\n\n"), Classification::Identical);
    }

    #[test]
    fn test_single_byte_difference() {
        assert_eq!(cmp("abc", "abd"), Classification::Different);
    }

    #[test]
    fn test_inner_whitespace_is_similar() {
        assert_eq!(cmp("a b c", "abc"), Classification::Similar);
        assert_eq!(cmp("1 2\n3", "1\n2 3"), Classification::Similar);
        assert_eq!(cmp("x   ", "x\n"), Classification::Similar);
    }

    #[test]
    fn test_crlf_line_endings_are_blank() {
        assert_eq!(cmp("1 2\r\n3\r\n", "1 2\n3\n"), Classification::Similar);
        assert_eq!(cmp("Sum: 7\r\n", "Sum: 7"), Classification::Identical);
        assert_eq!(cmp("a\rb", "ab"), Classification::Similar);
    }

    #[test]
    fn test_trailing_content_is_different() {
        assert_eq!(cmp("abc", "abc d"), Classification::Different);
        assert_eq!(cmp("abc", "abcd"), Classification::Different);
        assert_eq!(cmp("ABC", "abc\nd\n"), Classification::Different);
        assert_eq!(cmp("", "a"), Classification::Different);
    }

    #[test]
    fn test_case_folding_is_ascii_only() {
        assert_eq!(cmp("a", "b"), Classification::Different);
        assert_eq!(cmp("[", "{"), Classification::Different);
        assert_eq!(cmp("\t", " "), Classification::Different);
    }

    #[test]
    fn test_long_blank_run_does_not_recurse() {
        let long = format!("x{}", " ".repeat(1_000_000));
        assert_eq!(cmp(&long, "x"), Classification::Identical);
        assert_eq!(cmp(&long, "X\n"), Classification::Similar);
    }

    #[test]
    fn test_self_comparison_is_identical() {
        for s in SAMPLES {
            assert_eq!(cmp(s, s), Classification::Identical, "{:?}", s);
        }
    }

    #[test]
    fn test_flipped_case_is_similar() {
        for s in SAMPLES.iter().filter(|s| s.chars().any(|c| c.is_ascii_alphabetic())) {
            assert_eq!(cmp(s, &flip_case(s)), Classification::Similar, "{:?}", s);
        }
    }

    #[test]
    fn test_symmetry() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(cmp(a, b), cmp(b, a), "{:?} vs {:?}", a, b);
            }
        }
    }

    #[test]
    fn test_inserted_whitespace_keeps_bucket() {
        let pairs = [
            ("Hello World", "hello world"),
            ("abc", "abd"),
            ("1 2 3", "1 2 3 4"),
            ("ok", "OK"),
        ];
        for (a, b) in pairs {
            let base = cmp(a, b);
            let padded = format!(" \n{}\n\n  ", a.replace(' ', "  \n "));
            let moved = cmp(&padded, b);
            assert_eq!(
                moved == Classification::Different,
                base == Classification::Different,
                "{:?} vs {:?}",
                padded,
                b
            );
            if base == Classification::Similar {
                assert_eq!(moved, Classification::Similar);
            }
        }
    }

    #[test]
    fn test_exit_code_round_trip() {
        for c in [
            Classification::Identical,
            Classification::Similar,
            Classification::Different,
        ] {
            assert_eq!(Classification::from_exit_code(c.exit_code()), Some(c));
        }
        assert_eq!(Classification::from_exit_code(0), None);
        assert_eq!(Classification::from_exit_code(255), None);
    }

    #[test]
    fn test_compare_files() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        std::fs::write(&a, "Line One\nline two\n").unwrap();
        std::fs::write(&b, "line one\nLINE TWO").unwrap();

        assert_eq!(compare_files(&a, &b).unwrap(), Classification::Similar);
        assert!(compare_files(&a, &dir.path().join("missing")).is_err());
    }
}
