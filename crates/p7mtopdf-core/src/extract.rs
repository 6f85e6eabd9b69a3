//! Locating the embedded PDF inside a signed container.
//!
//! A `.p7m` file wraps the original document in CMS signed-data. Instead of
//! parsing the ASN.1 structure, the payload is recovered by looking for the
//! PDF header and trailer markers in the raw bytes: everything from the first
//! `%PDF-` through the last `%%EOF` is the document.

use std::fmt;
use std::ops::Range;

use crate::ExtractError;

/// Byte marker delimiting the embedded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    /// `%PDF-`, the PDF file signature.
    Start,
    /// `%%EOF`, the trailer of a PDF or of one of its incremental updates.
    End,
}

impl Marker {
    pub const fn as_bytes(self) -> &'static [u8] {
        match self {
            Marker::Start => b"%PDF-",
            Marker::End => b"%%EOF",
        }
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Marker::Start => f.write_str("%PDF-"),
            Marker::End => f.write_str("%%EOF"),
        }
    }
}

/// Compute the byte range of the embedded PDF, or report which marker is missing.
///
/// The end marker is matched greedily: incrementally-updated PDFs carry one
/// `%%EOF` per revision, so stopping at the first one would drop every update.
pub fn locate_pdf(blob: &[u8]) -> Result<Range<usize>, Marker> {
    let start = find_first(blob, Marker::Start.as_bytes()).ok_or(Marker::Start)?;

    let end_marker = Marker::End.as_bytes();
    let eof = find_last(&blob[start..], end_marker).ok_or(Marker::End)?;

    Ok(start..start + eof + end_marker.len())
}

/// Like [`extract`], but returns the range of the PDF inside `blob`.
pub fn extract_span(blob: &[u8], label: &str) -> Result<Range<usize>, ExtractError> {
    let span = locate_pdf(blob).map_err(|missing| ExtractError::NoPdfMarkerFound {
        label: label.to_string(),
        missing,
    })?;
    tracing::trace!(
        label,
        start = span.start,
        end = span.end,
        total = blob.len(),
        "located embedded PDF"
    );
    Ok(span)
}

/// Extract the PDF payload from a signed container.
///
/// Returns the verbatim slice of `blob` spanning the first `%PDF-` through
/// the end of the last `%%EOF`. `label` only decorates the error.
pub fn extract<'a>(blob: &'a [u8], label: &str) -> Result<&'a [u8], ExtractError> {
    extract_span(blob, label).map(|span| &blob[span])
}

fn find_first(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn find_last(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).rposition(|w| w == needle)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrap(prefix: &[u8], payload: &[u8], suffix: &[u8]) -> Vec<u8> {
        let mut blob = prefix.to_vec();
        blob.extend_from_slice(payload);
        blob.extend_from_slice(suffix);
        blob
    }

    #[test]
    fn extracts_payload_between_markers() {
        let payload = b"%PDF-1.4\n1 0 obj\n<<>>\nendobj\ntrailer\n%%EOF";
        let blob = wrap(b"\x30\x82\x12\x34\x06\x09signed", payload, b"\xa0\x82sig\x00");
        assert_eq!(extract(&blob, "doc.p7m").unwrap(), payload);
    }

    #[test]
    fn returns_slice_of_input() {
        let blob = wrap(b"junk", b"%PDF-1.7 body %%EOF", b"tail");
        let out = extract(&blob, "x").unwrap();
        let offset = out.as_ptr() as usize - blob.as_ptr() as usize;
        assert_eq!(offset, 4);
        assert_eq!(out.len(), b"%PDF-1.7 body %%EOF".len());
    }

    #[test]
    fn end_marker_is_matched_greedily() {
        let blob = b"..%PDF-1.5 rev1 %%EOF\nrev2 xref %%EOF\r\n\x00\x01";
        let out = extract(blob, "incremental.p7m").unwrap();
        assert_eq!(out, b"%PDF-1.5 rev1 %%EOF\nrev2 xref %%EOF");
    }

    #[test]
    fn first_start_marker_wins() {
        let blob = b"\x00%PDF-1.4 a %PDF-1.6 b %%EOF";
        let out = extract(blob, "x").unwrap();
        assert!(out.starts_with(b"%PDF-1.4 a %PDF-1.6"));
        assert_eq!(out.len(), blob.len() - 1);
    }

    #[test]
    fn spans_line_breaks_and_binary_noise() {
        let payload = b"%PDF-1.3\r\n\xff\xfe\n\rstream\n\x00\x00\x0a\x0dendstream\n%%EOF";
        let blob = wrap(b"\r\n\r\n", payload, b"\n\n");
        assert_eq!(extract(&blob, "crlf.p7m").unwrap(), payload);
    }

    #[test]
    fn no_trimming_or_normalization() {
        let payload = b"%PDF-1.4  \n\t body \r\n  %%EOF";
        let blob = wrap(b"  ", payload, b"  \n");
        assert_eq!(extract(&blob, "x").unwrap(), payload);
    }

    #[test]
    fn extraction_is_idempotent() {
        let blob = b"wrapper %PDF-1.4 x %%EOF y %%EOF trailer-bytes";
        let once = extract(blob, "x").unwrap();
        let twice = extract(once, "x").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn bare_pdf_is_accepted() {
        let pdf = b"%PDF-1.4\nplain document\n%%EOF\n";
        assert_eq!(extract(pdf, "plain.pdf").unwrap(), &pdf[..pdf.len() - 1]);
    }

    #[test]
    fn minimal_adjacent_markers() {
        assert_eq!(extract(b"%PDF-%%EOF", "x").unwrap(), b"%PDF-%%EOF");
    }

    #[test]
    fn empty_blob_fails() {
        let err = extract(b"", "empty.p7m").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::NoPdfMarkerFound {
                missing: Marker::Start,
                ..
            }
        ));
    }

    #[test]
    fn missing_start_marker_fails() {
        let err = extract(b"signed data only %%EOF", "nopdf.p7m").unwrap_err();
        let ExtractError::NoPdfMarkerFound { label, missing } = err;
        assert_eq!(label, "nopdf.p7m");
        assert_eq!(missing, Marker::Start);
    }

    #[test]
    fn missing_end_marker_fails() {
        let err = extract(b"\x30\x80%PDF-1.4 truncated", "cut.p7m").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::NoPdfMarkerFound {
                missing: Marker::End,
                ..
            }
        ));
    }

    #[test]
    fn end_marker_before_start_fails() {
        let err = extract(b"%%EOF then %PDF-1.4 and nothing", "order.p7m").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::NoPdfMarkerFound {
                missing: Marker::End,
                ..
            }
        ));
    }

    #[test]
    fn partial_markers_are_not_matches() {
        assert!(extract(b"%PDF %%EO %PD", "x").is_err());
        assert_eq!(locate_pdf(b"%PDF-1.4 %%EO"), Err(Marker::End));
    }

    #[test]
    fn error_message_names_the_label() {
        let err = extract(b"nothing here", "fattura_01.p7m").unwrap_err();
        assert!(err.to_string().contains("fattura_01.p7m"));
    }

    #[test]
    fn span_matches_extracted_bytes() {
        let blob = b"abc%PDF-1.4 zz %%EOFdef";
        let span = locate_pdf(blob).unwrap();
        assert_eq!(span, 3..20);
        assert_eq!(&blob[span], extract(blob, "x").unwrap());
    }

    #[test]
    fn span_error_names_label_and_marker() {
        assert_eq!(extract_span(b"xx%PDF-1.4 %%EOF", "a.p7m"), Ok(2..16));
        assert_eq!(
            extract_span(b"%PDF-1.4", "b.p7m"),
            Err(ExtractError::NoPdfMarkerFound {
                label: "b.p7m".to_string(),
                missing: Marker::End,
            })
        );
    }
}
