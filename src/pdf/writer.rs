//! Incremental PDF writer for page-image documents.
//!
//! Layout of a document after `n` appends:
//!
//! ```text
//! header | catalog (1) | empty page tree (2) | xref | trailer
//! page 1: image XObject | content stream | page | page tree rev. | xref (/Prev) | trailer
//! ...
//! page n: ...
//! ```
//!
//! Every section ends in `%%EOF`, so readers accept the file at any point.
//! No timestamps or random IDs are written; identical images give identical bytes.

use super::PageImage;

const CATALOG_ID: u32 = 1;
const PAGES_ID: u32 = 2;
const FIRST_FREE_ID: u32 = 3;

/// Tracks object numbering and byte offsets of a growing PDF document.
#[derive(Debug, Clone)]
pub struct PdfAppender {
    next_id: u32,
    kids: Vec<u32>,
    pages_offset: usize,
    last_xref: usize,
    len: usize,
}

impl PdfAppender {
    /// Starts a new document, returning the writer state and the initial bytes.
    #[must_use]
    pub fn start() -> (Self, Vec<u8>) {
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.7\n");
        // Binary marker (recommended for binary content)
        out.extend_from_slice(b"%\xE2\xE3\xCF\xD3\n");

        let catalog_offset = out.len();
        push_object(
            &mut out,
            CATALOG_ID,
            &format!("<< /Type /Catalog /Pages {PAGES_ID} 0 R >>"),
        );
        let pages_offset = out.len();
        push_object(&mut out, PAGES_ID, &page_tree(&[]));

        let xref_offset = out.len();
        out.extend_from_slice(b"xref\n0 3\n0000000000 65535 f \n");
        push_xref_entry(&mut out, catalog_offset);
        push_xref_entry(&mut out, pages_offset);
        push_trailer(
            &mut out,
            &format!("<< /Size {FIRST_FREE_ID} /Root {CATALOG_ID} 0 R >>"),
            xref_offset,
        );

        let appender = Self {
            next_id: FIRST_FREE_ID,
            kids: Vec::new(),
            pages_offset,
            last_xref: xref_offset,
            len: out.len(),
        };
        (appender, out)
    }

    /// Appends one page showing `image`, returning the bytes to append to the file.
    pub fn append_page(&mut self, image: &PageImage) -> Vec<u8> {
        let base = self.len;
        let image_id = self.next_id;
        let content_id = image_id + 1;
        let page_id = image_id + 2;
        let (width, height) = (image.width, image.height);

        let mut out = Vec::new();
        let mut offsets = Vec::with_capacity(3);

        offsets.push(base + out.len());
        push_stream(
            &mut out,
            image_id,
            &format!(
                "/Type /XObject /Subtype /Image /Width {width} /Height {height} \
                 /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode"
            ),
            &image.data,
        );

        let content = format!("q\n{width} 0 0 {height} 0 0 cm\n/Im0 Do\nQ\n");
        offsets.push(base + out.len());
        push_stream(&mut out, content_id, "", content.as_bytes());

        offsets.push(base + out.len());
        push_object(
            &mut out,
            page_id,
            &format!(
                "<< /Type /Page /Parent {PAGES_ID} 0 R /MediaBox [0 0 {width} {height}] \
                 /Resources << /XObject << /Im0 {image_id} 0 R >> >> /Contents {content_id} 0 R >>"
            ),
        );

        self.kids.push(page_id);
        let pages_offset = base + out.len();
        push_object(&mut out, PAGES_ID, &page_tree(&self.kids));

        let xref_offset = base + out.len();
        out.extend_from_slice(format!("xref\n{PAGES_ID} 1\n").as_bytes());
        push_xref_entry(&mut out, pages_offset);
        out.extend_from_slice(format!("{image_id} 3\n").as_bytes());
        for offset in offsets {
            push_xref_entry(&mut out, offset);
        }

        self.next_id = page_id + 1;
        push_trailer(
            &mut out,
            &format!(
                "<< /Size {} /Root {CATALOG_ID} 0 R /Prev {} >>",
                self.next_id, self.last_xref
            ),
            xref_offset,
        );

        self.pages_offset = pages_offset;
        self.last_xref = xref_offset;
        self.len += out.len();
        out
    }

    /// Number of pages appended so far.
    #[must_use]
    pub fn page_count(&self) -> usize {
        self.kids.len()
    }

    /// Total document length in bytes, including all appended sections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// True before anything beyond the header section has been written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.kids.is_empty()
    }

    /// Offset of the most recent page tree revision.
    #[must_use]
    pub fn page_tree_offset(&self) -> usize {
        self.pages_offset
    }
}

fn page_tree(kids: &[u32]) -> String {
    let refs: Vec<String> = kids.iter().map(|id| format!("{id} 0 R")).collect();
    format!(
        "<< /Type /Pages /Kids [{}] /Count {} >>",
        refs.join(" "),
        kids.len()
    )
}

fn push_object(out: &mut Vec<u8>, id: u32, body: &str) {
    out.extend_from_slice(format!("{id} 0 obj\n{body}\nendobj\n").as_bytes());
}

fn push_stream(out: &mut Vec<u8>, id: u32, dict_entries: &str, data: &[u8]) {
    let separator = if dict_entries.is_empty() { "" } else { " " };
    out.extend_from_slice(
        format!(
            "{id} 0 obj\n<< {dict_entries}{separator}/Length {} >>\nstream\n",
            data.len()
        )
        .as_bytes(),
    );
    out.extend_from_slice(data);
    out.extend_from_slice(b"\nendstream\nendobj\n");
}

/// Writes one 20-byte xref entry.
fn push_xref_entry(out: &mut Vec<u8>, offset: usize) {
    out.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
}

fn push_trailer(out: &mut Vec<u8>, trailer: &str, xref_offset: usize) {
    out.extend_from_slice(
        format!("trailer\n{trailer}\nstartxref\n{xref_offset}\n%%EOF\n").as_bytes(),
    );
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn page(width: u32, height: u32) -> PageImage {
        PageImage {
            width,
            height,
            data: vec![0x78, 0x9c, 0x03, 0x00, 0x00, 0x00, 0x00, 0x01],
        }
    }

    fn contains(haystack: &[u8], needle: &str) -> bool {
        haystack
            .windows(needle.len())
            .any(|window| window == needle.as_bytes())
    }

    /// Reads the offset after the final `startxref`.
    fn last_startxref(doc: &[u8]) -> usize {
        let text = String::from_utf8_lossy(doc);
        let tail = text.rsplit("startxref\n").next().unwrap();
        tail.lines().next().unwrap().parse().unwrap()
    }

    #[test]
    fn test_start_is_complete_empty_document() {
        let (appender, bytes) = PdfAppender::start();
        assert!(bytes.starts_with(b"%PDF-1.7\n"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(contains(&bytes, "/Count 0"));
        assert_eq!(appender.len(), bytes.len());
        assert!(appender.is_empty());
        assert_eq!(&bytes[last_startxref(&bytes)..][..4], b"xref");
    }

    #[test]
    fn test_xref_offsets_point_at_objects() {
        let (mut appender, mut doc) = PdfAppender::start();
        doc.extend(appender.append_page(&page(4, 3)));

        let xref_at = last_startxref(&doc);
        assert_eq!(&doc[xref_at..][..4], b"xref");

        let section = String::from_utf8_lossy(&doc[xref_at..]).to_string();
        let mut lines = section.lines().skip(1);
        let mut checked = 0;
        while let Some(header) = lines.next() {
            if header == "trailer" {
                break;
            }
            let mut parts = header.split(' ');
            let first: usize = parts.next().unwrap().parse().unwrap();
            let count: usize = parts.next().unwrap().parse().unwrap();
            for id in first..first + count {
                let entry = lines.next().unwrap();
                let offset: usize = entry[..10].parse().unwrap();
                let expected = format!("{id} 0 obj");
                assert_eq!(&doc[offset..offset + expected.len()], expected.as_bytes());
                checked += 1;
            }
        }
        assert_eq!(checked, 4);
    }

    #[test]
    fn test_append_grows_page_tree_and_chains_prev() {
        let (mut appender, mut doc) = PdfAppender::start();
        let first_xref = last_startxref(&doc);

        doc.extend(appender.append_page(&page(10, 20)));
        assert!(contains(&doc, &format!("/Prev {first_xref}")));
        let second_xref = last_startxref(&doc);

        doc.extend(appender.append_page(&page(30, 40)));
        assert!(contains(&doc, &format!("/Prev {second_xref}")));
        assert!(contains(&doc, "/Kids [5 0 R 8 0 R] /Count 2"));
        assert!(contains(&doc, "/MediaBox [0 0 30 40]"));
        assert!(contains(&doc, "/Size 9 /Root 1 0 R"));
        assert_eq!(appender.page_count(), 2);
        assert_eq!(appender.len(), doc.len());
        assert_eq!(
            &doc[appender.page_tree_offset()..][..7],
            b"2 0 obj"
        );
    }

    #[test]
    fn test_output_is_deterministic() {
        let build = || {
            let (mut appender, mut doc) = PdfAppender::start();
            doc.extend(appender.append_page(&page(2, 2)));
            doc
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_xref_entries_are_twenty_bytes() {
        let mut out = Vec::new();
        push_xref_entry(&mut out, 1234);
        assert_eq!(out.len(), 20);
        assert_eq!(out, b"0000001234 00000 n \n");
    }
}
