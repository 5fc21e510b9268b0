//! Best-effort plain-text extraction, bounded by a character cap.
//!
//! Each format has its own `Result`-returning extractor; [`extract_text`]
//! folds every failure into an empty string so callers never see an error.

use std::fs;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

const PLAIN_TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "py", "js", "html", "css", "json", "xml", "yaml", "yml", "ini", "log", "csv",
    "ts", "jsx", "tsx", "sh", "bat", "java", "c", "cpp", "h", "hpp", "sql", "php", "rs", "toml",
];

const MAX_SHEETS: usize = 3;
const MAX_ROWS_PER_SHEET: usize = 50;
const MAX_PDF_PAGES: usize = 5;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    Unsupported(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("pdf error: {0}")]
    Pdf(String),
    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),
    #[error("document error: {0}")]
    Document(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    PlainText,
    Spreadsheet,
    WordProcessor,
    Pdf,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        match ext.as_str() {
            "pdf" => Some(Self::Pdf),
            "doc" | "docx" => Some(Self::WordProcessor),
            "xls" | "xlsx" => Some(Self::Spreadsheet),
            e if PLAIN_TEXT_EXTENSIONS.contains(&e) => Some(Self::PlainText),
            _ => None,
        }
    }
}

/// Extracted text truncated to `max_chars`, or empty on any failure.
pub fn extract_text(path: &Path, max_chars: usize) -> String {
    match try_extract(path, max_chars) {
        Ok(text) => text,
        Err(err) => {
            debug!(path = %path.display(), error = %err, "extraction degraded to empty text");
            String::new()
        }
    }
}

pub fn try_extract(path: &Path, max_chars: usize) -> Result<String, ExtractError> {
    let kind = DocumentKind::from_path(path).ok_or_else(|| {
        ExtractError::Unsupported(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;
    let text = match kind {
        DocumentKind::PlainText => plain_text(path, max_chars)?,
        DocumentKind::Spreadsheet => spreadsheet_text(path, max_chars)?,
        DocumentKind::WordProcessor => docx_text(path, max_chars)?,
        DocumentKind::Pdf => pdf_text(path, max_chars)?,
    };
    Ok(truncate_chars(&text, max_chars).to_string())
}

/// Longest prefix of `text` holding at most `max_chars` characters.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn plain_text(path: &Path, max_chars: usize) -> Result<String, ExtractError> {
    // A UTF-8 character is at most four bytes.
    let limit = (max_chars as u64).saturating_mul(4);
    let mut buf = Vec::new();
    fs::File::open(path)?.take(limit).read_to_end(&mut buf)?;
    Ok(decode(&buf))
}

/// UTF-8 first; a read cut mid-character still counts as UTF-8. Anything
/// else is decoded as Windows-1252, which accepts every byte.
fn decode(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(e) if e.error_len().is_none() => {
            String::from_utf8_lossy(&bytes[..e.valid_up_to()]).into_owned()
        }
        Err(_) => {
            let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            text.into_owned()
        }
    }
}

fn char_len(text: &str) -> usize {
    text.chars().count()
}

#[cfg(feature = "office")]
fn spreadsheet_text(path: &Path, max_chars: usize) -> Result<String, ExtractError> {
    use calamine::{open_workbook_auto, DataType, Reader};

    let mut workbook =
        open_workbook_auto(path).map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;
    let names = workbook.sheet_names().to_vec();
    let mut text = String::new();

    'sheets: for name in names.iter().take(MAX_SHEETS) {
        let range = match workbook.worksheet_range(name) {
            Some(Ok(range)) => range,
            Some(Err(e)) => return Err(ExtractError::Spreadsheet(e.to_string())),
            None => continue,
        };
        for row in range.rows().take(MAX_ROWS_PER_SHEET) {
            let cells: Vec<String> = row
                .iter()
                .filter(|cell| !matches!(cell, DataType::Empty))
                .map(|cell| cell.to_string())
                .filter(|value| !value.is_empty())
                .collect();
            text.push_str(&cells.join(" "));
            text.push('\n');
            if char_len(&text) > max_chars {
                break 'sheets;
            }
        }
    }
    Ok(text)
}

#[cfg(not(feature = "office"))]
fn spreadsheet_text(_path: &Path, _max_chars: usize) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("spreadsheet support not compiled".into()))
}

#[cfg(feature = "office")]
fn docx_text(path: &Path, max_chars: usize) -> Result<String, ExtractError> {
    let file = fs::File::open(path)?;
    let mut archive =
        zip::ZipArchive::new(file).map_err(|e| ExtractError::Document(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::Document(e.to_string()))?
        .read_to_string(&mut xml)?;
    paragraphs_from_xml(&xml, max_chars)
}

#[cfg(not(feature = "office"))]
fn docx_text(_path: &Path, _max_chars: usize) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("document support not compiled".into()))
}

/// Concatenates `<w:t>` runs, one line per `<w:p>` paragraph, in document order.
pub(crate) fn paragraphs_from_xml(xml: &str, max_chars: usize) -> Result<String, ExtractError> {
    use quick_xml::events::Event;
    use quick_xml::Reader;

    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_run_text = true,
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_run_text = false,
                b"p" => {
                    text.push('\n');
                    if char_len(&text) > max_chars {
                        break;
                    }
                }
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"p" => text.push('\n'),
            Ok(Event::Text(t)) if in_run_text => {
                let run = t
                    .unescape()
                    .map_err(|e| ExtractError::Document(e.to_string()))?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(ExtractError::Document(e.to_string())),
        }
    }
    Ok(text)
}

#[cfg(feature = "pdf")]
fn pdf_text(path: &Path, max_chars: usize) -> Result<String, ExtractError> {
    let bytes = fs::read(path)?;
    let mut doc =
        lopdf::Document::load_mem(&bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    drop(bytes);
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let (leading, rest) = pages.split_at(pages.len().min(MAX_PDF_PAGES));

    let first = pdf_pages_text(&doc, leading, max_chars);
    if matches!(&first, Ok(text) if !text.trim().is_empty()) {
        return first;
    }

    // lopdf gives up on some font encodings that pdf-extract handles. The
    // fallback parses a copy cut down to the same leading pages.
    if !rest.is_empty() {
        doc.delete_pages(rest);
        doc.prune_objects();
    }
    let mut trimmed = Vec::new();
    doc.save_to(&mut trimmed)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let fallback = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(&trimmed))
        .map_err(|_| ExtractError::Pdf("parser panicked".into()))?;
    match fallback {
        Ok(text) => Ok(text),
        Err(e) => first.and(Err(ExtractError::Pdf(e.to_string()))),
    }
}

#[cfg(feature = "pdf")]
fn pdf_pages_text(
    doc: &lopdf::Document,
    pages: &[u32],
    max_chars: usize,
) -> Result<String, ExtractError> {
    let mut text = String::new();
    for page in pages {
        let page_text = doc
            .extract_text(&[*page])
            .map_err(|e| ExtractError::Pdf(e.to_string()))?;
        text.push_str(&page_text);
        if char_len(&text) > max_chars {
            break;
        }
    }
    Ok(text)
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(_path: &Path, _max_chars: usize) -> Result<String, ExtractError> {
    Err(ExtractError::Unsupported("pdf support not compiled".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_by_extension() {
        assert_eq!(
            DocumentKind::from_path(Path::new("a/B.PDF")),
            Some(DocumentKind::Pdf)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("notes.md")),
            Some(DocumentKind::PlainText)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("report.doc")),
            Some(DocumentKind::WordProcessor)
        );
        assert_eq!(
            DocumentKind::from_path(Path::new("sheet.xlsx")),
            Some(DocumentKind::Spreadsheet)
        );
        assert_eq!(DocumentKind::from_path(Path::new("song.mp3")), None);
        assert_eq!(DocumentKind::from_path(Path::new("Makefile")), None);
    }

    #[test]
    fn plain_text_is_capped_in_characters() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.txt");
        fs::write(&path, "é".repeat(50)).unwrap();

        let text = extract_text(&path, 10);
        assert_eq!(text.chars().count(), 10);
        assert!(text.chars().all(|c| c == 'é'));
    }

    #[test]
    fn invalid_utf8_falls_back_to_single_byte_decoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.txt");
        fs::write(&path, b"caf\xe9 menu").unwrap();

        assert_eq!(extract_text(&path, 100), "café menu");
    }

    #[test]
    fn unsupported_and_missing_files_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("blob.bin");
        fs::write(&bin, [0u8, 1, 2]).unwrap();

        assert!(matches!(
            try_extract(&bin, 100),
            Err(ExtractError::Unsupported(_))
        ));
        assert_eq!(extract_text(&bin, 100), "");
        assert_eq!(extract_text(&dir.path().join("gone.txt"), 100), "");
    }

    #[test]
    fn corrupt_documents_are_empty() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["broken.pdf", "broken.docx", "broken.xlsx", "broken.doc"] {
            let path = dir.path().join(name);
            fs::write(&path, b"definitely not a document").unwrap();
            assert_eq!(extract_text(&path, 100), "", "{name}");
        }
    }

    #[test]
    fn paragraphs_keep_document_order() {
        let xml = r#"<?xml version="1.0"?>
            <w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
              <w:body>
                <w:p><w:r><w:t>Breadth first</w:t></w:r><w:r><w:t xml:space="preserve"> search</w:t></w:r></w:p>
                <w:p/>
                <w:p><w:r><w:t>Queue &amp; visited set</w:t></w:r></w:p>
              </w:body>
            </w:document>"#;
        let text = paragraphs_from_xml(xml, 1000).unwrap();
        assert_eq!(text, "Breadth first search\n\nQueue & visited set\n");
    }

    #[test]
    fn paragraphs_stop_after_cap() {
        let para = "<w:p><w:r><w:t>abcdefghij</w:t></w:r></w:p>";
        let xml = format!("<w:document><w:body>{}</w:body></w:document>", para.repeat(20));
        let text = paragraphs_from_xml(&xml, 25).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    /// One page per entry; `None` leaves the page without any text.
    #[cfg(feature = "pdf")]
    fn write_pdf(path: &Path, pages: &[Option<&str>]) {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });
        let mut kids: Vec<Object> = Vec::new();
        for text in pages {
            let operations = match text {
                Some(text) => vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 700.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
                None => vec![],
            };
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }
        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_reads_only_leading_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("six.pdf");
        let words = [
            "firstpage",
            "secondpage",
            "thirdpage",
            "fourthpage",
            "fifthpage",
            "sixthpage",
        ];
        let pages: Vec<Option<&str>> = words.iter().map(|w| Some(*w)).collect();
        write_pdf(&path, &pages);

        let text = extract_text(&path, 10_000);
        assert!(text.contains("firstpage"), "{text:?}");
        assert!(text.contains("fifthpage"), "{text:?}");
        assert!(!text.contains("sixthpage"), "{text:?}");
    }

    #[cfg(feature = "pdf")]
    #[test]
    fn pdf_fallback_sees_the_same_leading_pages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("late.pdf");
        // Blank leading pages push extraction onto the fallback parser.
        write_pdf(&path, &[None, None, None, None, None, Some("sixthpage")]);

        let text = extract_text(&path, 10_000);
        assert!(!text.contains("sixthpage"), "{text:?}");
    }

    /// Minimal xlsx with one worksheet per entry; each row is a list of
    /// optional inline-string cells.
    #[cfg(feature = "office")]
    fn write_xlsx(path: &Path, sheets: &[Vec<Vec<Option<String>>>]) {
        use std::io::Write;
        use zip::write::FileOptions;

        let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
        let opts = FileOptions::default();
        let mut put = |name: &str, body: &str| {
            zip.start_file(name, opts).unwrap();
            zip.write_all(body.as_bytes()).unwrap();
        };

        let mut overrides = String::new();
        let mut sheet_entries = String::new();
        let mut rels = String::new();
        for n in 1..=sheets.len() {
            overrides.push_str(&format!(
                r#"<Override PartName="/xl/worksheets/sheet{n}.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#
            ));
            sheet_entries.push_str(&format!(
                r#"<sheet name="S{n}" sheetId="{n}" r:id="rId{n}"/>"#
            ));
            rels.push_str(&format!(
                r#"<Relationship Id="rId{n}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{n}.xml"/>"#
            ));
        }
        put(
            "[Content_Types].xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>{overrides}</Types>"#
            ),
        );
        put(
            "_rels/.rels",
            r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#,
        );
        put(
            "xl/workbook.xml",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets>{sheet_entries}</sheets></workbook>"#
            ),
        );
        put(
            "xl/_rels/workbook.xml.rels",
            &format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{rels}</Relationships>"#
            ),
        );
        for (idx, rows) in sheets.iter().enumerate() {
            let mut data = String::new();
            for (r, row) in rows.iter().enumerate() {
                data.push_str(&format!(r#"<row r="{}">"#, r + 1));
                for (c, cell) in row.iter().enumerate() {
                    if let Some(value) = cell {
                        let col = (b'A' + c as u8) as char;
                        data.push_str(&format!(
                            r#"<c r="{col}{}" t="inlineStr"><is><t>{value}</t></is></c>"#,
                            r + 1
                        ));
                    }
                }
                data.push_str("</row>");
            }
            put(
                &format!("xl/worksheets/sheet{}.xml", idx + 1),
                &format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData></worksheet>"#
                ),
            );
        }
        zip.finish().unwrap();
    }

    #[cfg(feature = "office")]
    fn cells(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(str::to_string)).collect()
    }

    #[cfg(feature = "office")]
    #[test]
    fn spreadsheet_rows_join_non_empty_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.xlsx");
        write_xlsx(
            &path,
            &[vec![
                cells(&[Some("alpha"), None, Some("gamma")]),
                cells(&[Some("delta"), Some("epsilon")]),
            ]],
        );

        let text = extract_text(&path, 1000);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["alpha gamma", "delta epsilon"]);
    }

    #[cfg(feature = "office")]
    #[test]
    fn spreadsheet_reads_three_sheets_of_fifty_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.xlsx");
        let sheet = |tag: &str| -> Vec<Vec<Option<String>>> {
            (1..=60)
                .map(|r| vec![Some(format!("{tag}r{r}x"))])
                .collect()
        };
        write_xlsx(
            &path,
            &[sheet("one"), sheet("two"), sheet("three"), sheet("four")],
        );

        let text = extract_text(&path, 100_000);
        assert!(text.contains("oner50x"));
        assert!(!text.contains("oner51x"));
        assert!(text.contains("threer1x"));
        assert!(!text.contains("four"));
    }

    #[cfg(feature = "office")]
    #[test]
    fn spreadsheet_text_is_capped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wide.xlsx");
        let rows: Vec<Vec<Option<String>>> = (0..40)
            .map(|_| vec![Some("abcdefghij".to_string()); 5])
            .collect();
        write_xlsx(&path, &[rows]);

        let text = extract_text(&path, 120);
        assert_eq!(text.chars().count(), 120);
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 5), "hi");
        assert_eq!(truncate_chars("", 0), "");
    }
}
