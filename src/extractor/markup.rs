use crate::error::{EtlError, Result};
use crate::extractor::RecordExtractor;
use crate::record::{Record, RecordSet};
use crate::scanner::SourceFormat;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs;
use std::path::Path;
use tracing::debug;

// Root element is depth 1, one record per child of the root, one field per grandchild.
const RECORD_DEPTH: usize = 2;
const FIELD_DEPTH: usize = 3;

/// Reads XML documents shaped like
///
/// ```xml
/// <data>
///     <person>
///         <name>jack</name>
///         <height>68.7</height>
///         <weight>123.3</weight>
///     </person>
/// </data>
/// ```
///
/// The element names of the root and of each record do not matter. Only the
/// first `name`, `height` and `weight` child of a record is used. Names are
/// kept exactly as written, surrounding whitespace included.
#[derive(Debug, Default)]
pub struct MarkupExtractor;

impl MarkupExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn parse_str(&self, path: &Path, content: &str) -> Result<RecordSet> {
        let mut reader = Reader::from_str(content);

        let mut records = Vec::new();
        let mut depth = 0usize;
        let mut element = 0usize;
        let mut seen_root = false;
        let mut root_closed = false;
        let mut pending: Option<PendingRecord> = None;
        let mut field: Option<Field> = None;
        let mut text = String::new();

        loop {
            let event = match reader.read_event() {
                Ok(event) => event,
                Err(e) => {
                    return Err(EtlError::format(
                        path,
                        format!("invalid XML near byte {}: {}", reader.buffer_position(), e),
                    ))
                }
            };

            match event {
                Event::Start(_) | Event::Empty(_) if root_closed => {
                    return Err(EtlError::format(path, "content after the root element"));
                }
                Event::Text(value) if depth == 0 => {
                    if !value.iter().all(u8::is_ascii_whitespace) {
                        return Err(EtlError::format(path, "text outside the root element"));
                    }
                }
                Event::Start(start) => {
                    seen_root = true;
                    depth += 1;
                    match depth {
                        RECORD_DEPTH => {
                            element += 1;
                            pending = Some(PendingRecord::default());
                        }
                        FIELD_DEPTH => {
                            field = Field::from_tag(start.local_name().as_ref());
                            text.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(empty) => {
                    seen_root = true;
                    match depth + 1 {
                        1 => root_closed = true,
                        RECORD_DEPTH => {
                            element += 1;
                            records.push(PendingRecord::default().finish(path, element)?);
                        }
                        FIELD_DEPTH => {
                            if let (Some(f), Some(p)) =
                                (Field::from_tag(empty.local_name().as_ref()), pending.as_mut())
                            {
                                p.fill(f, String::new());
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(value) if depth == FIELD_DEPTH && field.is_some() => {
                    let value = value
                        .unescape()
                        .map_err(|e| EtlError::format(path, e.to_string()))?;
                    text.push_str(&value);
                }
                Event::CData(value) if depth == FIELD_DEPTH && field.is_some() => {
                    text.push_str(&String::from_utf8_lossy(&value.into_inner()));
                }
                Event::End(_) => {
                    match depth {
                        FIELD_DEPTH => {
                            if let (Some(f), Some(p)) = (field.take(), pending.as_mut()) {
                                p.fill(f, std::mem::take(&mut text));
                            }
                        }
                        RECORD_DEPTH => {
                            if let Some(p) = pending.take() {
                                records.push(p.finish(path, element)?);
                            }
                        }
                        _ => {}
                    }
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        root_closed = true;
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if !seen_root {
            return Err(EtlError::format(path, "document has no root element"));
        }

        if depth != 0 {
            return Err(EtlError::format(path, "document ended inside an open element"));
        }

        Ok(records)
    }
}

impl RecordExtractor for MarkupExtractor {
    fn format(&self) -> SourceFormat {
        SourceFormat::Markup
    }

    fn extract(&self, path: &Path) -> Result<RecordSet> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::InvalidData {
                EtlError::format(path, "file is not valid UTF-8")
            } else {
                EtlError::file_access(path, e)
            }
        })?;

        let records = self.parse_str(path, &content)?;
        debug!("Read {} records from {}", records.len(), path.display());
        Ok(records)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Name,
    Height,
    Weight,
}

impl Field {
    fn from_tag(tag: &[u8]) -> Option<Self> {
        match tag {
            b"name" => Some(Field::Name),
            b"height" => Some(Field::Height),
            b"weight" => Some(Field::Weight),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Height => "height",
            Field::Weight => "weight",
        }
    }
}

#[derive(Debug, Default)]
struct PendingRecord {
    name: Option<String>,
    height: Option<String>,
    weight: Option<String>,
}

impl PendingRecord {
    fn fill(&mut self, field: Field, value: String) {
        let slot = match field {
            Field::Name => &mut self.name,
            Field::Height => &mut self.height,
            Field::Weight => &mut self.weight,
        };

        if slot.is_none() {
            *slot = Some(value);
        }
    }

    fn finish(self, path: &Path, element: usize) -> Result<Record> {
        let name = self
            .name
            .ok_or_else(|| missing_field(path, element, Field::Name))?;
        let height = parse_number(path, element, Field::Height, self.height)?;
        let weight = parse_number(path, element, Field::Weight, self.weight)?;

        Ok(Record {
            name,
            height,
            weight,
        })
    }
}

fn parse_number(path: &Path, element: usize, field: Field, raw: Option<String>) -> Result<f64> {
    let raw = raw.ok_or_else(|| missing_field(path, element, field))?;

    raw.trim().parse::<f64>().map_err(|_| {
        EtlError::format(
            path,
            format!(
                "element {}: <{}> value '{}' is not a number",
                element,
                field.as_str(),
                raw
            ),
        )
    })
}

fn missing_field(path: &Path, element: usize, field: Field) -> EtlError {
    EtlError::MissingField {
        path: path.display().to_string(),
        element,
        field: field.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(content: &str) -> Result<RecordSet> {
        MarkupExtractor::new().parse_str(Path::new("test.xml"), content)
    }

    #[test]
    fn test_reads_children_in_document_order() {
        let records = parse(
            r#"<?xml version="1.0"?>
            <data>
                <person>
                    <name>simon</name>
                    <height>67.90</height>
                    <weight>112.37</weight>
                </person>
                <person>
                    <weight>142.99</weight>
                    <name>jacob</name>
                    <height>66.78</height>
                </person>
            </data>"#,
        )
        .unwrap();

        assert_eq!(
            records,
            vec![
                Record::new("simon", 67.90, 112.37),
                Record::new("jacob", 66.78, 142.99),
            ]
        );
    }

    #[test]
    fn test_empty_root_yields_no_records() {
        assert!(parse("<data></data>").unwrap().is_empty());
        assert!(parse("<data/>").unwrap().is_empty());
    }

    #[test]
    fn test_missing_height_is_missing_field() {
        let err = parse(
            "<data><person><name>a</name><height>1</height><weight>2</weight></person>\
             <person><name>b</name><weight>3</weight></person></data>",
        )
        .unwrap_err();

        match err {
            EtlError::MissingField { element, field, .. } => {
                assert_eq!(element, 2);
                assert_eq!(field, "height");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_non_numeric_weight_is_format_error() {
        let err = parse(
            "<data><person><name>a</name><height>1</height><weight>heavy</weight></person></data>",
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::Format { .. }));

        let err = parse("<data><person><name>a</name><height/><weight>2</weight></person></data>")
            .unwrap_err();
        assert!(matches!(err, EtlError::Format { .. }));
    }

    #[test]
    fn test_empty_record_element() {
        let err = parse("<data><person/></data>").unwrap_err();
        assert!(matches!(err, EtlError::MissingField { element: 1, .. }));
    }

    #[test]
    fn test_first_field_wins_and_entities_are_decoded() {
        let records = parse(
            "<data><person><name>Tom &amp; Jerry</name><name>ignored</name>\
             <height>1</height><weight><![CDATA[2.5]]></weight></person></data>",
        )
        .unwrap();

        assert_eq!(records, vec![Record::new("Tom & Jerry", 1.0, 2.5)]);
    }

    #[test]
    fn test_malformed_document_is_format_error() {
        assert!(matches!(
            parse("<data><person></data>"),
            Err(EtlError::Format { .. })
        ));
        assert!(matches!(parse(""), Err(EtlError::Format { .. })));
    }

    #[test]
    fn test_second_top_level_element_is_format_error() {
        let err = parse(
            "<data><p><name>jack</name><height>1</height><weight>2</weight></p></data>\
             <extra><p><name>Q</name><height>3</height><weight>4</weight></p></extra>",
        )
        .unwrap_err();
        assert!(matches!(err, EtlError::Format { .. }));

        assert!(matches!(
            parse("<data/><data/>"),
            Err(EtlError::Format { .. })
        ));
        assert!(matches!(
            parse("<data></data> trailing"),
            Err(EtlError::Format { .. })
        ));
        assert!(parse("<?xml version=\"1.0\"?>\n<data></data>\n").is_ok());
    }

    #[test]
    fn test_name_whitespace_is_kept() {
        let records = parse(
            "<data>\n  <p>\n    <name>  jack  smith </name>\n    <height> 68.7 </height>\n    \
             <weight>\n123.3\n</weight>\n  </p>\n</data>",
        )
        .unwrap();

        assert_eq!(records, vec![Record::new("  jack  smith ", 68.7, 123.3)]);
    }

    #[test]
    fn test_extract_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("source1.xml");
        fs::write(
            &path,
            "<data><person><name>jack</name><height>68.7</height><weight>123.3</weight></person></data>",
        )
        .unwrap();

        let records = MarkupExtractor::new().extract(&path).unwrap();
        assert_eq!(records, vec![Record::new("jack", 68.7, 123.3)]);
    }
}
