/*!
 * Content signatures for format sniffing.
 *
 * Every predicate here works on a short prefix of the file (see
 * `ImportSettings::sniff_prefix_bytes`) and must cope with a prefix that
 * ends in the middle of a tag, a ZIP member or a UTF-8 sequence.
 */

use once_cell::sync::Lazy;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";
const SQLITE_MAGIC: &[u8] = b"SQLite format 3\0";
const ZIP_LOCAL_HEADER: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const ODT_MIMETYPE: &[u8] = b"application/vnd.oasis.opendocument.text";

/// Keys a Fountain title page may open with, lowercase
pub const FOUNTAIN_TITLE_KEYS: &[&str] = &[
    "title",
    "credit",
    "author",
    "authors",
    "source",
    "draft date",
    "date",
    "contact",
    "copyright",
    "notes",
    "revision",
];

// @const: Fountain title page keys
static FOUNTAIN_TITLE_KEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"(?mi)^({})\s*:", FOUNTAIN_TITLE_KEYS.join("|"))).expect("Invalid title key regex")
});

// @const: Markdown heading on the first non-blank line
static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\A(?:[ \t]*\r?\n)*#{1,6}[ \t]+\S").expect("Invalid markdown heading regex"));

// @const: Fountain scene heading, regular or forced
static FOUNTAIN_SCENE_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:(?:int\.?/ext|int/ext|i/e|int|ext|est)[\. ]|\.[a-z])")
        .expect("Invalid scene line regex")
});

/// Drop a leading UTF-8 byte order mark
pub fn strip_bom(bytes: &[u8]) -> &[u8] {
    bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
}

/// Root element of an XML prefix: qualified name and attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlRoot {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

impl XmlRoot {
    /// Name without namespace prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Attribute value by local name
    pub fn attribute(&self, local: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key.rsplit(':').next() == Some(local))
            .map(|(_, value)| value.as_str())
    }
}

/// Find the root element of an XML prefix, if the prefix is XML at all
pub fn xml_root(prefix: &[u8]) -> Option<XmlRoot> {
    let mut reader = Reader::from_reader(strip_bom(prefix));
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                let attributes = e
                    .attributes()
                    .flatten()
                    .map(|attr| {
                        (
                            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                            String::from_utf8_lossy(&attr.value).into_owned(),
                        )
                    })
                    .collect();
                return Some(XmlRoot { name, attributes });
            }
            Ok(Event::Text(t)) => {
                if !t.iter().all(u8::is_ascii_whitespace) {
                    return None;
                }
            }
            Ok(Event::Eof) | Err(_) => return None,
            Ok(_) => {}
        }
        buf.clear();
    }
}

/// KIT Scenarist projects are SQLite databases
pub fn is_sqlite_database(prefix: &[u8]) -> bool {
    prefix.starts_with(SQLITE_MAGIC)
}

/// Binary Office documents (OLE compound files)
pub fn is_ole_compound_file(prefix: &[u8]) -> bool {
    prefix.starts_with(OLE_MAGIC)
}

pub fn is_final_draft_xml(prefix: &[u8]) -> bool {
    xml_root(prefix).is_some_and(|root| root.local_name() == "FinalDraft")
}

pub fn is_final_draft_template(prefix: &[u8]) -> bool {
    xml_root(prefix).is_some_and(|root| {
        root.local_name() == "FinalDraft"
            && root
                .attribute("DocumentType")
                .is_some_and(|t| t.eq_ignore_ascii_case("template"))
    })
}

pub fn is_trelby_text(prefix: &[u8]) -> bool {
    strip_bom(prefix).starts_with(b"#Version ")
}

/// Names of the ZIP members whose local headers are fully inside the prefix
pub fn zip_member_names(prefix: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut offset = 0usize;
    while prefix.len() >= offset + 30 && prefix[offset..].starts_with(ZIP_LOCAL_HEADER) {
        let header = &prefix[offset..];
        let flags = u16::from_le_bytes([header[6], header[7]]);
        let compressed = u32::from_le_bytes([header[18], header[19], header[20], header[21]]) as usize;
        let name_len = u16::from_le_bytes([header[26], header[27]]) as usize;
        let extra_len = u16::from_le_bytes([header[28], header[29]]) as usize;
        let Some(name) = header.get(30..30 + name_len) else {
            break;
        };
        names.push(String::from_utf8_lossy(name).into_owned());

        // Sizes live in a trailing data descriptor; we cannot skip to the next header
        if flags & 0x0008 != 0 {
            break;
        }
        offset += 30 + name_len + extra_len + compressed;
    }
    names
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

pub fn is_office_open_xml_package(prefix: &[u8]) -> bool {
    if !prefix.starts_with(ZIP_LOCAL_HEADER) {
        return false;
    }
    let names = zip_member_names(prefix);
    names.iter().any(|name| {
        name == "[Content_Types].xml" || name.starts_with("word/") || name.starts_with("_rels/")
    }) || contains(prefix, b"[Content_Types].xml")
}

pub fn is_open_document_text(prefix: &[u8]) -> bool {
    if prefix.starts_with(ZIP_LOCAL_HEADER) {
        let names = zip_member_names(prefix);
        // The mimetype member is stored first and uncompressed by the ODF packaging rules
        return names.first().is_some_and(|name| name == "mimetype")
            && contains(&prefix[..prefix.len().min(256)], ODT_MIMETYPE);
    }
    xml_root(prefix).is_some_and(|root| root.name == "office:document")
}

pub fn is_celtx_package(prefix: &[u8]) -> bool {
    if !prefix.starts_with(ZIP_LOCAL_HEADER) {
        return false;
    }
    zip_member_names(prefix).iter().any(|name| {
        name == "project.rdf" || (name.starts_with("script") && name.ends_with(".html"))
    }) || contains(prefix, b"project.rdf")
}

/// The longest valid UTF-8 text at the start of a prefix
pub fn text_prefix(prefix: &[u8]) -> Option<&str> {
    let bytes = strip_bom(prefix);
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text,
        // A prefix may cut a multi-byte character; anything else is binary
        Err(e) if e.error_len().is_none() => std::str::from_utf8(&bytes[..e.valid_up_to()]).ok()?,
        Err(_) => return None,
    };
    if text.contains('\0') {
        return None;
    }
    Some(text)
}

pub fn is_fountain_text(prefix: &[u8]) -> bool {
    text_prefix(prefix).is_some_and(|text| {
        FOUNTAIN_TITLE_KEY.is_match(text) || FOUNTAIN_SCENE_LINE.is_match(text)
    })
}

pub fn is_markdown_text(prefix: &[u8]) -> bool {
    text_prefix(prefix).is_some_and(|text| MARKDOWN_HEADING.is_match(text))
}
