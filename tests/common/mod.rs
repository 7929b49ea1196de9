/*!
 * Common test utilities for the storyport test suite.
 *
 * Every builder returns a minimal well-formed sample of one format as raw
 * bytes, so tests can write it under any name or cut it short.
 */

#![allow(dead_code)]

use anyhow::Result;
use rusqlite::{params, Connection};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use storyport::SourceFormat;
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Route library logs through the test harness; safe to call from every test
pub fn init_test_logging() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &[u8]) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    if let Some(parent) = file_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Stored (uncompressed) ZIP with the members in the given order
pub fn zip_package(members: &[(&str, &[u8])]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    for (name, content) in members {
        writer.start_file(*name, options)?;
        writer.write_all(content)?;
    }
    Ok(writer.finish()?.into_inner())
}

/// Final Draft script with three scenes and metadata between them
pub const FDX_SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no" ?>
<FinalDraft DocumentType="Script" Template="No" Version="5">
  <Content>
    <Paragraph Type="Scene Heading"><SceneProperties Length="1" Page="1" Title=""/><Text>INT. OBSERVATORY - NIGHT</Text></Paragraph>
    <Paragraph Type="Action"><Text>MIRA adjusts the telescope.</Text></Paragraph>
    <ScriptNote><Paragraph><Text>Check the lens flare.</Text></Paragraph></ScriptNote>
    <Paragraph Type="Character"><Text>MIRA</Text></Paragraph>
    <Paragraph Type="Parenthetical"><Text>(whispering)</Text></Paragraph>
    <Paragraph Type="Dialogue"><Text>There you are.</Text></Paragraph>
    <Paragraph Type="Scene Heading"><Text>EXT. ROOFTOP - NIGHT</Text></Paragraph>
    <SceneProperties Length="2" Page="2"/>
    <Paragraph Type="Action"><Text>Wind. The city hums below.</Text></Paragraph>
    <Paragraph Type="Transition"><Text>CUT TO:</Text></Paragraph>
    <Paragraph Type="Scene Heading"><Text>INT. STAIRWELL - CONTINUOUS</Text></Paragraph>
    <Paragraph Type="Action"><Text>Footsteps echo.</Text></Paragraph>
  </Content>
  <HeaderAndFooter FooterFirstPage="Yes" HeaderFirstPage="No"/>
  <TitlePage><Content><Paragraph Alignment="Center"><Text>Night Sky</Text></Paragraph></Content></TitlePage>
</FinalDraft>
"#;

/// Scene headings of [`FDX_SAMPLE`], in script order
pub const FDX_SAMPLE_SCENES: [&str; 3] = ["INT. OBSERVATORY - NIGHT", "EXT. ROOFTOP - NIGHT", "INT. STAIRWELL - CONTINUOUS"];

pub fn fdx_sample() -> Vec<u8> {
    FDX_SAMPLE.as_bytes().to_vec()
}

pub fn fdxt_sample() -> Vec<u8> {
    r#"<?xml version="1.0" encoding="UTF-8"?>
<FinalDraft DocumentType="Template" Template="Yes" Version="5">
  <Content>
    <Paragraph Type="Scene Heading"><Text>INT. LOCATION - DAY</Text></Paragraph>
    <Paragraph Type="Action"><Text>Describe the scene.</Text></Paragraph>
  </Content>
</FinalDraft>
"#
    .as_bytes()
    .to_vec()
}

pub fn trelby_sample() -> Vec<u8> {
    b"#Version 3\n\
#Begin-Config\n\
Paper-Type Letter\n\
#End-Config\n\
#Start-Script\n\
.\\INT. BAKERY - MORNING\n\
>.Flour everywhere. OTTO kneads dough with\n\
..great care.\n\
._OTTO\n\
.(to the dough)\n\
.:Rise, my friend. Rise.\n\
./DISSOLVE TO:\n\
.\\EXT. MARKET - DAY\n\
..Crowds.\n"
        .to_vec()
}

pub const DOCX_NS: &str = r#"xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main""#;

pub fn docx_sample() -> Result<Vec<u8>> {
    let paragraph = |style: &str, text: &str| {
        format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            style, text
        )
    };
    let body = [
        paragraph("SceneHeading", "INT. LIBRARY - DAY"),
        paragraph("Action", "Dust hangs in the light."),
        paragraph("Character", "LIBRARIAN"),
        paragraph("Dialogue", "Shh."),
    ]
    .concat();
    let document = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document {}><w:body>{}<w:sectPr/></w:body></w:document>"#,
        DOCX_NS, body
    );
    let styles = format!(
        r#"<?xml version="1.0"?><w:styles {}><w:style w:type="paragraph" w:styleId="SceneHeading"><w:name w:val="Scene Heading"/></w:style><w:style w:type="paragraph" w:styleId="Action"><w:name w:val="Action"/></w:style><w:style w:type="paragraph" w:styleId="Character"><w:name w:val="Character"/></w:style><w:style w:type="paragraph" w:styleId="Dialogue"><w:name w:val="Dialogue"/></w:style></w:styles>"#,
        DOCX_NS
    );
    zip_package(&[
        ("[Content_Types].xml", b"<?xml version=\"1.0\"?><Types/>".as_slice()),
        ("_rels/.rels", b"<?xml version=\"1.0\"?><Relationships/>".as_slice()),
        ("word/document.xml", document.as_bytes()),
        ("word/styles.xml", styles.as_bytes()),
    ])
}

pub const ODT_NS: &str = r#"xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:text="urn:oasis:names:tc:opendocument:xmlns:text:1.0" xmlns:style="urn:oasis:names:tc:opendocument:xmlns:style:1.0" xmlns:fo="urn:oasis:names:tc:opendocument:xmlns:xsl-fo-compatible:1.0""#;

const ODT_BODY: &str = r#"<office:body><office:text><text:p text:style-name="Scene_20_Heading">INT. GREENHOUSE - DAY</text:p><text:p text:style-name="Action">Tomatoes, everywhere.</text:p><text:p text:style-name="Character">ROSA</text:p><text:p text:style-name="Dialogue">Too many tomatoes.</text:p></office:text></office:body>"#;

const ODT_STYLES: &str = r#"<office:styles><style:style style:name="Scene_20_Heading" style:display-name="Scene Heading" style:family="paragraph"/><style:style style:name="Action" style:family="paragraph"/><style:style style:name="Character" style:family="paragraph"/><style:style style:name="Dialogue" style:family="paragraph"/></office:styles>"#;

pub fn odt_sample() -> Result<Vec<u8>> {
    let content = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-content {} office:version="1.2"><office:automatic-styles/>{}</office:document-content>"#,
        ODT_NS, ODT_BODY
    );
    let styles = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><office:document-styles {} office:version="1.2">{}</office:document-styles>"#,
        ODT_NS, ODT_STYLES
    );
    zip_package(&[
        ("mimetype", b"application/vnd.oasis.opendocument.text".as_slice()),
        ("content.xml", content.as_bytes()),
        ("styles.xml", styles.as_bytes()),
    ])
}

pub fn fodt_sample() -> Vec<u8> {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document {} office:version="1.2" office:mimetype="application/vnd.oasis.opendocument.text">{}<office:automatic-styles/>{}</office:document>
"#,
        ODT_NS, ODT_STYLES, ODT_BODY
    )
    .into_bytes()
}

pub const FOUNTAIN_SAMPLE: &str = "Title: Harbor Lights\n\
Author: Test Writer\n\
\n\
EXT. HARBOR - DAWN\n\
\n\
Gulls circle the boats.\n\
\n\
NOOR\n\
(calling out)\n\
Cast off!\n\
\n\
> CUT TO:\n";

pub fn fountain_sample() -> Vec<u8> {
    FOUNTAIN_SAMPLE.as_bytes().to_vec()
}

pub fn celtx_sample() -> Result<Vec<u8>> {
    let manifest = r#"<?xml version="1.0"?>
<RDF:RDF xmlns:RDF="http://www.w3.org/1999/02/22-rdf-syntax-ns#" xmlns:cx="http://celtx.com/NS/v1/">
  <RDF:Description RDF:about="http://celtx.com/res/script" cx:doctype="http://celtx.com/NS/v1/ScriptDocument" cx:localFile="script-1.html"/>
</RDF:RDF>"#;
    let script = r#"<html><head><title>Orchard</title></head><body>
<p class="sceneheading">EXT. ORCHARD - DUSK</p>
<p class="action">Apples thud into baskets.</p>
<p class="character">GRANDPA</p>
<p class="dialog">Not the green ones.</p>
</body></html>"#;
    zip_package(&[
        ("project.rdf", manifest.as_bytes()),
        ("script-1.html", script.as_bytes()),
    ])
}

pub const MARKDOWN_SAMPLE: &str = "# Harbor notes\n\
\n\
Open on the gulls, not the boats.\n\
\n\
- Noor needs a reason to leave\n";

pub fn markdown_sample() -> Vec<u8> {
    MARKDOWN_SAMPLE.as_bytes().to_vec()
}

pub const KIT_SCENARIO: &str = r#"<?xml version="1.0"?>
<scenario version="1.0">
<scene_heading><v><![CDATA[INT. WORKSHOP - NIGHT]]></v></scene_heading>
<action><v><![CDATA[Sparks fly from the grinder.]]></v></action>
<character><v><![CDATA[IVAN]]></v></character>
<dialog><v><![CDATA[Almost done.]]></v></dialog>
</scenario>"#;

/// KIT Scenarist project database with one draft and one final scenario
pub fn kitsp_sample() -> Result<Vec<u8>> {
    let dir = create_temp_dir()?;
    let path = dir.path().join("sample.kitsp");
    {
        let connection = Connection::open(&path)?;
        connection.execute_batch(
            "CREATE TABLE scenario (id INTEGER PRIMARY KEY, text TEXT NOT NULL, is_draft INTEGER NOT NULL DEFAULT 0);
             CREATE TABLE scenario_data (id INTEGER PRIMARY KEY, data_name TEXT NOT NULL, data_value TEXT);",
        )?;
        connection.execute(
            "INSERT INTO scenario (id, text, is_draft) VALUES (?1, ?2, ?3)",
            params![1, "<scenario><action><v>draft only</v></action></scenario>", 1],
        )?;
        connection.execute(
            "INSERT INTO scenario (id, text, is_draft) VALUES (?1, ?2, ?3)",
            params![2, KIT_SCENARIO, 0],
        )?;
        connection.execute(
            "INSERT INTO scenario_data (data_name, data_value) VALUES (?1, ?2)",
            params!["name", "Workshop"],
        )?;
    }
    Ok(fs::read(&path)?)
}

/// File name and bytes of a minimal sample for every format, in catalog order
pub fn samples() -> Result<Vec<(SourceFormat, &'static str, Vec<u8>)>> {
    Ok(vec![
        (SourceFormat::KitScenarist, "workshop.kitsp", kitsp_sample()?),
        (SourceFormat::FinalDraft, "night-sky.fdx", fdx_sample()),
        (SourceFormat::FinalDraftTemplate, "blank.fdxt", fdxt_sample()),
        (SourceFormat::Trelby, "bakery.trelby", trelby_sample()),
        (SourceFormat::OfficeOpenXml, "library.docx", docx_sample()?),
        (SourceFormat::OpenDocumentText, "greenhouse.odt", odt_sample()?),
        (SourceFormat::Fountain, "harbor.fountain", fountain_sample()),
        (SourceFormat::Celtx, "orchard.celtx", celtx_sample()?),
        (SourceFormat::Markdown, "harbor-notes.md", markdown_sample()),
    ])
}

/// First half of a sample
pub fn truncated(bytes: &[u8]) -> Vec<u8> {
    bytes[..bytes.len() / 2].to_vec()
}
