/*!
 * Thin wrapper over `zip` for the packaged formats (DOCX, ODT, Celtx).
 */

use std::io::{Read, Seek};

use log::debug;
use zip::result::ZipError;
use zip::ZipArchive;

use crate::errors::ParseError;

/// An opened ZIP package
pub(crate) struct Archive<R: Read + Seek> {
    zip: ZipArchive<R>,
}

impl<R: Read + Seek> Archive<R> {
    /// Read the central directory; a truncated package fails here
    pub fn open(reader: R) -> Result<Self, ParseError> {
        let zip = ZipArchive::new(reader)?;
        debug!("Opened package with {} members", zip.len());
        Ok(Self { zip })
    }

    /// Member names in archive order
    pub fn member_names(&mut self) -> Result<Vec<String>, ParseError> {
        let mut names = Vec::with_capacity(self.zip.len());
        for index in 0..self.zip.len() {
            let member = self.zip.by_index_raw(index)?;
            names.push(member.name().to_string());
        }
        Ok(names)
    }

    /// Contents of a member, or None when the package lacks it
    pub fn read_member(&mut self, name: &str) -> Result<Option<Vec<u8>>, ParseError> {
        match self.zip.by_name(name) {
            Ok(mut member) => {
                let mut bytes = Vec::with_capacity(member.size() as usize);
                member
                    .read_to_end(&mut bytes)
                    .map_err(|e| ParseError::corrupt(format!("cannot extract {}: {}", name, e)))?;
                Ok(Some(bytes))
            }
            Err(ZipError::FileNotFound) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Contents of a member the package cannot do without
    pub fn read_required(&mut self, name: &str) -> Result<Vec<u8>, ParseError> {
        self.read_member(name)?
            .ok_or_else(|| ParseError::corrupt(format!("package has no {} member", name)))
    }
}

/// Build an in-memory package with stored members
#[cfg(test)]
pub(crate) fn build_zip(members: &[(&str, &[u8])]) -> Vec<u8> {
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, data) in members {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}
