use anyhow::{Context, Result};
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::xml::XmlDocument;
use crate::errors::DocumentError;
use crate::file_utils::FileManager;

// @const: Main document part
pub const DOCUMENT_PART: &str = "word/document.xml";

// @const: Style definitions part
pub const STYLES_PART: &str = "word/styles.xml";

/// The parts of an OOXML package, in archive order
#[derive(Debug, Clone, Default)]
pub struct DocxPackage {
    parts: Vec<(String, Vec<u8>)>,
}

impl DocxPackage {
    /// Read every file entry of the zip archive at `path`
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).with_context(|| format!("Failed to open document: {:?}", path))?;
        Self::read_archive(file).with_context(|| format!("Not a DOCX (zip) package: {:?}", path))
    }

    /// Package of an in-memory zip archive
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::read_archive(Cursor::new(data)).context("Not a DOCX (zip) package")
    }

    fn read_archive<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut archive = ZipArchive::new(reader)?;
        let mut parts = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut entry = archive.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let mut data = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut data)
                .with_context(|| format!("Failed to read package part {}", entry.name()))?;
            parts.push((entry.name().to_string(), data));
        }
        Ok(Self { parts })
    }

    pub fn part(&self, name: &str) -> Option<&[u8]> {
        self.parts
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| data.as_slice())
    }

    /// Replace a part, or append it when new
    pub fn set_part(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = data,
            None => self.parts.push((name.to_string(), data)),
        }
    }

    /// Parse a part as XML
    pub fn xml_part(&self, name: &str) -> Result<XmlDocument> {
        let data = self
            .part(name)
            .ok_or_else(|| DocumentError::MissingPart(name.to_string()))?;
        let text = String::from_utf8_lossy(data);
        XmlDocument::parse(&text).map_err(|e| {
            DocumentError::MalformedXml {
                part: name.to_string(),
                message: e.to_string(),
            }
            .into()
        })
    }

    pub fn set_xml_part(&mut self, name: &str, doc: &XmlDocument) -> Result<()> {
        let data = doc.to_bytes()?;
        self.set_part(name, data);
        Ok(())
    }

    /// `word/document.xml`
    pub fn document(&self) -> Result<XmlDocument> {
        self.xml_part(DOCUMENT_PART)
    }

    /// Write the package as a deflated zip archive
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        FileManager::ensure_parent(path)?;
        let file = File::create(path).with_context(|| format!("Failed to create {:?}", path))?;
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

        for (name, data) in &self.parts {
            zip.start_file(name.as_str(), options)?;
            zip.write_all(data)
                .with_context(|| format!("Failed to write package part {}", name))?;
        }
        zip.finish()?;
        Ok(())
    }
}
