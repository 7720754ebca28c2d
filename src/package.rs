//! Packaging of generated HTML into a portable document.
//!
//! Placeholder `src="asset://…"` references are rewritten to `images/NAME`, the
//! fragment is wrapped into a standalone HTML page and written together with
//! the image assets as `index.html` plus an `images/` folder, either into a
//! zip archive or a directory.

use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::generate::{GenerationResult, ASSET_SCHEME};

/// Name of the HTML entry in a package.
pub const INDEX_FILE: &str = "index.html";

/// Folder holding image assets in a package.
pub const IMAGE_DIR: &str = "images";

/// Writes named files into a single archive blob.
pub trait Archiver {
    /// Archive `entries` (`path`, `bytes`) in the given order.
    fn archive(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>>;
}

/// Zip archiver. PNG assets are stored, everything else is deflated.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZipArchiver;

impl Archiver for ZipArchiver {
    fn archive(&self, entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, data) in entries {
            let method = if name.ends_with(".png") {
                CompressionMethod::Stored
            } else {
                CompressionMethod::Deflated
            };
            zip.start_file(name.as_str(), SimpleFileOptions::default().compression_method(method))?;
            zip.write_all(data)?;
        }
        Ok(zip.finish()?.into_inner())
    }
}

/// A generation result ready to be written out.
#[derive(Debug, Clone)]
pub struct Package<'a> {
    result: &'a GenerationResult,
    title: String,
    generated_at: DateTime<Utc>,
}

impl<'a> Package<'a> {
    /// Package `result` under the document title `title`, stamped now.
    pub fn new(result: &'a GenerationResult, title: impl Into<String>) -> Self {
        Self {
            result,
            title: title.into(),
            generated_at: Utc::now(),
        }
    }

    /// Override the generation timestamp.
    pub fn with_timestamp(mut self, generated_at: DateTime<Utc>) -> Self {
        self.generated_at = generated_at;
        self
    }

    /// Standalone HTML page with relinked image references.
    pub fn index_html(&self) -> String {
        let mut out = String::new();
        out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        out.push_str(&format!(
            "<meta name=\"generator\" content=\"relayout {}\">\n",
            crate::VERSION
        ));
        out.push_str(&format!(
            "<meta name=\"created\" content=\"{}\">\n",
            self.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        out.push_str(&format!(
            "<title>{}</title>\n",
            html_escape::encode_text(&self.title)
        ));
        out.push_str("</head>\n<body>\n");
        out.push_str(&relink_assets(&self.result.html));
        out.push_str("</body>\n</html>\n");
        out
    }

    /// All package files: `index.html` first, then assets in emission order.
    pub fn entries(&self) -> Vec<(String, Vec<u8>)> {
        let mut entries = Vec::with_capacity(self.result.assets.len() + 1);
        entries.push((INDEX_FILE.to_string(), self.index_html().into_bytes()));
        for asset in &self.result.assets {
            entries.push((format!("{}/{}", IMAGE_DIR, asset.name), asset.data.clone()));
        }
        entries
    }

    /// Archive the package with `archiver`.
    pub fn archive(&self, archiver: &dyn Archiver) -> Result<Vec<u8>> {
        archiver.archive(&self.entries())
    }

    /// Write the package as a zip file.
    pub fn write_zip(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.archive(&ZipArchiver)?)?;
        Ok(())
    }

    /// Write the package into `dir` (created if missing).
    pub fn write_dir(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir.join(IMAGE_DIR))?;
        for (name, data) in self.entries() {
            fs::write(dir.join(name), data)?;
        }
        log::debug!(
            "Wrote {} and {} images to {}",
            INDEX_FILE,
            self.result.assets.len(),
            dir.display()
        );
        Ok(())
    }
}

/// Package a generation result with `archiver`.
pub fn package_document(
    result: &GenerationResult,
    name: &str,
    archiver: &dyn Archiver,
) -> Result<Vec<u8>> {
    Package::new(result, name).archive(archiver)
}

/// Rewrite `src="asset://NAME"` attributes to `src="images/NAME"`.
///
/// Only `<img>` sources are touched. Paragraph text has `<` escaped, so
/// `asset://` written in the document text is left alone.
pub fn relink_assets(html: &str) -> String {
    static ASSET_REF: OnceLock<Regex> = OnceLock::new();
    let re = ASSET_REF.get_or_init(|| {
        Regex::new(&format!(
            r#"(<img src="){}([^"]+)""#,
            regex::escape(ASSET_SCHEME)
        ))
        .unwrap()
    });
    re.replace_all(html, format!("${{1}}{}/${{2}}\"", IMAGE_DIR).as_str())
        .into_owned()
}
