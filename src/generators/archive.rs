use std::collections::HashSet;
use std::io::{Cursor, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::core::CertificateResult;

/// ZIP of single-page certificate PDFs, one entry per generated certificate.
pub struct ArchiveBuilder {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    options: FileOptions,
    names: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        ArchiveBuilder {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            options: FileOptions::default().compression_method(CompressionMethod::Deflated),
            names: HashSet::new(),
        }
    }

    pub fn entry_count(&self) -> usize {
        self.names.len()
    }

    /// Adds `{recipient}_{certificate_id}.pdf` and returns the name actually
    /// used; a repeated name gets a `_2`, `_3`, ... suffix.
    pub fn add_pdf(&mut self, recipient: &str, certificate_id: &str, bytes: &[u8]) -> CertificateResult<String> {
        let stem = format!(
            "{}_{}",
            sanitize_file_component(recipient),
            sanitize_file_component(certificate_id)
        );
        let name = self.unique_name(&stem);

        self.zip.start_file(name.as_str(), self.options)?;
        self.zip.write_all(bytes)?;
        self.names.insert(name.clone());
        Ok(name)
    }

    fn unique_name(&self, stem: &str) -> String {
        let first = format!("{}.pdf", stem);
        if !self.names.contains(&first) {
            return first;
        }
        (2..)
            .map(|n| format!("{}_{}.pdf", stem, n))
            .find(|candidate| !self.names.contains(candidate))
            .unwrap_or(first)
    }

    /// Archive bytes, `None` when nothing was added.
    pub fn finish(mut self) -> CertificateResult<Option<Vec<u8>>> {
        if self.names.is_empty() {
            return Ok(None);
        }
        let cursor = self.zip.finish()?;
        Ok(Some(cursor.into_inner()))
    }
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Makes a name safe as a file name component: whitespace becomes `_`,
/// path and shell metacharacters are dropped, letters of any script are kept.
pub fn sanitize_file_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.trim().chars() {
        if c.is_whitespace() {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') {
            out.push(c);
        }
    }
    let out = out.trim_matches(|c| c == '.' || c == '_').to_string();
    if out.is_empty() {
        "certificate".to_string()
    } else {
        out
    }
}
