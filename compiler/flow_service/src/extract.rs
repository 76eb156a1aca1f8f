//! Materialisation of embedded spec files onto disk.
//!
//! A service's interface spec ships inside the compiler binary as an
//! embedded bundle. Before code generation the spec files are copied into
//! the service's spec directory, file by file, leaving any file that
//! already exists untouched — extraction is idempotent per
//! `(directory, file)` pair. This is the only I/O surface of the crate and
//! it runs strictly outside the lowering pass.

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use thiserror::Error;

use crate::{Service, ServiceSpec};

/// Copy buffer size for extraction.
const COPY_BUF: usize = 8 * 1024;

/// Extraction failure.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The bundle has no resource with the requested name.
    #[error("resource `{name}` not found in the embedded bundle")]
    NotFound { name: String },

    /// Underlying I/O failure, surfaced unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A named set of byte streams the spec files are read from.
pub trait ResourceBundle {
    /// Open the resource with the given name.
    fn open<'a>(&'a self, name: &str) -> Result<Box<dyn Read + 'a>, ExtractError>;
}

/// Bundle over a static table, as produced by `include_bytes!` entries
/// compiled into the binary.
pub struct EmbeddedBundle {
    entries: &'static [(&'static str, &'static [u8])],
}

impl EmbeddedBundle {
    pub const fn new(entries: &'static [(&'static str, &'static [u8])]) -> Self {
        Self { entries }
    }
}

impl ResourceBundle for EmbeddedBundle {
    fn open<'a>(&'a self, name: &str) -> Result<Box<dyn Read + 'a>, ExtractError> {
        self.entries
            .iter()
            .find(|(entry, _)| *entry == name)
            .map(|&(_, bytes)| Box::new(bytes) as Box<dyn Read>)
            .ok_or_else(|| ExtractError::NotFound { name: name.to_owned() })
    }
}

/// Extract a service's spec files into the working directory.
///
/// If the spec's directory is already set the spec is returned unchanged.
/// Otherwise the directory becomes `"."` and the main spec file plus every
/// referenced file is materialised from the bundle; files already on disk
/// are left as they are.
pub fn extract_spec<'a, B: ResourceBundle>(
    service: &'a mut Service,
    bundle: &B,
) -> Result<&'a ServiceSpec, ExtractError> {
    extract_spec_into(service, bundle, Path::new("."))
}

/// [`extract_spec`] with an explicit target directory.
///
/// Same contract: a spec whose directory is already set is returned
/// untouched; otherwise its directory becomes `directory`.
pub fn extract_spec_into<'a, B: ResourceBundle>(
    service: &'a mut Service,
    bundle: &B,
    directory: &Path,
) -> Result<&'a ServiceSpec, ExtractError> {
    if !service.spec.directory.is_empty() {
        return Ok(&service.spec);
    }
    service.spec.directory = directory.display().to_string();

    let spec = &service.spec;
    let files =
        std::iter::once(&spec.main_spec_file).chain(spec.referenced_spec_files.iter());
    for file in files {
        let target = directory.join(file);
        if target.exists() {
            tracing::debug!(file = %file, "spec file already present, leaving it");
            continue;
        }
        let reader = bundle.open(file)?;
        let mut reader = BufReader::with_capacity(COPY_BUF, reader);
        let mut out = File::create(&target)?;
        io::copy(&mut reader, &mut out)?;
        tracing::debug!(file = %file, dir = %spec.directory, "extracted spec file");
    }

    Ok(&service.spec)
}
