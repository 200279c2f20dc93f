//! Wire shapes for the Sourcify file-listing and verification-status
//! endpoints.

use serde::Deserialize;

use crate::error::SourcifyError;

#[derive(Debug, Clone, Deserialize)]
pub struct SourcifyFile {
    pub name: String,
    pub content: String,
}

/// `GET /files/any/{chain_id}/{address}` replies either `{files: [...]}`
/// or a bare array of files — accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FilesResponse {
    Wrapped { files: Vec<SourcifyFile> },
    Bare(Vec<SourcifyFile>),
}

impl FilesResponse {
    pub fn into_files(self) -> Vec<SourcifyFile> {
        match self {
            FilesResponse::Wrapped { files } => files,
            FilesResponse::Bare(files) => files,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    Full,
    Partial,
    NotVerified,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckAllEntry {
    #[serde(default)]
    pub status: Option<String>,
}

/// ABI extraction order from the spec: prefer a `*metadata.json` file's
/// `output.abi` (falling back to a bare top-level `abi` key), then any
/// `*.abi.json`/`abi.json` file taken whole, else give up.
///
/// Parsed untyped rather than into a `output: Option<MetadataOutput>`
/// struct: a metadata document can have an `output` object present but
/// missing its own `abi` key, and a typed struct would reject that shape
/// outright (missing-field error) instead of falling through to the
/// top-level `abi` key the way the spec's extraction order requires.
pub fn extract_abi(files: &[SourcifyFile]) -> Result<String, SourcifyError> {
    if let Some(file) = files.iter().find(|f| f.name.ends_with("metadata.json")) {
        let doc: serde_json::Value =
            serde_json::from_str(&file.content).map_err(|_| SourcifyError::InvalidMetadata)?;
        let abi = doc
            .pointer("/output/abi")
            .or_else(|| doc.get("abi"))
            .ok_or(SourcifyError::InvalidMetadata)?;
        return serde_json::to_string(abi).map_err(|_| SourcifyError::InvalidMetadata);
    }
    if let Some(file) = files
        .iter()
        .find(|f| f.name.ends_with(".abi.json") || f.name == "abi.json")
    {
        let value: serde_json::Value =
            serde_json::from_str(&file.content).map_err(|_| SourcifyError::NoAbiFound)?;
        return serde_json::to_string(&value).map_err(|_| SourcifyError::NoAbiFound);
    }
    Err(SourcifyError::NoAbiFound)
}
