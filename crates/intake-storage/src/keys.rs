//! Object key layout for registration documents.
//!
//! - plate documents: `uploads/{registrationId}/plates/{plateNumber}_{fileName}`
//! - general documents: `uploads/{registrationId}/general/{fileName}`, or
//!   `uploads/{registrationId}/general/{employerId}_{fileName}` for a company
//!
//! Keys are only as unique as the caller-supplied file name; a repeated name overwrites.

use crate::traits::{StorageError, StorageResult};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub const KEY_ROOT: &str = "uploads";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Plate,
    General,
}

impl FileType {
    fn directory(&self) -> &'static str {
        match self {
            FileType::Plate => "plates",
            FileType::General => "general",
        }
    }
}

impl FromStr for FileType {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "plate" => Ok(FileType::Plate),
            "general" => Ok(FileType::General),
            _ => Err(StorageError::InvalidArgument("Invalid fileType".to_string())),
        }
    }
}

impl Display for FileType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            FileType::Plate => write!(f, "plate"),
            FileType::General => write!(f, "general"),
        }
    }
}

/// A key broken back into its layout parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey<'a> {
    pub registration_id: &'a str,
    pub file_type: FileType,
    /// Last segment, including any `{discriminator}_` prefix
    pub file_name: &'a str,
}

/// Derive the object key for a document.
pub fn resolve_key(
    registration_id: &str,
    file_type: FileType,
    file_name: &str,
    employer_id: Option<&str>,
    plate_number: Option<&str>,
) -> StorageResult<String> {
    check_component("registerId", registration_id)?;
    check_component("fileName", file_name)?;

    let tail = match file_type {
        FileType::Plate => {
            let plate_number = plate_number.unwrap_or_default();
            check_component("plateNumber", plate_number)?;
            format!("{}_{}", plate_number, file_name)
        }
        FileType::General => match employer_id.filter(|id| !id.is_empty()) {
            Some(employer_id) => {
                check_component("employerId", employer_id)?;
                format!("{}_{}", employer_id, file_name)
            }
            None => file_name.to_string(),
        },
    };

    Ok(format!(
        "{}/{}/{}/{}",
        KEY_ROOT,
        registration_id,
        file_type.directory(),
        tail
    ))
}

/// Parse a key produced by [`resolve_key`]. Only the format is checked.
pub fn parse_key(key: &str) -> StorageResult<ParsedKey<'_>> {
    let invalid = || StorageError::InvalidKey(format!("{} does not follow the upload layout", key));

    let mut segments = key.split('/');
    let (root, registration_id, directory, file_name) = match (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) {
        (Some(root), Some(id), Some(directory), Some(name), None) => (root, id, directory, name),
        _ => return Err(invalid()),
    };

    if root != KEY_ROOT
        || !is_safe_component(registration_id)
        || !is_safe_component(file_name)
    {
        return Err(invalid());
    }

    let file_type = match directory {
        "plates" => FileType::Plate,
        "general" => FileType::General,
        _ => return Err(invalid()),
    };

    if file_type == FileType::Plate {
        match file_name.split_once('_') {
            Some((plate, name)) if !plate.is_empty() && !name.is_empty() => {}
            _ => return Err(invalid()),
        }
    }

    Ok(ParsedKey {
        registration_id,
        file_type,
        file_name,
    })
}

fn check_component(name: &str, value: &str) -> StorageResult<()> {
    if value.is_empty() {
        return Err(StorageError::InvalidArgument(format!("{} is required", name)));
    }
    if !is_safe_component(value) {
        return Err(StorageError::InvalidArgument(format!(
            "{} contains invalid characters",
            name
        )));
    }
    Ok(())
}

fn is_safe_component(value: &str) -> bool {
    !value.is_empty()
        && !value.contains('/')
        && !value.contains('\\')
        && !value.contains("..")
        && !value.chars().any(char::is_control)
}
