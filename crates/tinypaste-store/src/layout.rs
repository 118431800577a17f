//! On-disk naming for the data directory.
//!
//! Pastes are stored as `{id}.paste`; static assets keep their own names.
//! Temporaries start with a dot so they can never be addressed by a
//! request path.

/// Suffix appended to every paste identifier on disk.
pub const PASTE_SUFFIX: &str = ".paste";

/// Prefix for in-flight writes awaiting publication.
pub const INCOMING_PREFIX: &str = ".incoming-";

/// File name holding the paste with the given identifier.
pub fn paste_file_name(id: &str) -> String {
    format!("{id}{PASTE_SUFFIX}")
}

/// Content type for a static asset, derived from the text after its last `.`.
///
/// Names without a `.` have no inferable type.
pub fn content_type_for(name: &str) -> Option<String> {
    let (_, ext) = name.rsplit_once('.')?;
    Some(format!("text/{ext}"))
}
