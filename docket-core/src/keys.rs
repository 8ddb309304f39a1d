//! # Object keys
//!
//! Every participant in a submission shares one flat namespace with two key
//! families:
//!
//! - `uploads/<original filename>` is where the client writes the document.
//! - `results/<sanitized base name>_report.txt` is where the pipeline writes
//!   the report.
//!
//! There is no job table linking the two. The client and the pipeline each
//! derive the result key from the filename on their own, so both sides must
//! produce byte-identical output or the poller never finds the report.
//!
//! ```rust
//! use docket_core::keys::derive_result_key;
//!
//! assert_eq!(
//!     derive_result_key("My Contract v2.pdf"),
//!     "results/MyContractv2_report.txt"
//! );
//! ```

/// Prefix for documents written by clients.
pub const UPLOAD_PREFIX: &str = "uploads/";

/// Prefix for reports written by the analysis pipeline.
pub const RESULT_PREFIX: &str = "results/";

/// Suffix appended to the sanitized base name of every report.
pub const RESULT_SUFFIX: &str = "_report.txt";

/// Key the client uploads `filename` to.
pub fn upload_key(filename: &str) -> String {
    format!("{UPLOAD_PREFIX}{filename}")
}

/// Strip the final extension, then every whitespace character, then every
/// character outside `[A-Za-z0-9_-]`.
///
/// May return an empty string.
pub fn sanitize_base_name(filename: &str) -> String {
    strip_extension(filename)
        .chars()
        .filter(|c| !c.is_whitespace())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-')
        .collect()
}

/// Key of the report produced for `original_filename`.
///
/// Never fails: a name that sanitizes to nothing maps to `results/_report.txt`.
pub fn derive_result_key(original_filename: &str) -> String {
    format!(
        "{RESULT_PREFIX}{}{RESULT_SUFFIX}",
        sanitize_base_name(original_filename)
    )
}

/// Pipeline-side derivation: map an upload key back to its report key.
///
/// Returns `None` for keys outside the upload family.
pub fn result_key_for_upload_key(upload_key: &str) -> Option<String> {
    upload_key
        .strip_prefix(UPLOAD_PREFIX)
        .map(derive_result_key)
}

// An extension is a dot followed by at least one character, none of which is
// a dot or a slash, running to the end of the name.
fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(idx) => {
            let ext = &name[idx + 1..];
            if ext.is_empty() || ext.contains('/') {
                name
            } else {
                &name[..idx]
            }
        }
        None => name,
    }
}
