//! Page logic behind each command: load, filter, validate, write.
//!
//! Services work for an already-gated [`Viewer`](crate::session::Viewer) and
//! return `DeskError`; the command layer turns that into page results.

pub mod dashboard;
pub mod leads;
pub mod reminders;
pub mod settings;
pub mod team;

/// Trim a form field, mapping blank input to `None`.
pub(crate) fn optional_field(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
