//! Structural checks for labels and encoded names.

use crate::error::{CoreError, Result};

/// Longest label the wire encoding can carry (one length byte).
pub const MAX_LABEL_LEN: usize = 255;

/// Longest encoded name accepted at the serialization boundary.
pub const MAX_WIRE_LEN: usize = 1024;

/// Validate a single label's length.
pub fn validate_label(label: &[u8]) -> Result<()> {
    if label.is_empty() {
        return Err(CoreError::LabelTooShort);
    }
    if label.len() > MAX_LABEL_LEN {
        return Err(CoreError::LabelTooLong(label.len()));
    }
    Ok(())
}

/// Validate a label supplied as text.
///
/// Text labels additionally may not contain the separator, otherwise
/// `"a.b"` would silently denote two labels.
pub fn validate_text_label(label: &str) -> Result<()> {
    validate_label(label.as_bytes())?;
    if label.contains('.') {
        return Err(CoreError::IncompatibleName(format!(
            "label {:?} contains a separator",
            label
        )));
    }
    Ok(())
}
