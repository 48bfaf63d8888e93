/// Placeholder key for blank or whitespace-only categorical cells.
pub const BLANK_SENTINEL: &str = "(blank)";

/// One normalized register entry. Categorical fields are never empty (blank
/// source cells become [`BLANK_SENTINEL`]); `application_key` stays empty when
/// the source cell was blank, which marks the row as a draft without identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub ou0: String,
    pub ou1: String,
    pub ou2: String,
    pub application_key: String,
    pub status: String,
}

impl Row {
    /// Rows without an application key carry no identity and are excluded
    /// from every count.
    pub fn is_trackable(&self) -> bool {
        !self.application_key.is_empty()
    }
}

/// Folds a name for case/whitespace-insensitive comparison: trims, collapses
/// internal whitespace runs to a single space, lower-cases.
pub fn fold_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending_space = false;
    for part in name.split_whitespace() {
        if pending_space {
            out.push(' ');
        }
        for ch in part.chars() {
            out.extend(ch.to_lowercase());
        }
        pending_space = true;
    }
    out
}

pub fn normalize_category(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        BLANK_SENTINEL.to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn normalize_identifier(raw: &str) -> String {
    raw.trim().to_string()
}
