use std::sync::Arc;

/// Suffix an artifact producer appends to the file it writes, without the leading dot.
pub trait FileExtProvider {
    fn file_ext(&self) -> Option<Arc<str>>;
}
