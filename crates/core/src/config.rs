//! Options controlling how a document is opened.

/// How the document loader reacts to a damaged cross-reference chain.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RecoveryPolicy {
    /// Rebuild the object table by scanning the file for `n g obj` headers.
    #[default]
    Lenient,
    /// Fail with [`PdfError::BrokenXRef`](crate::PdfError::BrokenXRef).
    Strict,
}

/// Default number of resolved objects kept in the per-document cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 1024;

/// Options for [`PDFDocument::open_with`](crate::document::PDFDocument::open_with).
///
/// # Example
/// ```
/// use quire_core::config::{OpenOptions, RecoveryPolicy};
///
/// let options = OpenOptions::new()
///     .password("secret")
///     .recovery(RecoveryPolicy::Strict)
///     .cache_capacity(256);
/// assert_eq!(options.cache_capacity, 256);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenOptions {
    /// Password tried (user, then owner) while opening an encrypted file.
    pub password: Option<String>,
    /// Strict or recovering cross-reference loading.
    pub recovery: RecoveryPolicy,
    /// Capacity of the resolved-object cache. 0 disables memoization.
    pub cache_capacity: usize,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            password: None,
            recovery: RecoveryPolicy::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlock the document with this password during open.
    pub fn password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn recovery(mut self, policy: RecoveryPolicy) -> Self {
        self.recovery = policy;
        self
    }

    pub fn cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    pub(crate) fn allows_recovery(&self) -> bool {
        self.recovery == RecoveryPolicy::Lenient
    }
}
