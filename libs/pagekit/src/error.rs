use thiserror::Error;

/// Library-local result type.
pub type Result<T> = std::result::Result<T, PagingError>;

/// Usage errors raised by the pagination layer itself.
///
/// Errors coming from query execution are never wrapped here; a relation's
/// own error type carries them and must be able to absorb a `PagingError`.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PagingError {
    #[error(
        "This scope is marked as a non-count paginable scope and can't be used in combination \
         with `paginate` or `page_entries_info`. Use `link_to_next_page` or \
         `link_to_previous_page` instead."
    )]
    CountUnsupported,

    #[error("page arithmetic requires a non-zero limit (per-page value)")]
    ZeroPerPage,
}
