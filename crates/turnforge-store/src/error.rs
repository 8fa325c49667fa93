/// Errors raised by store and cache collaborators.
///
/// These are infrastructure failures. The session layer never retries
/// them; it aborts the enclosing transaction and hands them to the caller.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write collided with an existing primary key.
    #[error("conflict: {0}")]
    Conflict(String),

    /// An update targeted a row that no longer exists (e.g. it was
    /// purged by the expiry sweep while the transaction was open).
    #[error("row {0} no longer exists")]
    RowMissing(turnforge_protocol::Id),
}
