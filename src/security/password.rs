//! Password hashing.
//!
//! bcrypt is CPU bound, so both operations run on the blocking pool instead of
//! stalling the request's worker thread.

use crate::error::HandlerError;

pub async fn hash(password: String, cost: u32) -> Result<String, HandlerError> {
    let hashed = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hashed)
}

pub async fn verify(password: String, hashed: String) -> Result<bool, HandlerError> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hashed)).await??;
    Ok(matches)
}
