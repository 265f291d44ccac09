use serde::Serialize;

/// Envelope for every successful API body: `{ "data": ... }`.
///
/// Error bodies use [`crate::error::AppError`] instead.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
