pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Retrieval failed: {message}")]
	Retrieval { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<nearby_storage::Error> for Error {
	fn from(err: nearby_storage::Error) -> Self {
		match err {
			nearby_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			nearby_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			nearby_storage::Error::InvalidData(message) => Self::Storage { message },
		}
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Retrieval { message: format!("Sub-query task failed: {err}.") }
	}
}
