use smarty_domain::writegate::RejectCode;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unauthorized: {message}")]
	Unauthorized { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Embedding unavailable: {message}")]
	EmbeddingUnavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Vector index error: {message}")]
	VectorIndex { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<smarty_storage::Error> for Error {
	fn from(err: smarty_storage::Error) -> Self {
		match err {
			smarty_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			smarty_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			smarty_storage::Error::Qdrant(inner) =>
				Self::VectorIndex { message: inner.to_string() },
		}
	}
}

impl From<smarty_providers::Error> for Error {
	fn from(err: smarty_providers::Error) -> Self {
		Self::EmbeddingUnavailable { message: err.to_string() }
	}
}

impl From<RejectCode> for Error {
	fn from(code: RejectCode) -> Self {
		let message = code.message().to_string();

		match code {
			RejectCode::RejectEmptyOwner => Self::Unauthorized { message },
			RejectCode::RejectEmptyTitle
			| RejectCode::RejectEmptyCategoryName
			| RejectCode::RejectEmptyQuery => Self::InvalidRequest { message },
		}
	}
}
