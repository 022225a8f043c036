pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Unsatisfiable constraints: {message}")]
	Unsatisfiable { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl From<seat_domain::Error> for Error {
	fn from(err: seat_domain::Error) -> Self {
		match err {
			seat_domain::Error::InvalidInput { message } => Self::InvalidRequest { message },
			seat_domain::Error::Unsatisfiable { message } => Self::Unsatisfiable { message },
		}
	}
}

impl From<seat_providers::Error> for Error {
	fn from(err: seat_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
