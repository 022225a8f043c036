pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
	#[error("Invalid input: {message}")]
	InvalidInput { message: String },
	#[error("Unsatisfiable constraints: {message}")]
	Unsatisfiable { message: String },
}
