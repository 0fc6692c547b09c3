pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid mind map document: {0}")]
	Document(#[from] serde_json::Error),

	#[error("Cannot delete `{id}`: at least one connection type must remain")]
	LastConnectionType { id: String },

	#[error("Unknown connection type: {id}")]
	UnknownConnectionType { id: String },

	#[error("Unknown node: {id}")]
	UnknownNode { id: String },

	#[error("A `{kind}` connection already exists between `{from}` and `{to}`")]
	DuplicateConnection {
		kind: String,
		from: String,
		to: String,
	},

	#[error("Invalid visualization config: {message}")]
	Config { message: String },
}
