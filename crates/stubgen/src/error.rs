use thiserror::Error;

#[derive(Error, Debug)]
pub enum StubError {
    #[error("{service} has no operation a client stub can call")]
    Empty { service: String },

    #[error("Generated client for {service} is not valid Rust: {source}")]
    Syntax {
        service: String,
        #[source]
        source: syn::Error,
    },
}

pub type StubResult<T> = Result<T, StubError>;
