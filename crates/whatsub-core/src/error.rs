use thiserror::Error;

#[derive(Error, Debug)]
pub enum WhatsubError {
    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{operation} failed with status {status}: {message}")]
    Api {
        operation: &'static str,
        status: u16,
        message: String,
    },

    #[error("{operation} returned an empty records envelope")]
    EmptyResponse { operation: &'static str },

    #[error("{operation} requires the {field} field")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },

    #[error("Invalid request descriptor: {reason}")]
    InvalidDescriptor { reason: String },

    #[error("Missing credential: {env_var} environment variable is not set")]
    MissingCredential { env_var: String },

    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WhatsubError>;
