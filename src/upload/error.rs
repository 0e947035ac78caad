use thiserror::Error;

/// Why a single file's upload failed.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    #[error("failed to read {name}: {source}")]
    Read {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid blob url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{}", rejected_message(.status, .code))]
    Rejected { status: u16, code: Option<String> },

    #[error("storage accepted the upload but returned no confirmation id")]
    MissingConfirmation,

    #[error("upload aborted")]
    Aborted,

    #[error("upload task failed: {0}")]
    TaskFailed(String),
}

fn rejected_message(status: &u16, code: &Option<String>) -> String {
    let hint = match *status {
        401 | 403 => " (the access token may be expired or lack write permission)",
        404 => " (container not found)",
        409 => " (blob already exists)",
        413 => " (file too large)",
        _ => "",
    };
    match code {
        Some(code) => format!("storage rejected upload with status {status}: {code}{hint}"),
        None => format!("storage rejected upload with status {status}{hint}"),
    }
}
