use std::fmt::Formatter;

#[derive(Debug, PartialEq)]
pub enum CardFetchError {
    ErrorCreatingDestinationDirectory(String),
    /// parameters are file path, additional error message
    FileOperationError {
        file_name: String,
        message: String,
    },
    /// A media page lacks the full image link container or its anchor.
    /// Only raised when the rule asks to abort on missing markup.
    MissingMarkup {
        url: String,
    },
    InvalidUrl(String),
    ClientBuildError(String),
}

impl std::fmt::Display for CardFetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            CardFetchError::ErrorCreatingDestinationDirectory(err) => {
                format!("error creating destination directory. {err}")
            }
            CardFetchError::FileOperationError { file_name, message } => {
                format!("{message} : {file_name}")
            }
            CardFetchError::MissingMarkup { url } => {
                format!("full image link not found on media page {url}")
            }
            CardFetchError::InvalidUrl(url) => format!("Invalid url received : {url}"),
            CardFetchError::ClientBuildError(err) => {
                format!("error building http client. {err}")
            }
        };
        write!(f, "{str}")
    }
}

impl std::error::Error for CardFetchError {}
