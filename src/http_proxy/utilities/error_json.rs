use nullnet_liberror::Error;
use serde::Serialize;

#[derive(Serialize, Debug)]
pub struct ErrorJson {
    error: String,
}

impl From<&str> for ErrorJson {
    fn from(value: &str) -> Self {
        Self {
            error: value.to_string(),
        }
    }
}

impl From<String> for ErrorJson {
    fn from(error: String) -> Self {
        Self { error }
    }
}

impl From<Error> for ErrorJson {
    fn from(value: Error) -> Self {
        Self::from(value.to_str())
    }
}
