use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorSource {
    Upstream,
    Downstream,
}

impl fmt::Display for ServiceErrorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceErrorSource::Upstream => write!(f, "Upstream"),
            ServiceErrorSource::Downstream => write!(f, "Downstream"),
        }
    }
}

impl Error for ServiceErrorSource {}

pub trait HasServiceErrorSource {
    fn get_service_error_source(&self) -> ServiceErrorSource;
}
