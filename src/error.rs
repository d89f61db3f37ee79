use std::fmt;

/// Errors surfaced while assembling a server list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Another server in the list already has this name.
    NameExists,
    /// Another server in the list already has this handle.
    HandleExists,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::NameExists => write!(f, "a server with this name already exists"),
            Self::HandleExists => write!(f, "a server with this handle already exists"),
        }
    }
}

impl std::error::Error for Error {}
