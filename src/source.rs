use std::fmt;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::JutError;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the notebook bytes come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContentSource {
    File(PathBuf),
    Url(String),
    Stdin,
}

impl ContentSource {
    /// `-` reads stdin, `http(s)://` fetches, anything else is a path.
    pub fn from_arg(arg: &str) -> Self {
        if arg == "-" {
            Self::Stdin
        } else if arg.starts_with("http://") || arg.starts_with("https://") {
            Self::Url(arg.to_string())
        } else {
            Self::File(PathBuf::from(arg))
        }
    }

    pub fn load(&self) -> Result<Vec<u8>, JutError> {
        let bytes = match self {
            Self::File(path) => {
                fs::read(path).map_err(|err| JutError::source_unavailable(self.to_string(), err))?
            }
            Self::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .read_to_end(&mut buf)
                    .map_err(|err| JutError::source_unavailable(self.to_string(), err))?;
                buf
            }
            Self::Url(url) => fetch(url)?,
        };
        tracing::debug!(source = %self, bytes = bytes.len(), "loaded notebook");
        Ok(bytes)
    }
}

impl fmt::Display for ContentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
            Self::Stdin => f.write_str("<stdin>"),
        }
    }
}

fn fetch(url: &str) -> Result<Vec<u8>, JutError> {
    let agent = ureq::AgentBuilder::new().timeout(FETCH_TIMEOUT).build();
    tracing::debug!(url, "fetching notebook");

    let response = agent.get(url).call().map_err(|err| match err {
        ureq::Error::Status(code, response) => JutError::source_unavailable(
            url,
            format!("HTTP {code} {}", response.status_text()),
        ),
        ureq::Error::Transport(transport) => JutError::source_unavailable(url, transport),
    })?;

    let mut buf = Vec::new();
    response
        .into_reader()
        .read_to_end(&mut buf)
        .map_err(|err| JutError::source_unavailable(url, err))?;
    Ok(buf)
}
