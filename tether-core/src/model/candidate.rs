use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const FIELD_SEPARATOR: char = '|';

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CandidateParseError {
    #[error("candidate is missing the {0} field")]
    MissingField(&'static str),
    #[error("invalid media line index '{0}'")]
    InvalidIndex(String),
}

/// A reachability candidate as it travels over the relay.
///
/// The wire form is `content|media-line-index|media-id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IceCandidate {
    pub content: String,
    pub sdp_mline_index: u16,
    pub sdp_mid: String,
}

impl IceCandidate {
    pub fn new(content: impl Into<String>, sdp_mline_index: u16, sdp_mid: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            sdp_mline_index,
            sdp_mid: sdp_mid.into(),
        }
    }

    pub fn encode(&self) -> String {
        format!(
            "{}{sep}{}{sep}{}",
            self.content,
            self.sdp_mline_index,
            self.sdp_mid,
            sep = FIELD_SEPARATOR
        )
    }
}

impl fmt::Display for IceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for IceCandidate {
    type Err = CandidateParseError;

    // Split from the right: the media id and index never contain the separator,
    // the candidate content might.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.rsplitn(3, FIELD_SEPARATOR);
        let sdp_mid = parts.next().ok_or(CandidateParseError::MissingField("media id"))?;
        let index = parts
            .next()
            .ok_or(CandidateParseError::MissingField("media line index"))?;
        let content = parts.next().ok_or(CandidateParseError::MissingField("content"))?;

        let sdp_mline_index = index
            .trim()
            .parse::<u16>()
            .map_err(|_| CandidateParseError::InvalidIndex(index.to_owned()))?;

        Ok(Self {
            content: content.to_owned(),
            sdp_mline_index,
            sdp_mid: sdp_mid.to_owned(),
        })
    }
}
