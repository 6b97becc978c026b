use std::fmt;
use thiserror::Error as ThisError;

///
/// ExpandError
///
/// Enumeration failure surfaced at the point the offending element would
/// have been produced. Expansion is deterministic; a given tree either
/// fully enumerates or fails at a reproducible position.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ExpandError {
    #[error("{0}")]
    Collision(#[from] CollisionError),

    #[error("{0}")]
    Shape(#[from] ShapeError),

    #[error("zip children disagree on extension length at position {position}")]
    LengthMismatch { position: usize },
}

///
/// CollisionError
///
/// Two values for the same merge point cannot combine: no protocol match,
/// or one side rejects further combination. `key` is absent when the
/// collision happens between whole items (product/zip of non-record
/// children) rather than under a record key.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CollisionError {
    NoProtocol {
        key: Option<String>,
        existing: String,
        incoming: String,
    },
    Finalized {
        key: Option<String>,
    },
    NotARecord {
        key: Option<String>,
        incoming: String,
    },
}

fn at_key(f: &mut fmt::Formatter<'_>, key: Option<&str>) -> fmt::Result {
    match key {
        Some(key) => write!(f, " for key `{key}`"),
        None => Ok(()),
    }
}

impl fmt::Display for CollisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoProtocol {
                key,
                existing,
                incoming,
            } => {
                write!(f, "no combine protocol")?;
                at_key(f, key.as_deref())?;
                write!(f, ": cannot combine {existing} with {incoming}")
            }
            Self::Finalized { key } => {
                write!(f, "record already finalized")?;
                at_key(f, key.as_deref())?;
                write!(f, ": rejects further combine")
            }
            Self::NotARecord { key, incoming } => {
                write!(f, "cannot merge non-record value {incoming} into a record")?;
                at_key(f, key.as_deref())
            }
        }
    }
}

impl std::error::Error for CollisionError {}

///
/// ShapeError
///
/// Structurally malformed input caught by the enumeration engine.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ShapeError {
    /// A raw-mode transform emitted an output containing an unexpanded node.
    RawTransformNode,
    /// An unexpanded node reached materialization.
    UnexpandedNode,
}

impl fmt::Display for ShapeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawTransformNode => {
                write!(f, "raw transform output contains an unexpanded node")
            }
            Self::UnexpandedNode => write!(f, "unexpanded node reached materialization"),
        }
    }
}

impl std::error::Error for ShapeError {}
