use std::fmt::{self, Display, Formatter};

use serde::{Serialize, Serializer};

/// One step of a response path: a response key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryPathSegment {
    Field(String),
    Index(usize),
}

impl Serialize for QueryPathSegment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            QueryPathSegment::Field(name) => serializer.serialize_str(name),
            QueryPathSegment::Index(index) => serializer.serialize_u64(*index as u64),
        }
    }
}

impl Display for QueryPathSegment {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            QueryPathSegment::Field(name) => f.write_str(name),
            QueryPathSegment::Index(index) => index.fmt(f),
        }
    }
}

/// The response path of the field currently being resolved, used to annotate
/// errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPath(Vec<QueryPathSegment>);

impl QueryPath {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A new path with `segment` appended; the receiver is untouched.
    #[must_use]
    pub fn child(&self, segment: impl Into<QueryPathSegment>) -> Self {
        let mut segments = self.0.clone();
        segments.push(segment.into());
        QueryPath(segments)
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryPathSegment> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_vec(&self) -> Vec<QueryPathSegment> {
        self.0.clone()
    }
}

impl From<&str> for QueryPathSegment {
    fn from(name: &str) -> Self {
        QueryPathSegment::Field(name.to_string())
    }
}

impl From<String> for QueryPathSegment {
    fn from(name: String) -> Self {
        QueryPathSegment::Field(name)
    }
}

impl From<usize> for QueryPathSegment {
    fn from(index: usize) -> Self {
        QueryPathSegment::Index(index)
    }
}

impl Display for QueryPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i != 0 {
                f.write_str(".")?;
            }
            segment.fmt(f)?;
        }
        Ok(())
    }
}
