//! Object addressing: identifiers, logical paths, principals and the
//! visibility/permission enums the access check is expressed in.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::constants::{MAX_OBJECT_ID_LEN, OBJECTS_PREFIX};
use crate::error::AppError;

/// Opaque, globally unique name of one stored blob.
///
/// Minted once by the upload grant issuer and never changed afterwards. Only
/// `[A-Za-z0-9_-]` is accepted so an identifier can never address anything
/// outside its own directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ObjectId(String);

impl ObjectId {
    /// Mint a fresh identifier.
    pub fn generate() -> Self {
        ObjectId(Uuid::new_v4().to_string())
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.is_empty() || raw.len() > MAX_OBJECT_ID_LEN {
            return Err(AppError::InvalidInput(format!(
                "Object id must be between 1 and {} characters",
                MAX_OBJECT_ID_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(AppError::InvalidInput(
                "Object id contains invalid characters".to_string(),
            ));
        }
        Ok(ObjectId(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ObjectId {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ObjectId::parse(&value)
    }
}

impl From<ObjectId> for String {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl FromStr for ObjectId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ObjectId::parse(s)
    }
}

impl Display for ObjectId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Authenticated identity a request acts on behalf of.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrincipalId(String);

impl PrincipalId {
    pub fn new(id: impl Into<String>) -> Self {
        PrincipalId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for PrincipalId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl From<&str> for PrincipalId {
    fn from(value: &str) -> Self {
        PrincipalId(value.to_string())
    }
}

/// Externally visible object address, always under `/objects/`.
///
/// Physical layout below the private root never leaks through this type; it
/// only carries the relative suffix.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LogicalPath(String);

impl LogicalPath {
    /// Build a logical path from a suffix relative to the private root.
    pub fn from_relative(relative: &str) -> Self {
        LogicalPath(format!(
            "{}{}",
            OBJECTS_PREFIX,
            relative.trim_start_matches('/')
        ))
    }

    /// Parse a caller-supplied path. Accepts `/objects/...` with or without the
    /// leading slash.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = if raw.starts_with('/') {
            raw.to_string()
        } else {
            format!("/{}", raw)
        };
        let relative = normalized.strip_prefix(OBJECTS_PREFIX).ok_or_else(|| {
            AppError::InvalidInput(format!("Object path must start with {}", OBJECTS_PREFIX))
        })?;
        if relative.trim_matches('/').is_empty() {
            return Err(AppError::InvalidInput("Object path is empty".to_string()));
        }
        Ok(LogicalPath(normalized))
    }

    /// The suffix after the namespace marker.
    pub fn relative(&self) -> &str {
        self.0
            .strip_prefix(OBJECTS_PREFIX)
            .unwrap_or(self.0.as_str())
    }

    /// Identifier of the object this path names: its final segment.
    pub fn object_id(&self) -> Result<ObjectId, AppError> {
        let last = self
            .relative()
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default();
        ObjectId::parse(last)
            .map_err(|_| AppError::NotFound("Object not found".to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LogicalPath {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        LogicalPath::parse(&value)
    }
}

impl From<LogicalPath> for String {
    fn from(path: LogicalPath) -> Self {
        path.0
    }
}

impl Display for LogicalPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

/// Who may read an object besides its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
}

impl FromStr for Visibility {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(Visibility::Public),
            "private" => Ok(Visibility::Private),
            _ => Err(AppError::InvalidInput(format!("Invalid visibility: {}", s))),
        }
    }
}

impl Display for Visibility {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Visibility::Public => write!(f, "public"),
            Visibility::Private => write!(f, "private"),
        }
    }
}

/// Capability requested against an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    /// View or download.
    Read,
    /// Replace or delete.
    Write,
}

impl Permission {
    /// Whether holding `self` also satisfies a request for `requested`.
    pub fn covers(self, requested: Permission) -> bool {
        match self {
            Permission::Write => true,
            Permission::Read => requested == Permission::Read,
        }
    }
}

impl FromStr for Permission {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "read" => Ok(Permission::Read),
            "write" => Ok(Permission::Write),
            _ => Err(AppError::InvalidInput(format!("Invalid permission: {}", s))),
        }
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Permission::Read => write!(f, "read"),
            Permission::Write => write!(f, "write"),
        }
    }
}
