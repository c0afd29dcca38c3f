use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// RecordId
// ============================================================================

/// Identity of a record in the cache.
///
/// The server is the identifier authority. A record created optimistically
/// carries a locally generated `Pending` id until the authoritative reload
/// replaces it; `Pending` ids never reach the wire. Wire integers (and the
/// numeric strings PDO likes to emit) always deserialize to `Committed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordId {
    /// Locally generated temporary id for an optimistic create.
    Pending(u64),
    /// Server-assigned id.
    Committed(i64),
}

impl RecordId {
    /// The server id, if this record has been committed.
    pub fn committed(self) -> Option<i64> {
        match self {
            Self::Committed(id) => Some(id),
            Self::Pending(_) => None,
        }
    }

    pub fn is_pending(self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending(n) => write!(f, "pending:{n}"),
            Self::Committed(n) => write!(f, "{n}"),
        }
    }
}

impl From<i64> for RecordId {
    fn from(id: i64) -> Self {
        Self::Committed(id)
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Committed(id) => serializer.serialize_i64(*id),
            Self::Pending(n) => serializer.serialize_u64(*n),
        }
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Self::Committed(de::lenient_i64(deserializer)?))
    }
}

// ============================================================================
// StudentStatus
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StudentStatus {
    #[default]
    Active,
    Inactive,
    Graduated,
}

impl StudentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Graduated => "graduated",
        }
    }

    /// Human label used by rendering collaborators.
    pub fn label(self) -> &'static str {
        match self {
            Self::Active => "Activos",
            Self::Inactive => "Inactivos",
            Self::Graduated => "Graduados",
        }
    }

    /// Chart color used by rendering collaborators.
    pub fn color(self) -> &'static str {
        match self {
            Self::Active => "#10b981",
            Self::Inactive => "#f59e0b",
            Self::Graduated => "#3b82f6",
        }
    }
}

impl fmt::Display for StudentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Student
// ============================================================================

/// A roster record as held in the cache.
///
/// Wire keys are the upstream API's Spanish names. `read_one` returns a
/// partial shape (no grade/status for old rows), so everything beyond the
/// identity triple is defaulted on deserialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Student {
    pub id: RecordId,
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "carrera")]
    pub program: String,
    #[serde(default, deserialize_with = "de::lenient_opt_f64")]
    pub grade: Option<f64>,
    #[serde(default)]
    pub status: StudentStatus,
    #[serde(default, deserialize_with = "de::lenient_opt_i64")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of a create request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentDraft {
    #[serde(rename = "nombre")]
    pub name: String,
    pub email: String,
    #[serde(rename = "carrera")]
    pub program: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
}

/// Body of an update request. `None` fields are left untouched server-side
/// and by the optimistic cache patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StudentPatch {
    #[serde(rename = "nombre", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "carrera", skip_serializing_if = "Option::is_none")]
    pub program: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<StudentStatus>,
}

impl Student {
    /// Merge a patch into this record, field by field.
    pub fn apply_patch(&mut self, patch: &StudentPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(program) = &patch.program {
            self.program = program.clone();
        }
        if let Some(grade) = patch.grade {
            self.grade = Some(grade);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
    }
}

impl From<StudentDraft> for StudentPatch {
    fn from(draft: StudentDraft) -> Self {
        Self {
            name: Some(draft.name),
            email: Some(draft.email),
            program: Some(draft.program),
            grade: draft.grade,
            status: draft.status,
        }
    }
}

// ============================================================================
// Filters
// ============================================================================

/// Active list constraints. `None` means "no constraint" and the key is
/// omitted from the request entirely.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    pub search: Option<String>,
    pub status: Option<StudentStatus>,
    pub program: Option<String>,
    pub grade_min: Option<f64>,
    pub grade_max: Option<f64>,
}

impl FilterSet {
    pub fn is_empty(&self) -> bool {
        self.search.is_none()
            && self.status.is_none()
            && self.program.is_none()
            && self.grade_min.is_none()
            && self.grade_max.is_none()
    }

    /// Key/value pairs for the list query string, in wire naming.
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(program) = &self.program {
            params.push(("carrera", program.clone()));
        }
        if let Some(min) = self.grade_min {
            params.push(("grade_min", min.to_string()));
        }
        if let Some(max) = self.grade_max {
            params.push(("grade_max", max.to_string()));
        }
        params
    }
}

/// A full list request: the filter set plus the page window.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
    pub filters: FilterSet,
    pub page: u32,
    pub limit: u32,
}

// ============================================================================
// Pagination
// ============================================================================

/// Server-authoritative pagination metadata. The client never derives
/// `total_pages` from its own cache size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageInfo {
    #[serde(deserialize_with = "de::lenient_u64")]
    pub total: u64,
    #[serde(deserialize_with = "de::lenient_u32")]
    pub page: u32,
    #[serde(deserialize_with = "de::lenient_u32")]
    pub limit: u32,
    #[serde(deserialize_with = "de::lenient_u32")]
    pub total_pages: u32,
}

impl PageInfo {
    /// An empty result set at the given window.
    pub fn empty(page: u32, limit: u32) -> Self {
        Self {
            total: 0,
            page,
            limit,
            total_pages: 0,
        }
    }
}

// ============================================================================
// Response payloads
// ============================================================================

/// Successful list response: one page of records plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListPage {
    #[serde(rename = "estudiantes")]
    pub records: Vec<Student>,
    pub pagination: PageInfo,
    /// Server note for empty result sets ("no records matched the filters").
    #[serde(default)]
    pub message: Option<String>,
}

/// Acknowledgement body of a successful create/update/delete.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MutationAck {
    #[serde(default)]
    pub message: Option<String>,
}

/// Per-id failure inside a batch delete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDeleteError {
    #[serde(deserialize_with = "de::lenient_i64")]
    pub id: i64,
    pub error: String,
}

/// Outcome of a batch delete. The server deletes what it can and reports the
/// rest in `errors`; a partial result is still a success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchDeleteOutcome {
    #[serde(deserialize_with = "de::lenient_u64")]
    pub deleted: u64,
    #[serde(default)]
    pub deleted_ids: Vec<i64>,
    #[serde(default)]
    pub errors: Vec<BatchDeleteError>,
    #[serde(default)]
    pub message: Option<String>,
}

// ============================================================================
// Statistics
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    #[serde(deserialize_with = "de::lenient_u64")]
    pub total_students: u64,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub average_grade: f64,
    #[serde(deserialize_with = "de::lenient_u64")]
    pub active_students: u64,
    #[serde(default, deserialize_with = "de::lenient_opt_u64")]
    pub inactive_students: Option<u64>,
    #[serde(deserialize_with = "de::lenient_u64")]
    pub graduated_students: u64,
}

/// One chart datapoint: average grade and head count for a status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusAverage {
    pub status: StudentStatus,
    #[serde(deserialize_with = "de::lenient_f64")]
    pub avg_grade: f64,
    #[serde(deserialize_with = "de::lenient_u64")]
    pub count: u64,
}

/// Full statistics response: headline numbers plus the per-status chart feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    pub statistics: Statistics,
    #[serde(default)]
    pub averages_by_status: Vec<StatusAverage>,
}

// ============================================================================
// Lenient numeric deserialization
// ============================================================================

/// The upstream PHP layer rides on PDO, which returns every column as a
/// string. These helpers accept number-or-string (and null for the `opt`
/// variants) so wire types survive both shapes.
pub(crate) mod de {
    use serde::de::{Deserializer, Error, Unexpected};
    use serde_json::Value;

    use serde::Deserialize;

    fn as_f64(value: &Value) -> Option<f64> {
        match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    fn as_i64(value: &Value) -> Option<i64> {
        match value {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_f64(&value).ok_or_else(|| invalid(&value, "a number"))
    }

    pub fn lenient_i64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_i64(&value).ok_or_else(|| invalid(&value, "an integer"))
    }

    pub fn lenient_u64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_i64(&value)
            .and_then(|n| u64::try_from(n).ok())
            .ok_or_else(|| invalid(&value, "a non-negative integer"))
    }

    pub fn lenient_u32<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = Value::deserialize(deserializer)?;
        as_i64(&value)
            .and_then(|n| u32::try_from(n).ok())
            .ok_or_else(|| invalid(&value, "a non-negative integer"))
    }

    pub fn lenient_opt_f64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(None),
            other => as_f64(&other)
                .map(Some)
                .ok_or_else(|| invalid(&other, "a number or null")),
        }
    }

    pub fn lenient_opt_i64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(None),
            other => as_i64(&other)
                .map(Some)
                .ok_or_else(|| invalid(&other, "an integer or null")),
        }
    }

    pub fn lenient_opt_u64<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<u64>, D::Error> {
        let value = Value::deserialize(deserializer)?;
        match value {
            Value::Null => Ok(None),
            other => as_i64(&other)
                .and_then(|n| u64::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| invalid(&other, "a non-negative integer or null")),
        }
    }

    fn invalid<E: Error>(value: &Value, expected: &str) -> E {
        match value {
            Value::String(s) => E::invalid_value(Unexpected::Str(s), &expected),
            Value::Bool(b) => E::invalid_value(Unexpected::Bool(*b), &expected),
            Value::Null => E::invalid_value(Unexpected::Unit, &expected),
            _ => E::custom(format!("invalid value, expected {expected}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
