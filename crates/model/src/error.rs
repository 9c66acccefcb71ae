use std::fmt;

#[derive(Debug)]
pub enum ModelError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Scenario structure error (bad cost-reduction or program-cost form,
    /// missing post-acute section, unknown category in an override).
    ConfigValidation(String),
    /// A global assumption outside its sane bound.
    InvalidAssumption {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// A category field outside its sane bound.
    InvalidCategory {
        name: String,
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// Missing column in a volume CSV.
    MissingColumn { column: &'static str },
    /// Volume CSV value parse error.
    VolumeParse { record: String, value: String },
    /// IO error surfaced by a reader.
    Io(String),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "scenario parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "scenario validation error: {msg}"),
            Self::InvalidAssumption { field, value, reason } => {
                write!(f, "assumption '{field}' = {value}: {reason}")
            }
            Self::InvalidCategory { name, field, value, reason } => {
                write!(f, "category '{name}': '{field}' = {value}: {reason}")
            }
            Self::MissingColumn { column } => {
                write!(f, "volume csv: missing column '{column}'")
            }
            Self::VolumeParse { record, value } => {
                write!(f, "volume row '{record}': cannot parse volume '{value}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ModelError {}
