use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fmt::{Display, Formatter},
};

/// Field name the posts service reports content problems under.
pub const CONTENT_FIELD: &str = "content";

/// Structured rejection returned by the posts service when input fails its
/// validation rules. Messages per field keep the order the service sent them in.
#[derive(Clone, Eq, PartialEq, Debug, Default, Hash, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationFailure {
    pub field_errors: BTreeMap<String, Vec<String>>,
}

impl ValidationFailure {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_message(mut self, field: &str, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.field_errors
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn messages(&self, field: &str) -> &[String] {
        self.field_errors.get(field).map_or(&[], Vec::as_slice)
    }

    #[must_use]
    pub fn first_message(&self, field: &str) -> Option<&str> {
        self.messages(field).first().map(String::as_str)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.field_errors.values().all(Vec::is_empty)
    }
}

impl Display for ValidationFailure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, messages) in &self.field_errors {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}
