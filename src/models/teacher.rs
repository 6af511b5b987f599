//! Teacher roster model.
//!
//! Teachers are shared by every grid in a project. Each teacher declares
//! the subjects they can teach, the slots they cannot take ("NG-slots"),
//! and the class groups they will not visit ("NG-classes").
//!
//! NG-slots are label pairs, not indices: the roster is global while each
//! grid configures its own date and period lists, so labels are the only
//! identity that spans grids.

use serde::{Deserialize, Serialize};

/// A blocked (date, period) pair, matched by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NgSlot {
    /// Date label as configured in the owning grid(s).
    pub date: String,
    /// Period label as configured in the owning grid(s).
    pub period: String,
}

impl NgSlot {
    /// Creates a blocked slot from date and period labels.
    pub fn new(date: impl Into<String>, period: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            period: period.into(),
        }
    }
}

/// A teacher in the shared roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Teacher {
    /// Unique name (the roster key; cells reference teachers by name).
    pub name: String,
    /// Subjects this teacher can take.
    pub subjects: Vec<String>,
    /// Slots this teacher cannot take.
    #[serde(default)]
    pub ng_slots: Vec<NgSlot>,
    /// Class groups this teacher will not visit.
    #[serde(default)]
    pub ng_classes: Vec<String>,
}

impl Teacher {
    /// Creates a teacher with no subjects and no restrictions.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            subjects: Vec::new(),
            ng_slots: Vec::new(),
            ng_classes: Vec::new(),
        }
    }

    /// Adds a teachable subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subjects.push(subject.into());
        self
    }

    /// Adds a blocked slot by label.
    pub fn with_ng_slot(mut self, date: impl Into<String>, period: impl Into<String>) -> Self {
        self.ng_slots.push(NgSlot::new(date, period));
        self
    }

    /// Adds a blocked class group by label.
    pub fn with_ng_class(mut self, class: impl Into<String>) -> Self {
        self.ng_classes.push(class.into());
        self
    }

    /// Whether this teacher can take the given subject.
    pub fn teaches(&self, subject: &str) -> bool {
        self.subjects.iter().any(|s| s == subject)
    }

    /// Whether the labelled slot is blocked for this teacher.
    pub fn blocks_slot(&self, date: &str, period: &str) -> bool {
        self.ng_slots
            .iter()
            .any(|ng| ng.date == date && ng.period == period)
    }

    /// Whether the labelled class group is blocked for this teacher.
    pub fn blocks_class(&self, class: &str) -> bool {
        self.ng_classes.iter().any(|c| c == class)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teacher_builder() {
        let t = Teacher::new("Alice")
            .with_subject("Math")
            .with_subject("Science")
            .with_ng_slot("D1", "P1")
            .with_ng_class("B");

        assert_eq!(t.name, "Alice");
        assert!(t.teaches("Math"));
        assert!(t.teaches("Science"));
        assert!(!t.teaches("English"));
        assert!(t.blocks_slot("D1", "P1"));
        assert!(!t.blocks_slot("D1", "P2"));
        assert!(!t.blocks_slot("D2", "P1"));
        assert!(t.blocks_class("B"));
        assert!(!t.blocks_class("A"));
    }

    #[test]
    fn test_missing_restriction_fields_default_empty() {
        // Documents saved before NG support existed carry neither field.
        let json = r#"{"name":"Bob","subjects":["English"]}"#;
        let t: Teacher = serde_json::from_str(json).unwrap();
        assert!(t.ng_slots.is_empty());
        assert!(t.ng_classes.is_empty());
        assert!(t.teaches("English"));
    }
}
