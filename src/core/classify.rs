#![forbid(unsafe_code)]

use serde::{Deserialize, Serialize};

use crate::core::record::{Frequency, TaskType};

pub const DEFAULT_PREFIX: &str = "PPM for ";
pub const DEFAULT_SEPARATOR: &str = " at ";

/// Maps any of `keywords` (case-insensitive substring) to `value`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordRule<T> {
    pub keywords: Vec<String>,
    pub value: T,
}

impl<T> KeywordRule<T> {
    pub fn new(keywords: &[&str], value: T) -> Self {
        Self {
            keywords: keywords.iter().map(|k| (*k).to_owned()).collect(),
            value,
        }
    }

    fn matches(&self, haystack_lower: &str) -> bool {
        self.keywords
            .iter()
            .any(|k| haystack_lower.contains(k.as_str()))
    }

    fn lowercased(mut self) -> Self {
        for k in &mut self.keywords {
            *k = k.to_lowercase();
        }
        self
    }
}

#[must_use]
pub fn default_frequency_rules() -> Vec<KeywordRule<Frequency>> {
    vec![
        KeywordRule::new(&["daily", "every day"], Frequency::Daily),
        KeywordRule::new(&["weekly", "every week"], Frequency::Weekly),
        KeywordRule::new(&["monthly", "every month"], Frequency::Monthly),
        KeywordRule::new(&["quarterly", "every quarter"], Frequency::Quarterly),
        KeywordRule::new(&["yearly", "annual", "every year"], Frequency::Yearly),
    ]
}

#[must_use]
pub fn default_task_type_rules() -> Vec<KeywordRule<TaskType>> {
    vec![
        KeywordRule::new(&["inspect", "check", "review", "examine"], TaskType::Inspection),
        KeywordRule::new(&["clean", "wash", "sanitize"], TaskType::Cleaning),
        KeywordRule::new(&["repair", "fix", "replace"], TaskType::Repair),
        KeywordRule::new(&["service", "maintain", "ppm"], TaskType::Service),
        KeywordRule::new(&["test", "calibrate", "measure"], TaskType::Testing),
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub equipment: String,
    pub location: String,
    pub frequency: Frequency,
    pub task_type: TaskType,
}

#[derive(Debug, Clone)]
pub struct Classifier {
    prefix: String,
    separator: String,
    frequency_rules: Vec<KeywordRule<Frequency>>,
    default_frequency: Frequency,
    task_type_rules: Vec<KeywordRule<TaskType>>,
    default_task_type: TaskType,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(
            DEFAULT_PREFIX,
            DEFAULT_SEPARATOR,
            default_frequency_rules(),
            Frequency::Weekly,
            default_task_type_rules(),
            TaskType::Inspection,
        )
    }
}

impl Classifier {
    /// Rules are evaluated in the given order; the first match wins.
    #[must_use]
    pub fn new(
        prefix: &str,
        separator: &str,
        frequency_rules: Vec<KeywordRule<Frequency>>,
        default_frequency: Frequency,
        task_type_rules: Vec<KeywordRule<TaskType>>,
        default_task_type: TaskType,
    ) -> Self {
        Self {
            prefix: prefix.to_owned(),
            separator: separator.to_owned(),
            frequency_rules: frequency_rules
                .into_iter()
                .map(KeywordRule::lowercased)
                .collect(),
            default_frequency,
            task_type_rules: task_type_rules
                .into_iter()
                .map(KeywordRule::lowercased)
                .collect(),
            default_task_type,
        }
    }

    #[must_use]
    pub fn classify(&self, description: &str) -> Classification {
        let (equipment, location) = self.split_equipment_location(description);
        Classification {
            equipment,
            location,
            frequency: self.frequency(description),
            task_type: self.task_type(description),
        }
    }

    /// `"PPM for <equipment> at <location>"`. Anything that does not split into
    /// exactly two non-empty halves comes back whole as the equipment.
    #[must_use]
    pub fn split_equipment_location(&self, description: &str) -> (String, String) {
        let rest = description
            .strip_prefix(self.prefix.as_str())
            .unwrap_or(description);
        if self.separator.is_empty() {
            return (description.to_owned(), String::new());
        }

        let parts: Vec<&str> = rest.split(self.separator.as_str()).collect();
        if let [equipment, location] = parts.as_slice() {
            let equipment = equipment.trim();
            let location = location.trim();
            if !equipment.is_empty() && !location.is_empty() {
                return (equipment.to_owned(), location.to_owned());
            }
        }
        (description.to_owned(), String::new())
    }

    #[must_use]
    pub fn frequency(&self, description: &str) -> Frequency {
        first_match(
            &self.frequency_rules,
            &description.to_lowercase(),
            self.default_frequency,
        )
    }

    #[must_use]
    pub fn task_type(&self, description: &str) -> TaskType {
        first_match(
            &self.task_type_rules,
            &description.to_lowercase(),
            self.default_task_type,
        )
    }
}

fn first_match<T: Copy>(rules: &[KeywordRule<T>], haystack_lower: &str, default: T) -> T {
    rules
        .iter()
        .find(|r| r.matches(haystack_lower))
        .map_or(default, |r| r.value)
}
