#![forbid(unsafe_code)]

use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Yearly,
}

impl Frequency {
    pub const ALL: [Self; 5] = [
        Self::Daily,
        Self::Weekly,
        Self::Monthly,
        Self::Quarterly,
        Self::Yearly,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "Daily",
            Self::Weekly => "Weekly",
            Self::Monthly => "Monthly",
            Self::Quarterly => "Quarterly",
            Self::Yearly => "Yearly",
        }
    }

    /// Days between two consecutive occurrences. Months and years are fixed
    /// approximations, not calendar arithmetic.
    #[must_use]
    pub fn interval_days(self) -> i64 {
        match self {
            Self::Daily => 1,
            Self::Weekly => 7,
            Self::Monthly => 30,
            Self::Quarterly => 90,
            Self::Yearly => 365,
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskType {
    Inspection,
    Cleaning,
    Repair,
    Service,
    Testing,
}

impl TaskType {
    pub const ALL: [Self; 5] = [
        Self::Inspection,
        Self::Cleaning,
        Self::Repair,
        Self::Service,
        Self::Testing,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inspection => "Inspection",
            Self::Cleaning => "Cleaning",
            Self::Repair => "Repair",
            Self::Service => "Service",
            Self::Testing => "Testing",
        }
    }

    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum ShiftType {
    Day,
    Night,
    #[default]
    Both,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "Not Started")]
    NotStarted,
    Open,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
}

/// One PPM task in the shape the tracking application stores under
/// `ppmTasks/<id>`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    pub description: String,
    pub shift_type: ShiftType,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(with = "iso_date")]
    pub due_date: Date,
    pub frequency: Frequency,
    pub status: TaskStatus,
    pub day_shift: String,
    pub night_shift: String,
    pub photos: Vec<serde_json::Value>,
    pub last_completed: Option<String>,
}

impl TaskRecord {
    /// A freshly imported task: both shifts, not started, nobody assigned.
    #[must_use]
    pub fn imported(
        id: i64,
        description: String,
        task_type: TaskType,
        frequency: Frequency,
        due_date: Date,
    ) -> Self {
        Self {
            id,
            description,
            shift_type: ShiftType::Both,
            task_type,
            due_date,
            frequency,
            status: TaskStatus::NotStarted,
            day_shift: String::new(),
            night_shift: String::new(),
            photos: Vec::new(),
            last_completed: None,
        }
    }
}
