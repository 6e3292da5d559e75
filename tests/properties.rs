//! Property tests for the classifier and scheduler.

use ppm_import::core::classify::Classifier;
use ppm_import::core::record::{Frequency, TaskRecord, TaskType};
use ppm_import::core::schedule::{due_date, stagger_index};
use proptest::prelude::*;
use time::Date;

fn frequency_strategy() -> impl Strategy<Value = Frequency> {
    prop::sample::select(Frequency::ALL.to_vec())
}

fn task_type_strategy() -> impl Strategy<Value = TaskType> {
    prop::sample::select(TaskType::ALL.to_vec())
}

fn date_strategy() -> impl Strategy<Value = Date> {
    // 2000-01-01 .. roughly 2050
    (0i64..18_000).prop_map(|d| {
        Date::from_calendar_date(2000, time::Month::January, 1)
            .expect("valid date")
            .saturating_add(time::Duration::days(d))
    })
}

// Single-spaced words, none of them "at", not starting with the prefix.
fn fragment_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9-]{1,10}( [A-Za-z0-9-]{1,10}){0,3}".prop_filter("no separator", |s| {
        !s.split(' ').any(|w| w == "at") && !s.starts_with("PPM for ")
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn single_separator_round_trips(
        equipment in fragment_strategy(),
        location in fragment_strategy(),
        prefixed in any::<bool>(),
    ) {
        let stripped = format!("{equipment} at {location}");
        let text = if prefixed { format!("PPM for {stripped}") } else { stripped.clone() };

        let out = Classifier::default().classify(&text);
        prop_assert!(!out.equipment.is_empty());
        prop_assert!(!out.location.is_empty());
        prop_assert_eq!(format!("{} at {}", out.equipment, out.location), stripped.trim());
    }

    #[test]
    fn classification_is_always_in_the_enumerations(text in ".{0,80}") {
        let out = Classifier::default().classify(&text);
        prop_assert!(Frequency::ALL.contains(&out.frequency));
        prop_assert!(TaskType::ALL.contains(&out.task_type));
    }

    #[test]
    fn index_zero_is_identity(start in date_strategy(), f in frequency_strategy()) {
        prop_assert_eq!(due_date(start, 0, f), start);
    }

    #[test]
    fn due_date_is_monotonic(
        start in date_strategy(),
        f in frequency_strategy(),
        a in 0u32..30,
        b in 0u32..30,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(due_date(start, lo, f) <= due_date(start, hi, f));
    }

    #[test]
    fn stagger_index_stays_in_window(position in 0usize..100_000, window in 1u32..100) {
        let slot = stagger_index(position, window);
        prop_assert!(slot < window);
        prop_assert_eq!(stagger_index(position + window as usize, window), slot);
    }

    #[test]
    fn records_survive_json_round_trip(
        id in 0i64..9_007_199_254_740_991,
        description in "\\PC{1,60}",
        f in frequency_strategy(),
        t in task_type_strategy(),
        due in date_strategy(),
    ) {
        let rec = TaskRecord::imported(id, description, t, f, due);
        let json = serde_json::to_string_pretty(&rec).unwrap();
        let back: TaskRecord = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(back, rec);
    }
}
