//! # Property-Based Tests
//!
//! Invariants of the registry checked with proptest.

use chrono::NaiveDate;
use proptest::collection::vec;
use proptest::prelude::*;
use roster_core::statistics::{median, pearson, round1};
use roster_core::{
    Field, Grade, Manager, PerformanceBucket, Statistics, Student, StudentInput, Validator,
};

fn student(seq: usize, age: u32, performance: f64, attendance: f64) -> Student {
    let enrolled = NaiveDate::from_ymd_opt(2023, 9, 1).expect("date");
    Student {
        id: format!("STU{:03}", seq + 1),
        name: "Meera Nair".to_string(),
        age,
        grade: Grade::C,
        email: "meera.nair@university.edu".to_string(),
        performance,
        phone: None,
        course: "Chemistry".to_string(),
        department: "Science".to_string(),
        attendance,
        enrollment_date: enrolled,
        last_updated: enrolled.and_hms_opt(10, 0, 0).expect("time"),
        activity_log: Vec::new(),
    }
}

fn records() -> impl Strategy<Value = Vec<Student>> {
    vec((15u32..=70, 0.0f64..=100.0, 0.0f64..=100.0), 0..40).prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (age, perf, att))| student(i, age, perf, att))
            .collect()
    })
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Fixed distributions always carry every key and sum to the count.
    #[test]
    fn distributions_cover_every_record(students in records()) {
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let now = today.and_hms_opt(0, 0, 0).expect("time");
        let stats = Statistics::compute(&students, today, now);

        prop_assert_eq!(stats.grade_distribution.len(), 5);
        prop_assert_eq!(stats.performance_distribution.len(), PerformanceBucket::ALL.len());
        prop_assert_eq!(stats.performance_distribution.values().sum::<usize>(), students.len());
        prop_assert_eq!(stats.attendance_distribution.values().sum::<usize>(), students.len());
        prop_assert_eq!(stats.course_distribution.values().sum::<usize>(), students.len());
    }

    /// Correlation is always a finite value in [-1, 1].
    #[test]
    fn correlation_is_bounded(
        pairs in vec((0.0f64..=100.0, 0.0f64..=100.0), 0..60)
    ) {
        let (xs, ys): (Vec<f64>, Vec<f64>) = pairs.into_iter().unzip();
        let r = pearson(&xs, &ys);
        prop_assert!(r.is_finite());
        prop_assert!((-1.0..=1.0).contains(&r));
    }

    /// The median lies between the minimum and maximum.
    #[test]
    fn median_within_bounds(values in vec(0.0f64..=100.0, 1..60)) {
        let m = median(&values);
        let lo = values.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        prop_assert!(m >= lo && m <= hi);
    }

    /// Rounding keeps values within half a tenth.
    #[test]
    fn round1_is_close(value in 0.0f64..=100.0) {
        prop_assert!((round1(value) - value).abs() <= 0.05 + 1e-9);
    }

    /// In-range ages validate; out-of-range ages are always reported.
    #[test]
    fn age_bounds_enforced(age in -10i64..120) {
        let input = StudentInput::default()
            .with(Field::Name, "Kavya Iyer")
            .with(Field::Age, age.to_string())
            .with(Field::Grade, "B")
            .with(Field::Email, "kavya.iyer@university.edu")
            .with(Field::Performance, "80")
            .with(Field::Course, "Economics");
        let violations = Validator::validate_input(&input);
        if (15..=70).contains(&age) {
            prop_assert!(violations.is_empty());
        } else {
            prop_assert_eq!(violations.len(), 1);
            prop_assert_eq!(violations[0].field, Field::Age);
        }
    }

    /// next_id is strictly greater than every id ever issued, whatever is deleted.
    #[test]
    fn next_id_is_monotonic(count in 1usize..12, deletions in vec(0usize..12, 0..12)) {
        let mut manager = Manager::in_memory();
        for _ in 0..count {
            let input = StudentInput::default()
                .with(Field::Name, "Arjun Mehta")
                .with(Field::Age, "21")
                .with(Field::Grade, "A")
                .with(Field::Email, "arjun.mehta@university.edu")
                .with(Field::Performance, "90")
                .with(Field::Course, "Statistics");
            manager.register(&input).expect("register");
        }

        let mut previous = manager.next_id();
        for index in deletions {
            let _ = manager.delete(&format!("STU{:03}", index + 1));
            let next = manager.next_id();
            prop_assert_eq!(&next, &previous);
            previous = next;
        }
        prop_assert_eq!(previous, format!("STU{:03}", count + 1));
    }
}
