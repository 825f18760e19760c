use std::cmp::Reverse;

use chrono::{DateTime, Datelike, Utc};

use appointment_cell::models::{Appointment, AppointmentStatus};
use patient_cell::models::Patient;

use crate::models::{AppointmentStats, PatientStats, PrescriptionStats, NOT_AVAILABLE};

pub fn patient_stats(patients: &[Patient], now: DateTime<Utc>) -> PatientStats {
    let this_month = (now.year(), now.month());
    let last_month = if now.month() == 1 {
        (now.year() - 1, 12)
    } else {
        (now.year(), now.month() - 1)
    };

    let created_in = |(year, month): (i32, u32)| {
        patients
            .iter()
            .filter_map(Patient::created_at_timestamp)
            .filter(|created| created.year() == year && created.month() == month)
            .count()
    };

    let with_sex = |sex: &str| {
        patients
            .iter()
            .filter(|patient| patient.sex.as_deref() == Some(sex))
            .count()
    };

    // Missing ages read as 0 and still count towards the denominator.
    let average_age = if patients.is_empty() {
        0
    } else {
        let total: f64 = patients.iter().map(|patient| patient.age_years() as f64).sum();
        round_half_up(total / patients.len() as f64)
    };

    PatientStats {
        total_patients: patients.len(),
        new_patients_this_month: created_in(this_month),
        new_patients_last_month: created_in(last_month),
        male_patients: with_sex("male"),
        female_patients: with_sex("female"),
        other_patients: with_sex("other"),
        average_age,
    }
}

pub fn appointment_stats(appointments: &[Appointment]) -> AppointmentStats {
    let total = appointments.len();
    let count = |status: AppointmentStatus| {
        appointments
            .iter()
            .filter(|appointment| appointment.status == status)
            .count()
    };

    let completed = count(AppointmentStatus::Completed);
    let cancelled = count(AppointmentStatus::Cancelled);
    let no_show = count(AppointmentStatus::NoShow);
    let [completion_rate, cancellation_rate, no_show_rate] =
        capped_percentages([completed, cancelled, no_show], total);

    AppointmentStats {
        total_appointments: total,
        completed_appointments: completed,
        scheduled_appointments: count(AppointmentStatus::Scheduled),
        cancelled_appointments: cancelled,
        no_show_appointments: no_show,
        completion_rate,
        cancellation_rate,
        no_show_rate,
    }
}

pub fn prescription_stats(patients: &[Patient]) -> PrescriptionStats {
    let lens_contains = |needle: &str| {
        patients
            .iter()
            .filter_map(|patient| patient.lens_type.as_deref())
            .filter(|lens| lens.to_lowercase().contains(needle))
            .count()
    };

    PrescriptionStats {
        total_prescriptions: patients.len(),
        single_vision: lens_contains("single"),
        bifocal: lens_contains("bifocal"),
        progressive: lens_contains("progressive"),
        most_common_frame_type: most_common(
            patients.iter().filter_map(|patient| patient.frame_type.as_deref()),
        ),
        most_common_lens_type: most_common(
            patients.iter().filter_map(|patient| patient.lens_type.as_deref()),
        ),
    }
}

/// Nearest integer, with halves rounded towards positive infinity.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

/// Whole percentage of `part` in `total`, 0 when `total` is 0.
pub fn percentage(part: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((part * 200 + total) / (total * 2)) as u32
}

/// Percentages of disjoint parts of `total`, each rounded half up, then
/// trimmed so they never add up to more than 100. The rate that was rounded
/// up the most gives way first; earlier parts win ties.
pub fn capped_percentages<const N: usize>(parts: [usize; N], total: usize) -> [u32; N] {
    let mut rates = parts.map(|part| percentage(part, total));
    let mut excess = rates.iter().sum::<u32>().saturating_sub(100);

    while excess > 0 {
        let overshoot = |i: usize| rates[i] as i128 * total as i128 - parts[i] as i128 * 100;
        let Some(index) = (0..N).filter(|&i| rates[i] > 0).max_by_key(|&i| (overshoot(i), Reverse(i))) else {
            break;
        };
        rates[index] -= 1;
        excess -= 1;
    }

    rates
}

/// Most frequent non-empty value; the earliest seen wins a tie.
pub fn most_common<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    let mut tally: Vec<(&str, usize)> = Vec::new();

    for value in values.into_iter().filter(|value| !value.is_empty()) {
        match tally.iter_mut().find(|(seen, _)| *seen == value) {
            Some((_, count)) => *count += 1,
            None => tally.push((value, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in tally {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }

    best.map_or_else(|| NOT_AVAILABLE.to_string(), |(value, _)| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now(year: i32, month: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0).unwrap()
    }

    fn patient(sex: Option<&str>, age: Option<&str>, created_at: Option<&str>) -> Patient {
        Patient {
            sex: sex.map(str::to_string),
            age: age.map(str::to_string),
            created_at: created_at.map(str::to_string),
            ..Patient::default()
        }
    }

    fn eyewear(frame: Option<&str>, lens: Option<&str>) -> Patient {
        Patient {
            frame_type: frame.map(str::to_string),
            lens_type: lens.map(str::to_string),
            ..Patient::default()
        }
    }

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: None,
            patient_id: "p1".to_string(),
            patient_name: String::new(),
            patient_email: String::new(),
            patient_phone: String::new(),
            appointment_date: "2024-02-01".to_string(),
            appointment_time: "09:00".to_string(),
            duration: 30,
            status,
            notes: String::new(),
            reason_for_visit: String::new(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_round_half_up() {
        assert_eq!(round_half_up(39.5), 40);
        assert_eq!(round_half_up(39.49), 39);
        assert_eq!(round_half_up(-2.5), -2);
        assert_eq!(round_half_up(0.0), 0);
    }

    #[test]
    fn test_average_age() {
        let patients = vec![
            patient(None, Some("30"), None),
            patient(None, Some("40"), None),
            patient(None, Some("50"), None),
        ];
        assert_eq!(patient_stats(&patients, now(2024, 2, 1)).average_age, 40);
    }

    #[test]
    fn test_missing_ages_count_as_zero() {
        let all_missing = vec![patient(None, None, None), patient(None, Some("n/a"), None)];
        assert_eq!(patient_stats(&all_missing, now(2024, 2, 1)).average_age, 0);

        let one_missing = vec![patient(None, Some("40"), None), patient(None, None, None)];
        assert_eq!(patient_stats(&one_missing, now(2024, 2, 1)).average_age, 20);

        assert_eq!(patient_stats(&[], now(2024, 2, 1)).average_age, 0);
    }

    #[test]
    fn test_age_reads_leading_integer() {
        let patients = vec![patient(None, Some("34 years"), None), patient(None, Some("35"), None)];
        // 34.5 rounds up
        assert_eq!(patient_stats(&patients, now(2024, 2, 1)).average_age, 35);
    }

    #[test]
    fn test_sex_buckets_are_exact() {
        let patients = vec![
            patient(Some("male"), None, None),
            patient(Some("female"), None, None),
            patient(Some("female"), None, None),
            patient(Some("other"), None, None),
            patient(Some("Male"), None, None),
            patient(Some("unknown"), None, None),
            patient(None, None, None),
        ];

        let stats = patient_stats(&patients, now(2024, 2, 1));

        assert_eq!(stats.total_patients, 7);
        assert_eq!(stats.male_patients, 1);
        assert_eq!(stats.female_patients, 2);
        assert_eq!(stats.other_patients, 1);
    }

    #[test]
    fn test_new_patients_by_month() {
        let patients = vec![
            patient(None, None, Some("2024-03-02T08:00:00Z")),
            patient(None, None, Some("2024-03-31")),
            patient(None, None, Some("2024-02-15T10:00:00.000Z")),
            patient(None, None, Some("2023-03-10")),
            patient(None, None, Some("garbage")),
            patient(None, None, None),
        ];

        let stats = patient_stats(&patients, now(2024, 3, 15));

        assert_eq!(stats.new_patients_this_month, 2);
        assert_eq!(stats.new_patients_last_month, 1);
    }

    #[test]
    fn test_last_month_rolls_back_across_january() {
        let patients = vec![
            patient(None, None, Some("2023-12-20")),
            patient(None, None, Some("2024-12-20")),
            patient(None, None, Some("2024-01-05")),
        ];

        let stats = patient_stats(&patients, now(2024, 1, 10));

        assert_eq!(stats.new_patients_last_month, 1);
        assert_eq!(stats.new_patients_this_month, 1);
    }

    #[test]
    fn test_rates_are_zero_without_appointments() {
        let stats = appointment_stats(&[]);
        assert_eq!(stats, AppointmentStats::default());
    }

    #[test]
    fn test_appointment_counts_and_rates() {
        let appointments = vec![
            appointment(AppointmentStatus::Completed),
            appointment(AppointmentStatus::Completed),
            appointment(AppointmentStatus::Cancelled),
            appointment(AppointmentStatus::NoShow),
            appointment(AppointmentStatus::Scheduled),
            appointment(AppointmentStatus::Scheduled),
        ];

        let stats = appointment_stats(&appointments);

        assert_eq!(stats.total_appointments, 6);
        assert_eq!(stats.completed_appointments, 2);
        assert_eq!(stats.scheduled_appointments, 2);
        assert_eq!(stats.cancelled_appointments, 1);
        assert_eq!(stats.no_show_appointments, 1);
        assert_eq!(stats.completion_rate, 33);
        assert_eq!(stats.cancellation_rate, 17);
        assert_eq!(stats.no_show_rate, 17);
        assert!(stats.completion_rate + stats.cancellation_rate + stats.no_show_rate <= 100);
    }

    #[test]
    fn test_rates_never_sum_past_one_hundred() {
        let appointments: Vec<Appointment> = [
            (AppointmentStatus::Completed, 3),
            (AppointmentStatus::Cancelled, 3),
            (AppointmentStatus::NoShow, 2),
        ]
        .into_iter()
        .flat_map(|(status, n)| std::iter::repeat_with(move || appointment(status)).take(n))
        .collect();

        let stats = appointment_stats(&appointments);

        assert_eq!(stats.total_appointments, 8);
        assert_eq!((stats.completion_rate, stats.cancellation_rate, stats.no_show_rate), (37, 38, 25));
    }

    #[test]
    fn test_capped_percentages_over_all_small_splits() {
        for total in 1..=30usize {
            for a in 0..=total {
                for b in 0..=total - a {
                    for c in 0..=total - a - b {
                        let parts = [a, b, c];
                        let rates = capped_percentages(parts, total);

                        assert!(rates.iter().sum::<u32>() <= 100, "{:?} of {}", parts, total);
                        for (rate, part) in rates.iter().zip(parts) {
                            // stays on the floor or ceiling of the exact percentage
                            let diff = *rate as i64 * total as i64 - part as i64 * 100;
                            assert!(diff.abs() < total as i64, "{:?} of {}", parts, total);
                        }

                        let plain = parts.map(|part| percentage(part, total));
                        if plain.iter().sum::<u32>() <= 100 {
                            assert_eq!(rates, plain);
                        }
                    }
                }
            }
        }
        assert_eq!(capped_percentages([0, 0, 0], 0), [0, 0, 0]);
    }

    #[test]
    fn test_huge_ages_do_not_overflow() {
        let patients = vec![
            patient(None, Some("9223372036854775807"), None),
            patient(None, Some("9223372036854775807"), None),
        ];
        assert_eq!(patient_stats(&patients, now(2024, 2, 1)).average_age, i64::MAX);
    }

    #[test]
    fn test_percentage_rounds_half_up() {
        assert_eq!(percentage(1, 8), 13);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(4, 4), 100);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn test_most_common() {
        assert_eq!(most_common(Vec::<&str>::new()), "N/A");
        assert_eq!(most_common(["A", "B", "A"]), "A");
        assert_eq!(most_common(["A", "B"]), "A");
        assert_eq!(most_common(["B", "A", "A", "B"]), "B");
        assert_eq!(most_common(["", "", "C"]), "C");
        assert_eq!(most_common([""]), "N/A");
    }

    #[test]
    fn test_lens_buckets_overlap() {
        let patients = vec![
            eyewear(None, Some("Progressive Bifocal")),
            eyewear(None, Some("single vision")),
            eyewear(None, Some("BIFOCAL")),
            eyewear(None, None),
        ];

        let stats = prescription_stats(&patients);

        assert_eq!(stats.total_prescriptions, 4);
        assert_eq!(stats.single_vision, 1);
        assert_eq!(stats.bifocal, 2);
        assert_eq!(stats.progressive, 1);
    }

    #[test]
    fn test_most_common_frame_and_lens() {
        let patients = vec![
            eyewear(Some("Full Rim"), Some("Single Vision")),
            eyewear(Some("Rimless"), Some("Progressive")),
            eyewear(Some("Rimless"), Some("Progressive")),
            eyewear(None, Some("Single Vision")),
        ];

        let stats = prescription_stats(&patients);

        assert_eq!(stats.most_common_frame_type, "Rimless");
        assert_eq!(stats.most_common_lens_type, "Single Vision");
    }

    #[test]
    fn test_prescriptions_without_patients() {
        assert_eq!(prescription_stats(&[]), PrescriptionStats::default());
    }
}
