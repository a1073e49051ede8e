//! Attendance score and employee ranking.

use serde::Serialize;

use super::stats::MonthlyStats;
use crate::models::Employee;

pub const BASE_SCORE: i64 = 100;
pub const ABSENT_PENALTY: i64 = 20;
pub const LATE_PENALTY: i64 = 5;
/// Lateness never costs more than this in one period.
pub const MAX_LATE_PENALTY: i64 = 30;
/// Per sick, permission or leave day.
pub const EXCUSED_PENALTY: i64 = 2;
/// Granted when a period has neither absences nor late days.
pub const PERFECT_ATTENDANCE_BONUS: i64 = 20;
pub const SCORE_FLOOR: i64 = 0;
/// No upper clamp: a perfect period may score above [`BASE_SCORE`].
pub const SCORE_CEILING: Option<i64> = None;

pub fn score(absent: u32, late: u32, excused: u32) -> i64 {
    let mut score = BASE_SCORE;
    score -= ABSENT_PENALTY * i64::from(absent);
    score -= (LATE_PENALTY * i64::from(late)).min(MAX_LATE_PENALTY);
    score -= EXCUSED_PENALTY * i64::from(excused);
    if absent == 0 && late == 0 {
        score += PERFECT_ATTENDANCE_BONUS;
    }

    let score = score.max(SCORE_FLOOR);
    match SCORE_CEILING {
        Some(ceiling) => score.min(ceiling),
        None => score,
    }
}

pub fn score_for(stats: &MonthlyStats) -> i64 {
    score(stats.absent_days(), stats.counts.late, stats.counts.excused())
}

/// One line of the ranking table.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RankedEmployee {
    pub rank: usize,
    pub employee_id: i64,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    pub score: i64,
    pub stats: MonthlyStats,
}

/// Orders employees by score, highest first.
///
/// The sort is stable: equal scores keep the order in which `entries` were
/// given.
pub fn rank(entries: Vec<(Employee, MonthlyStats)>) -> Vec<RankedEmployee> {
    let mut scored: Vec<_> = entries
        .into_iter()
        .map(|(employee, stats)| (score_for(&stats), employee, stats))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));

    scored
        .into_iter()
        .enumerate()
        .map(|(index, (score, employee, stats))| RankedEmployee {
            rank: index + 1,
            employee_id: employee.id,
            name: employee.name,
            position: employee.position,
            score,
            stats,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::stats::StatusCounts;
    use crate::models::Role;

    fn employee(id: i64, name: &str) -> Employee {
        Employee {
            id,
            name: name.to_string(),
            username: name.to_lowercase(),
            role: Role::Employee,
            position: None,
            password_hash: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    fn stats(employee_id: i64, counts: StatusCounts, unrecorded_days: u32) -> MonthlyStats {
        MonthlyStats {
            employee_id,
            year: 2024,
            month: 6,
            counts,
            unrecorded_days,
            total_working_days: 25,
            attendance_rate: 0,
        }
    }

    #[test]
    fn test_perfect_period_with_two_sick_days() {
        assert_eq!(score(0, 0, 2), 116);
        assert!(SCORE_CEILING.is_none());
    }

    #[test]
    fn test_late_penalty_is_capped() {
        // 6 late days would be 30, 10 late days stay at 30
        assert_eq!(score(0, 6, 0), 70);
        assert_eq!(score(0, 10, 0), 70);
        assert_eq!(score(0, 2, 0), 90);
    }

    #[test]
    fn test_score_never_goes_below_zero() {
        assert_eq!(score(5, 0, 0), 0);
        assert_eq!(score(9, 8, 4), 0);
        assert_eq!(score(1, 0, 0), 80);
    }

    #[test]
    fn test_unrecorded_days_count_as_absent() {
        let s = stats(1, StatusCounts::default(), 2);
        assert_eq!(score_for(&s), 60);
    }

    #[test]
    fn test_ranking_is_stable_for_ties() {
        let perfect = StatusCounts {
            present: 10,
            ..StatusCounts::default()
        };
        let one_late = StatusCounts {
            late: 1,
            ..StatusCounts::default()
        };

        let ranking = rank(vec![
            (employee(1, "Ani"), stats(1, perfect.clone(), 0)),
            (employee(2, "Budi"), stats(2, one_late, 0)),
            (employee(3, "Citra"), stats(3, perfect.clone(), 0)),
            (employee(4, "Dewi"), stats(4, perfect, 0)),
        ]);

        let order: Vec<i64> = ranking.iter().map(|r| r.employee_id).collect();
        assert_eq!(order, vec![1, 3, 4, 2]);
        assert_eq!(ranking[0].rank, 1);
        assert_eq!(ranking[0].score, 120);
        assert_eq!(ranking[3].rank, 4);
        assert_eq!(ranking[3].score, 95);
    }
}
