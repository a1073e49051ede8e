//! First-start data: the bootstrap admin and optional demo records.

use chrono::{Duration, NaiveDate, NaiveTime};
use rand::{thread_rng, Rng};

use crate::auth::hash_password;
use crate::db::RecordStore;
use crate::engine::calendar::WorkCalendar;
use crate::engine::status::late_minutes;
use crate::errors::AppError;
use crate::models::{Employee, NewAttendance, NewEmployee, RawStatus, Role};

/// How far back demo attendance reaches.
pub const DEMO_HISTORY_DAYS: i64 = 30;

const DEMO_PASSWORD: &str = "password";

const DEMO_STAFF: [(&str, &str, &str); 5] = [
    ("Ani Wijaya", "ani", "Cashier"),
    ("Budi Santoso", "budi", "Barista"),
    ("Citra Dewi", "citra", "Barista"),
    ("Dimas Pratama", "dimas", "Kitchen"),
    ("Eka Putri", "eka", "Supervisor"),
];

/// Creates the admin account unless some admin already exists.
///
/// Returns the created account, or `None` when nothing was needed.
pub async fn ensure_admin(
    store: &dyn RecordStore,
    username: &str,
    password: &str,
) -> Result<Option<Employee>, AppError> {
    if store.list_employees().await?.iter().any(|e| e.is_admin()) {
        return Ok(None);
    }

    let admin = store
        .insert_employee(&NewEmployee {
            name: "Administrator".to_string(),
            username: username.to_string(),
            role: Role::Admin,
            position: None,
            password_hash: hash_password(password)?,
        })
        .await?;

    tracing::info!(employee_id = admin.id, username, "Created admin account");
    if password == "admin" {
        tracing::warn!("Admin account uses the default password; change it");
    }
    Ok(Some(admin))
}

/// Attendance for `employees` on every working day of the last
/// [`DEMO_HISTORY_DAYS`] days before `today`.
///
/// Roughly 70% on time, 15% late, 12% sick/permission/leave; the rest of the
/// days get no record so they show up as absent.
pub fn demo_attendance<R: Rng>(
    rng: &mut R,
    employees: &[Employee],
    calendar: &WorkCalendar,
    today: NaiveDate,
) -> Vec<NewAttendance> {
    let Some(yesterday) = today.pred_opt() else {
        return Vec::new();
    };
    let dates = calendar.working_dates(today - Duration::days(DEMO_HISTORY_DAYS), yesterday);

    let mut records = Vec::new();
    for date in dates {
        for employee in employees.iter().filter(|e| e.role == Role::Employee) {
            let roll = rng.gen_range(0..100);
            let leave = |status, note: &str| NewAttendance {
                employee_id: employee.id,
                date,
                check_in: None,
                check_out: None,
                status,
                note: note.to_string(),
                late_minutes: 0,
            };

            let record = match roll {
                0..=84 => {
                    let minutes = if roll < 70 {
                        rng.gen_range(0..=30)
                    } else {
                        rng.gen_range(31..=75)
                    };
                    let check_in = time_after(7, minutes);
                    NewAttendance {
                        employee_id: employee.id,
                        date,
                        check_in: Some(check_in),
                        check_out: Some(time_after(16, rng.gen_range(0..=60))),
                        status: RawStatus::Present,
                        note: String::new(),
                        late_minutes: late_minutes(check_in),
                    }
                }
                85..=89 => leave(RawStatus::Sick, "Sick"),
                90..=93 => leave(RawStatus::Permission, "Family matter"),
                94..=96 => leave(RawStatus::Leave, "Annual leave"),
                _ => continue,
            };
            records.push(record);
        }
    }
    records
}

fn time_after(hour: u32, minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
        + Duration::minutes(i64::from(minutes))
}

/// Adds demo employees and their last month of attendance.
///
/// Does nothing once any non-admin employee exists.
pub async fn seed_demo(store: &dyn RecordStore, today: NaiveDate) -> Result<(), AppError> {
    if store
        .list_employees()
        .await?
        .iter()
        .any(|e| e.role == Role::Employee)
    {
        tracing::info!("Employees already present, skipping demo data");
        return Ok(());
    }

    let password_hash = hash_password(DEMO_PASSWORD)?;
    let mut employees = Vec::with_capacity(DEMO_STAFF.len());
    for (name, username, position) in DEMO_STAFF {
        employees.push(
            store
                .insert_employee(&NewEmployee {
                    name: name.to_string(),
                    username: username.to_string(),
                    role: Role::Employee,
                    position: Some(position.to_string()),
                    password_hash: password_hash.clone(),
                })
                .await?,
        );
    }

    let calendar = WorkCalendar::new(&store.list_holidays().await?);
    let records = demo_attendance(&mut thread_rng(), &employees, &calendar, today);
    for record in &records {
        store.insert_attendance(record).await?;
    }

    tracing::info!(
        employees = employees.len(),
        records = records.len(),
        "Seeded demo data"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn employee(id: i64, role: Role) -> Employee {
        Employee {
            id,
            name: format!("Employee {}", id),
            username: format!("e{}", id),
            role,
            position: None,
            password_hash: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_demo_attendance_respects_calendar() {
        let calendar = WorkCalendar::new(&[]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let employees = vec![
            employee(1, Role::Admin),
            employee(2, Role::Employee),
            employee(3, Role::Employee),
        ];

        let records = demo_attendance(&mut StdRng::seed_from_u64(7), &employees, &calendar, today);
        assert!(!records.is_empty());

        let mut seen = HashSet::new();
        for record in &records {
            assert_ne!(record.employee_id, 1);
            assert!(record.date < today);
            assert!(record.date >= today - Duration::days(DEMO_HISTORY_DAYS));
            assert!(!calendar.is_day_off(record.date));
            assert!(seen.insert((record.employee_id, record.date)));

            if record.status.is_leave_type() {
                assert!(record.check_in.is_none());
                assert!(!record.note.is_empty());
            } else {
                let check_in = record.check_in.unwrap();
                assert_eq!(record.late_minutes, late_minutes(check_in));
            }
        }
    }

    #[test]
    fn test_demo_attendance_is_reproducible_per_seed() {
        let calendar = WorkCalendar::new(&[]);
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let employees = vec![employee(2, Role::Employee)];

        let first = demo_attendance(&mut StdRng::seed_from_u64(1), &employees, &calendar, today);
        let second = demo_attendance(&mut StdRng::seed_from_u64(1), &employees, &calendar, today);
        let key = |r: &NewAttendance| (r.date, r.status, r.check_in);
        assert_eq!(
            first.iter().map(key).collect::<Vec<_>>(),
            second.iter().map(key).collect::<Vec<_>>()
        );
    }

    #[tokio::test]
    async fn test_ensure_admin_runs_once() {
        let store = MemoryStore::new();

        let created = ensure_admin(&store, "boss", "s3cret").await.unwrap();
        assert_eq!(created.unwrap().username, "boss");
        assert!(ensure_admin(&store, "boss", "s3cret").await.unwrap().is_none());
        assert_eq!(store.list_employees().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_seed_demo_skips_populated_store() {
        let store = MemoryStore::new();
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();

        seed_demo(&store, today).await.unwrap();
        let employees = store.list_employees().await.unwrap().len();
        let records = store.list_attendance().await.unwrap().len();
        assert_eq!(employees, DEMO_STAFF.len());
        assert!(records > 0);

        seed_demo(&store, today).await.unwrap();
        assert_eq!(store.list_employees().await.unwrap().len(), employees);
        assert_eq!(store.list_attendance().await.unwrap().len(), records);
    }
}
