use chrono::NaiveDate;

use counsel_types::Thread;

/// Badge shown next to a thread title.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertificationBadge {
    ExpertCertified,
    NotCertified,
    None,
}

/// Rank-based placeholder for an expert review pipeline: a thread created
/// yesterday is classified by how recent it is among yesterday's threads
/// (the 3 newest are still awaiting review). Threads from any other day
/// carry no badge. Display-only; nothing downstream may treat this as
/// domain truth.
pub fn badge_for(threads: &[Thread], thread_id: &str, today: NaiveDate) -> CertificationBadge {
    let yesterday = match today.pred_opt() {
        Some(day) => day,
        None => return CertificationBadge::None,
    };

    let thread = match threads.iter().find(|t| t.id == thread_id) {
        Some(thread) => thread,
        None => return CertificationBadge::None,
    };
    if thread.created_at.date_naive() != yesterday {
        return CertificationBadge::None;
    }

    let mut yesterdays: Vec<&Thread> = threads
        .iter()
        .filter(|t| t.created_at.date_naive() == yesterday)
        .collect();
    yesterdays.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    match yesterdays.iter().position(|t| t.id == thread_id) {
        Some(rank) if rank < 3 => CertificationBadge::NotCertified,
        Some(_) => CertificationBadge::ExpertCertified,
        None => CertificationBadge::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use counsel_types::{CertifiedStatus, Domain};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 8, 30).unwrap()
    }

    fn thread_created(id: &str, days_ago: i64, minutes: u32) -> Thread {
        let day = today() - chrono::Duration::days(days_ago);
        let created = Utc
            .from_utc_datetime(&day.and_hms_opt(12, minutes, 0).unwrap());
        Thread {
            id: id.to_string(),
            title: id.to_string(),
            user_id: "u".to_string(),
            pinned: false,
            pinned_at: None,
            domain: Domain::Legal,
            certified_status: CertifiedStatus::Pending,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn second_newest_yesterday_is_not_certified() {
        // Six threads yesterday, one minute apart; t5 is newest.
        let threads: Vec<Thread> =
            (0..6).map(|i| thread_created(&format!("t{i}"), 1, i)).collect();

        assert_eq!(
            badge_for(&threads, "t4", today()),
            CertificationBadge::NotCertified
        );
    }

    #[test]
    fn fifth_newest_yesterday_is_expert_certified() {
        let threads: Vec<Thread> =
            (0..6).map(|i| thread_created(&format!("t{i}"), 1, i)).collect();

        assert_eq!(
            badge_for(&threads, "t1", today()),
            CertificationBadge::ExpertCertified
        );
    }

    #[test]
    fn todays_threads_carry_no_badge() {
        let threads = vec![thread_created("today", 0, 0)];
        assert_eq!(
            badge_for(&threads, "today", today()),
            CertificationBadge::None
        );
    }

    #[test]
    fn unknown_thread_carries_no_badge() {
        assert_eq!(
            badge_for(&[], "missing", today()),
            CertificationBadge::None
        );
    }
}
