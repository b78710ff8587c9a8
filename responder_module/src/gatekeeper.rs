//! Decides whether an out-of-office reply goes out for a given sender.
//!
//! One reply per sender per calendar date: a message at 23:59 and another
//! at 00:01 the next day count as different days. Exempt senders never get
//! a reply.

use std::collections::HashSet;

use chrono::{DateTime, Local};

use crate::notify_store::{NotificationStore, NotifyStoreError};

#[derive(Debug)]
pub struct Gatekeeper {
    store: NotificationStore,
    exempt: HashSet<String>,
}

impl Gatekeeper {
    pub fn new(store: NotificationStore, exempt: HashSet<String>) -> Self {
        Self { store, exempt }
    }

    pub fn is_exempt(&self, sender_id: &str) -> bool {
        self.exempt.contains(sender_id)
    }

    /// True when the sender is not exempt and has not been auto-replied to
    /// on `now`'s calendar date. Time of day is ignored for the comparison.
    pub fn should_notify(&self, sender_id: &str, now: DateTime<Local>) -> bool {
        if self.exempt.contains(sender_id) {
            return false;
        }
        match self.store.last_sent(sender_id) {
            Some(last) => last.date_naive() != now.date_naive(),
            None => true,
        }
    }

    /// Approve a reply iff the message arrived outside working hours and
    /// the sender has not been notified today. "Not eligible" is a normal
    /// `false`, never an error.
    pub fn decide(
        &self,
        sender_id: &str,
        now: DateTime<Local>,
        outside_working_hours: bool,
    ) -> bool {
        outside_working_hours && self.should_notify(sender_id, now)
    }

    /// Record that a reply was sent to `sender_id` at `now` and persist the
    /// store. On a write failure the in-memory record stays updated, so the
    /// same process will not reply twice; a restart may re-send once.
    pub fn record_sent(
        &mut self,
        sender_id: &str,
        now: DateTime<Local>,
    ) -> Result<(), NotifyStoreError> {
        self.store.upsert(sender_id, now);
        self.store.save()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::fs;
    use tempfile::TempDir;

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    fn gatekeeper(temp: &TempDir, exempt: &[&str]) -> Gatekeeper {
        let store = NotificationStore::open(temp.path().join("sent_numbers.json"));
        let exempt = exempt.iter().map(|value| value.to_string()).collect();
        Gatekeeper::new(store, exempt)
    }

    #[test]
    fn first_message_notifies_once_per_day() {
        let temp = TempDir::new().expect("tempdir");
        let mut keeper = gatekeeper(&temp, &[]);

        assert!(keeper.should_notify("6281234567890", at(12, 20, 0)));
        keeper.record_sent("6281234567890", at(12, 20, 0)).expect("record");
        assert!(!keeper.should_notify("6281234567890", at(12, 20, 30)));
    }

    #[test]
    fn next_calendar_date_notifies_again() {
        let temp = TempDir::new().expect("tempdir");
        let mut keeper = gatekeeper(&temp, &[]);

        keeper.record_sent("111", at(12, 23, 59)).expect("record");
        // One minute past midnight is a different day.
        assert!(keeper.should_notify("111", at(13, 0, 1)));
    }

    #[test]
    fn exempt_sender_never_notifies() {
        let temp = TempDir::new().expect("tempdir");
        let mut keeper = gatekeeper(&temp, &["6285697541380"]);

        assert!(!keeper.should_notify("6285697541380", at(12, 20, 0)));
        assert!(!keeper.decide("6285697541380", at(12, 20, 0), true));

        // History does not change the outcome.
        keeper.record_sent("6285697541380", at(11, 20, 0)).expect("record");
        assert!(!keeper.should_notify("6285697541380", at(12, 20, 0)));
    }

    #[test]
    fn decide_requires_outside_working_hours() {
        let temp = TempDir::new().expect("tempdir");
        let keeper = gatekeeper(&temp, &[]);

        assert!(keeper.decide("111", at(12, 20, 0), true));
        assert!(!keeper.decide("111", at(12, 12, 0), false));
    }

    #[test]
    fn record_sent_persists_across_restart() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("sent_numbers.json");

        let store = NotificationStore::open(&path);
        let mut keeper = Gatekeeper::new(store, HashSet::new());
        keeper.record_sent("111", at(12, 20, 0)).expect("record");

        let restarted = Gatekeeper::new(NotificationStore::open(&path), HashSet::new());
        assert!(!restarted.should_notify("111", at(12, 21, 0)));
        assert!(restarted.should_notify("111", at(13, 8, 0)));
    }

    #[test]
    fn failed_write_keeps_in_memory_record() {
        let temp = TempDir::new().expect("tempdir");
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, "file, not a directory").expect("write blocker");

        let store = NotificationStore::open(blocker.join("sent_numbers.json"));
        let mut keeper = Gatekeeper::new(store, HashSet::new());

        let result = keeper.record_sent("111", at(12, 20, 0));
        assert!(result.is_err());
        // Same process lifetime: no duplicate reply despite the failed write.
        assert!(!keeper.should_notify("111", at(12, 20, 30)));
    }
}
