//! Staleness and waiting-state detection per thread.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use hawk_core::config::AnalysisConfig;
use hawk_core::types::{BottleneckVerdict, CommunicationRecord};

use crate::resolver::ResponsibilityResolver;

const SECONDS_PER_DAY: i64 = 86_400;

/// Verdicts for the threads of a record set.
#[derive(Debug, Clone, Default)]
pub struct ThreadAnalysis {
    /// One verdict per thread, longest-waiting first.
    pub verdicts: Vec<BottleneckVerdict>,
    /// Malformed records left out of the analysis.
    pub skipped: usize,
}

impl ThreadAnalysis {
    pub fn stuck(&self) -> impl Iterator<Item = &BottleneckVerdict> {
        self.verdicts.iter().filter(|v| v.is_stuck)
    }
}

/// Judges which threads are stuck.
///
/// A thread is stuck when its most recent message is at least
/// `stuck_threshold_days` old *and* reads like it expects a reply.
#[derive(Debug, Clone)]
pub struct BottleneckAnalyzer {
    stuck_threshold_days: i64,
    question_indicators: Vec<String>,
    resolver: ResponsibilityResolver,
}

impl BottleneckAnalyzer {
    pub fn new(
        stuck_threshold_days: u32,
        question_indicators: Vec<String>,
        resolver: ResponsibilityResolver,
    ) -> Self {
        Self {
            stuck_threshold_days: i64::from(stuck_threshold_days),
            question_indicators: question_indicators
                .into_iter()
                .map(|q| q.to_lowercase())
                .filter(|q| !q.trim().is_empty())
                .collect(),
            resolver,
        }
    }

    pub fn from_config(config: &AnalysisConfig) -> Self {
        Self::new(
            config.stuck_threshold_days,
            config.question_indicators.clone(),
            ResponsibilityResolver::from_config(config),
        )
    }

    pub fn stuck_threshold_days(&self) -> i64 {
        self.stuck_threshold_days
    }

    /// Whole days elapsed between `timestamp` and `now`, rounded down.
    pub fn days_waiting(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
        (now - timestamp).num_seconds().div_euclid(SECONDS_PER_DAY)
    }

    /// Whether the body contains any question indicator.
    pub fn awaits_reply(&self, record: &CommunicationRecord) -> bool {
        let body = record.body.to_lowercase();
        self.question_indicators
            .iter()
            .any(|indicator| body.contains(indicator.as_str()))
    }

    /// Produce one verdict per distinct thread among `records`.
    ///
    /// The newest record of each thread is its representative. Malformed
    /// records are counted and ignored.
    pub fn analyze<'a, I>(&self, records: I, now: DateTime<Utc>) -> ThreadAnalysis
    where
        I: IntoIterator<Item = &'a CommunicationRecord>,
    {
        let mut skipped = 0usize;
        let mut latest: HashMap<String, (&CommunicationRecord, DateTime<Utc>)> = HashMap::new();

        for record in records {
            let Some(timestamp) = record.timestamp.filter(|_| record.is_well_formed()) else {
                skipped += 1;
                continue;
            };
            latest
                .entry(record.thread_key())
                .and_modify(|(rep, ts)| {
                    if timestamp > *ts {
                        *rep = record;
                        *ts = timestamp;
                    }
                })
                .or_insert((record, timestamp));
        }

        let mut verdicts: Vec<BottleneckVerdict> = latest
            .into_iter()
            .map(|(thread_id, (rep, ts))| self.verdict_for(thread_id, rep, ts, now))
            .collect();
        verdicts.sort_by(|a, b| {
            b.days_waiting
                .cmp(&a.days_waiting)
                .then_with(|| a.thread_id.cmp(&b.thread_id))
        });

        debug!(
            threads = verdicts.len(),
            stuck = verdicts.iter().filter(|v| v.is_stuck).count(),
            skipped,
            "Analyzed threads"
        );

        ThreadAnalysis { verdicts, skipped }
    }

    fn verdict_for(
        &self,
        thread_id: String,
        representative: &CommunicationRecord,
        last_activity: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> BottleneckVerdict {
        let days_waiting = Self::days_waiting(last_activity, now);
        let awaiting_reply = self.awaits_reply(representative);
        let is_stuck = days_waiting >= self.stuck_threshold_days && awaiting_reply;
        let responsibility = self.resolver.resolve(representative);

        BottleneckVerdict {
            thread_id,
            subject: representative.subject.clone(),
            is_stuck,
            awaiting_reply,
            days_waiting,
            waiting_on: responsibility.waiting_on,
            responsible_party: responsibility.party,
            last_sender: representative.sender_address(),
            last_activity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use hawk_core::config::default_question_indicators;
    use hawk_core::types::WaitingOn;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 20, 12, 0, 0).unwrap()
    }

    fn analyzer(threshold: u32) -> BottleneckAnalyzer {
        BottleneckAnalyzer::new(
            threshold,
            default_question_indicators(),
            ResponsibilityResolver::new(vec!["mycompany.com".to_string()], vec![]),
        )
    }

    fn record(thread: &str, sender: &str, body: &str, age: Duration) -> CommunicationRecord {
        CommunicationRecord {
            id: format!("{}-{}", thread, age.num_hours()),
            subject: thread.to_string(),
            sender: Some(sender.to_string()),
            recipients: vec![],
            body: body.to_string(),
            timestamp: Some(now() - age),
            thread_id: Some(thread.to_string()),
        }
    }

    #[test]
    fn test_days_waiting_floors() {
        assert_eq!(BottleneckAnalyzer::days_waiting(now() - Duration::hours(23), now()), 0);
        assert_eq!(BottleneckAnalyzer::days_waiting(now() - Duration::hours(24), now()), 1);
        assert_eq!(BottleneckAnalyzer::days_waiting(now() - Duration::hours(71), now()), 2);
        // Future timestamps round toward negative infinity
        assert_eq!(BottleneckAnalyzer::days_waiting(now() + Duration::hours(1), now()), -1);
    }

    #[test]
    fn test_old_question_is_stuck() {
        let recs = [record("t1", "john@tusd.edu", "Please advise on budget", Duration::days(5))];
        let analysis = analyzer(3).analyze(&recs, now());
        assert_eq!(analysis.verdicts.len(), 1);
        let v = &analysis.verdicts[0];
        assert!(v.is_stuck);
        assert_eq!(v.days_waiting, 5);
        assert_eq!(v.waiting_on, WaitingOn::Internal);
        assert_eq!(v.last_sender.as_deref(), Some("john@tusd.edu"));
    }

    #[test]
    fn test_old_statement_is_not_stuck() {
        let recs = [record("t1", "john@tusd.edu", "Thanks, all done.", Duration::days(30))];
        let analysis = analyzer(3).analyze(&recs, now());
        assert!(!analysis.verdicts[0].is_stuck);
        assert!(!analysis.verdicts[0].awaiting_reply);
    }

    #[test]
    fn test_recent_question_is_not_stuck() {
        let recs = [record("t1", "john@tusd.edu", "Can you send it?", Duration::days(2))];
        let analysis = analyzer(3).analyze(&recs, now());
        assert!(!analysis.verdicts[0].is_stuck);
        assert!(analysis.verdicts[0].awaiting_reply);
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let recs = [record("t1", "john@tusd.edu", "?", Duration::days(3))];
        assert!(analyzer(3).analyze(&recs, now()).verdicts[0].is_stuck);
    }

    #[test]
    fn test_never_stuck_below_threshold_for_any_threshold() {
        let recs: Vec<CommunicationRecord> = (0..15)
            .map(|d| record(&format!("t{}", d), "john@tusd.edu", "need your input?", Duration::days(d)))
            .collect();
        for threshold in 0..12u32 {
            let analysis = analyzer(threshold).analyze(&recs, now());
            for v in &analysis.verdicts {
                if v.days_waiting < i64::from(threshold) {
                    assert!(!v.is_stuck, "threshold {} days {}", threshold, v.days_waiting);
                } else {
                    assert!(v.is_stuck);
                }
            }
        }
    }

    #[test]
    fn test_thread_dedupe_keeps_most_recent() {
        let recs = [
            record("t1", "john@tusd.edu", "Could you review?", Duration::days(10)),
            record("t1", "me@mycompany.com", "Done, see attached.", Duration::days(1)),
        ];
        let analysis = analyzer(3).analyze(&recs, now());
        assert_eq!(analysis.verdicts.len(), 1);
        let v = &analysis.verdicts[0];
        assert_eq!(v.days_waiting, 1);
        assert!(!v.is_stuck);
        assert_eq!(v.waiting_on, WaitingOn::External);
    }

    #[test]
    fn test_threads_grouped_by_subject_without_thread_id() {
        let mut a = record("x", "john@tusd.edu", "question?", Duration::days(6));
        a.thread_id = None;
        a.subject = "TUSD Budget".to_string();
        let mut b = record("y", "me@mycompany.com", "answer", Duration::days(4));
        b.thread_id = None;
        b.subject = "RE: TUSD Budget".to_string();
        let analysis = analyzer(3).analyze([&a, &b], now());
        assert_eq!(analysis.verdicts.len(), 1);
        assert_eq!(analysis.verdicts[0].thread_id, "tusd budget");
        assert_eq!(analysis.verdicts[0].subject, "RE: TUSD Budget");
    }

    #[test]
    fn test_verdicts_sorted_longest_waiting_first() {
        let recs = [
            record("a", "john@tusd.edu", "?", Duration::days(4)),
            record("b", "john@tusd.edu", "?", Duration::days(12)),
            record("c", "john@tusd.edu", "?", Duration::days(7)),
        ];
        let analysis = analyzer(3).analyze(&recs, now());
        let order: Vec<&str> = analysis.verdicts.iter().map(|v| v.thread_id.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(analysis.stuck().count(), 3);
    }

    #[test]
    fn test_malformed_records_counted() {
        let mut bad = record("t1", "john@tusd.edu", "?", Duration::days(5));
        bad.timestamp = None;
        let mut anon = record("t2", "john@tusd.edu", "?", Duration::days(5));
        anon.sender = None;
        let analysis = analyzer(3).analyze([&bad, &anon], now());
        assert!(analysis.verdicts.is_empty());
        assert_eq!(analysis.skipped, 2);
    }

    #[test]
    fn test_custom_indicators_are_case_insensitive() {
        let analyzer = BottleneckAnalyzer::new(
            3,
            vec!["ASAP".to_string(), "".to_string()],
            ResponsibilityResolver::new(vec!["mycompany.com".to_string()], vec![]),
        );
        let urgent = record("t1", "john@tusd.edu", "send the contract asap", Duration::days(4));
        let plain = record("t2", "john@tusd.edu", "Is this ok?", Duration::days(4));
        assert!(analyzer.awaits_reply(&urgent));
        // "?" is not in the custom list; the empty indicator is dropped
        assert!(!analyzer.awaits_reply(&plain));
    }

    #[test]
    fn test_empty_input() {
        let analysis = analyzer(3).analyze(std::iter::empty(), now());
        assert!(analysis.verdicts.is_empty());
        assert_eq!(analysis.skipped, 0);
    }
}
