//! Daily send orchestration
//!
//! Fetch numbers, pick the word, then text every subscriber. Fetch failures
//! abort the run before anything is sent; a failure for one recipient is
//! recorded and the loop moves on.

use crate::error::Result;
use crate::sms::SmsSender;
use crate::store::NumberStore;
use crate::words::WordSelector;
use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{error, info};

pub const MESSAGE_SUFFIX: &str = "🖕";

/// Build the SMS body for a word
pub fn format_message(word: &str) -> String {
    format!("{} {}", word.to_uppercase(), MESSAGE_SUFFIX)
}

/// Result of sending to a single recipient
#[derive(Debug, Clone, PartialEq)]
pub struct SendOutcome {
    pub to: String,
    pub result: std::result::Result<(), String>,
}

/// Everything a daily run did
#[derive(Debug, Clone, PartialEq)]
pub struct DailyReport {
    pub word: String,
    pub body: String,
    pub outcomes: Vec<SendOutcome>,
}

impl DailyReport {
    pub fn sent(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.sent()
    }
}

/// Owns the store, the word selector and the SMS sender
pub struct Dispatcher {
    store: Mutex<NumberStore>,
    selector: WordSelector,
    sender: Arc<dyn SmsSender>,
}

impl Dispatcher {
    pub fn new(store: NumberStore, selector: WordSelector, sender: Arc<dyn SmsSender>) -> Self {
        Self {
            store: Mutex::new(store),
            selector,
            sender,
        }
    }

    /// Lock the number store. Poisoning is ignored: every store call is a
    /// single statement.
    pub fn store(&self) -> MutexGuard<'_, NumberStore> {
        self.store.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn selector(&self) -> &WordSelector {
        &self.selector
    }

    pub async fn send_one(&self, to: &str, body: &str) -> Result<()> {
        self.sender.send(to, body).await
    }

    /// Text today's word to every stored number
    pub async fn send_daily(&self, now: DateTime<Utc>) -> Result<DailyReport> {
        let numbers = {
            let store = self.store();
            store.list()?
        };
        let word = self.selector.todays_word(&now)?.to_string();
        let body = format_message(&word);

        let mut outcomes = Vec::with_capacity(numbers.len());
        for to in numbers {
            let result = match self.send_one(&to, &body).await {
                Ok(()) => {
                    info!(to = %to, "SMS sent successfully!");
                    Ok(())
                }
                Err(e) => {
                    error!(to = %to, error = %e, "SMS send failed");
                    Err(e.to_string())
                }
            };
            outcomes.push(SendOutcome { to, result });
        }

        let report = DailyReport { word, body, outcomes };
        info!(
            word = %report.word,
            sent = report.sent(),
            failed = report.failed(),
            "Daily send finished"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::words::epoch_start;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::collections::HashSet;

    /// Records every send; fails for numbers in `failing`
    #[derive(Default)]
    struct RecordingSender {
        sent: Mutex<Vec<(String, String)>>,
        failing: HashSet<String>,
    }

    #[async_trait]
    impl SmsSender for RecordingSender {
        async fn send(&self, to: &str, body: &str) -> Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((to.to_string(), body.to_string()));
            if self.failing.contains(to) {
                return Err(Error::Provider {
                    status: 400,
                    code: Some(21211),
                    message: "invalid number".to_string(),
                });
            }
            Ok(())
        }
    }

    fn able_baker() -> WordSelector {
        WordSelector::new(epoch_start(), vec!["able".to_string(), "baker".to_string()])
    }

    fn day_one() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 3, 27, 5, 0, 0).unwrap()
    }

    #[test]
    fn test_format_message() {
        assert_eq!(format_message("baker"), "BAKER 🖕");
        assert_eq!(format_message("Able"), "ABLE 🖕");
    }

    #[tokio::test]
    async fn test_send_daily_to_all() {
        let store = NumberStore::open_in_memory().unwrap();
        store.add("+16175551111").unwrap();
        store.add("+16175552222").unwrap();

        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Dispatcher::new(store, able_baker(), sender.clone());

        let report = dispatcher.send_daily(day_one()).await.unwrap();
        assert_eq!(report.word, "baker");
        assert_eq!(report.body, "BAKER 🖕");
        assert_eq!(report.sent(), 2);
        assert_eq!(report.failed(), 0);

        let sent = sender.sent.lock().unwrap();
        assert_eq!(sent.len(), 2);
        assert!(sent.iter().all(|(_, body)| body == "BAKER 🖕"));
    }

    #[tokio::test]
    async fn test_send_daily_no_numbers() {
        let store = NumberStore::open_in_memory().unwrap();
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Dispatcher::new(store, able_baker(), sender.clone());

        let report = dispatcher.send_daily(day_one()).await.unwrap();
        assert!(report.outcomes.is_empty());
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_continues() {
        let store = NumberStore::open_in_memory().unwrap();
        store.add("+16175551111").unwrap();
        store.add("+10000000000").unwrap();
        store.add("+16175552222").unwrap();

        let sender = Arc::new(RecordingSender {
            failing: HashSet::from(["+10000000000".to_string()]),
            ..Default::default()
        });
        let dispatcher = Dispatcher::new(store, able_baker(), sender.clone());

        let report = dispatcher.send_daily(day_one()).await.unwrap();
        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.sent(), 2);
        assert_eq!(report.failed(), 1);

        let failed = report
            .outcomes
            .iter()
            .find(|o| o.result.is_err())
            .unwrap();
        assert_eq!(failed.to, "+10000000000");
        assert_eq!(sender.sent.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_exhausted_word_sends_nothing() {
        let store = NumberStore::open_in_memory().unwrap();
        store.add("+16175551111").unwrap();

        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Dispatcher::new(store, able_baker(), sender.clone());

        let now = Utc.with_ymd_and_hms(2022, 3, 28, 5, 0, 0).unwrap();
        let result = dispatcher.send_daily(now).await;
        assert!(matches!(result, Err(Error::ExhaustedWordList { .. })));
        assert!(sender.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_fault_sends_nothing() {
        let store = NumberStore::open_in_memory().unwrap();
        let sender = Arc::new(RecordingSender::default());
        let dispatcher = Dispatcher::new(store, able_baker(), sender.clone());
        dispatcher.store().drop_table_for_test();

        let result = dispatcher.send_daily(day_one()).await;
        assert!(matches!(result, Err(Error::Sqlite(_))));
        assert!(sender.sent.lock().unwrap().is_empty());
    }
}
