//! Poll scheduler: the long-running loop that fetches, classifies, stores,
//! and announces new mail.
//!
//! One `Poller` owns its whole run state. `start` spawns the loop (polling
//! immediately, then on the configured interval), `stop` is cooperative and
//! idempotent, and interested parties watch a broadcast channel for
//! `PollerEvent`s instead of registering callbacks.
//!
//! Failure policy: consecutive cycle failures grow the delay exponentially
//! once three have accumulated, capped at ten minutes. An authentication
//! rejection is terminal and stops the loop after emitting `AuthFailed`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveTime};
use tokio::sync::{broadcast, Notify};
use tokio::task::JoinHandle;

use crate::ai::{self, AiProvider, AI_CONFIDENCE_THRESHOLD};
use crate::classifier::{classify_mail, extract_domain};
use crate::db::MailDb;
use crate::error::PollError;
use crate::mail_client::{MailClient, RawMail};
use crate::notify::{dispatch_new_mail, Notifier};
use crate::settings::AppSettings;
use crate::types::{Mail, MailCredentials};

/// Backoff ceiling in seconds.
pub const MAX_BACKOFF_SECS: u64 = 600;

/// Consecutive failures before the delay starts growing.
const BACKOFF_AFTER_FAILURES: u32 = 3;

/// Events announced on the poller's broadcast channel.
#[derive(Debug, Clone)]
pub enum PollerEvent {
    /// Newly inserted mails, in fetch order. Emitted regardless of the
    /// notification toggle; duplicates never appear here.
    NewMails(Vec<Mail>),
    /// The mail server rejected the credentials; polling has stopped.
    AuthFailed,
}

/// What a single cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was in flight, or the work-hours gate was closed.
    Skipped,
    Completed { fetched: usize, inserted: usize },
}

#[derive(Default)]
struct StopSignal {
    stopped: AtomicBool,
    notify: Notify,
}

struct RunHandle {
    stop: Arc<StopSignal>,
    task: JoinHandle<()>,
}

struct PollerInner {
    db: Arc<parking_lot::Mutex<MailDb>>,
    client: Arc<dyn MailClient>,
    notifier: Arc<dyn Notifier>,
    ai: Option<Arc<dyn AiProvider>>,
    events: broadcast::Sender<PollerEvent>,
    /// Serializes cycles; a cycle that finds it held reports `Skipped`.
    gate: tokio::sync::Mutex<()>,
}

pub struct Poller {
    inner: Arc<PollerInner>,
    current: parking_lot::Mutex<Option<RunHandle>>,
}

impl Poller {
    pub fn new(
        db: Arc<parking_lot::Mutex<MailDb>>,
        client: Arc<dyn MailClient>,
        notifier: Arc<dyn Notifier>,
        ai: Option<Arc<dyn AiProvider>>,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(PollerInner {
                db,
                client,
                notifier,
                ai,
                events,
                gate: tokio::sync::Mutex::new(()),
            }),
            current: parking_lot::Mutex::new(None),
        }
    }

    /// Subscribe to poller events. Safe to call before `start`.
    pub fn subscribe(&self) -> broadcast::Receiver<PollerEvent> {
        self.inner.events.subscribe()
    }

    /// Start polling. Any previous run is stopped first, which also resets
    /// the failure/backoff state. The first cycle runs immediately.
    pub fn start(&self, credentials: MailCredentials, settings: AppSettings) {
        self.stop();

        let stop = Arc::new(StopSignal::default());
        let inner = Arc::clone(&self.inner);
        let loop_stop = Arc::clone(&stop);

        let task = tokio::spawn(async move {
            let base = settings.polling_interval.max(1);
            let mut failures: u32 = 0;
            log::info!("poller: started, interval {base}s");

            loop {
                if loop_stop.stopped.load(Ordering::SeqCst) {
                    break;
                }

                match run_cycle(&inner, &credentials, &settings).await {
                    Ok(CycleOutcome::Skipped) => {}
                    Ok(CycleOutcome::Completed { fetched, inserted }) => {
                        failures = 0;
                        if inserted > 0 {
                            log::info!("poller: {inserted} new mails ({fetched} fetched)");
                        }
                    }
                    Err(e) if e.is_auth() => {
                        log::warn!("poller: authentication rejected, stopping");
                        let _ = inner.events.send(PollerEvent::AuthFailed);
                        break;
                    }
                    Err(e) => {
                        failures += 1;
                        log::warn!("poller: cycle failed ({failures} consecutive): {e}");
                    }
                }

                let delay = next_delay(base, failures);
                tokio::select! {
                    _ = tokio::time::sleep(delay) => {}
                    _ = loop_stop.notify.notified() => break,
                }
            }

            log::info!("poller: stopped");
        });

        *self.current.lock() = Some(RunHandle { stop, task });
    }

    /// Signal the loop to stop. Idempotent; an in-flight cycle completes
    /// before the loop exits.
    pub fn stop(&self) {
        if let Some(handle) = self.current.lock().take() {
            handle.stop.stopped.store(true, Ordering::SeqCst);
            handle.stop.notify.notify_waiters();
        }
    }

    pub fn is_running(&self) -> bool {
        self.current
            .lock()
            .as_ref()
            .is_some_and(|h| !h.task.is_finished())
    }

    /// Run one cycle outside the schedule. Shares the cycle gate with the
    /// loop, so a manual poll never overlaps a scheduled one.
    pub async fn poll_now(
        &self,
        credentials: &MailCredentials,
        settings: &AppSettings,
    ) -> Result<CycleOutcome, PollError> {
        run_cycle(&self.inner, credentials, settings).await
    }
}

/// Delay before the next cycle: the base interval until three consecutive
/// failures, then base * 2^(failures - 2), capped at `MAX_BACKOFF_SECS`.
fn next_delay(base_secs: u64, failures: u32) -> Duration {
    if failures < BACKOFF_AFTER_FAILURES {
        return Duration::from_secs(base_secs);
    }
    let multiplier = 1u64 << (failures - 2).min(32);
    Duration::from_secs(base_secs.saturating_mul(multiplier).min(MAX_BACKOFF_SECS))
}

/// Inclusive "HH:MM" window test. A start after the end wraps past
/// midnight. Unparseable bounds fail open.
fn window_contains(now: NaiveTime, start: &str, end: &str) -> bool {
    let (Ok(start), Ok(end)) = (
        NaiveTime::parse_from_str(start, "%H:%M"),
        NaiveTime::parse_from_str(end, "%H:%M"),
    ) else {
        return true;
    };

    if start <= end {
        now >= start && now <= end
    } else {
        now >= start || now <= end
    }
}

fn within_work_hours(settings: &AppSettings) -> bool {
    window_contains(
        Local::now().time(),
        &settings.work_hours_start,
        &settings.work_hours_end,
    )
}

async fn run_cycle(
    inner: &PollerInner,
    credentials: &MailCredentials,
    settings: &AppSettings,
) -> Result<CycleOutcome, PollError> {
    let Ok(_gate) = inner.gate.try_lock() else {
        log::debug!("poller: cycle already in flight, skipping");
        return Ok(CycleOutcome::Skipped);
    };

    if settings.work_hours_only && !within_work_hours(settings) {
        log::debug!("poller: outside work hours, skipping cycle");
        return Ok(CycleOutcome::Skipped);
    }

    // The store lock is never held across an await
    let (since, rules) = {
        let db = inner.db.lock();
        let since = db.last_received_time().map_err(PollError::Store)?;
        let rules = db.category_rules().map_err(PollError::Store)?;
        (since, rules)
    };

    let fetched = inner
        .client
        .fetch_since(credentials, since.as_deref())
        .await?;
    if fetched.is_empty() {
        return Ok(CycleOutcome::Completed {
            fetched: 0,
            inserted: 0,
        });
    }

    let company_domain = if settings.company_domain.is_empty() {
        extract_domain(&credentials.email)
    } else {
        settings.company_domain.to_lowercase()
    };

    let mut prepared = Vec::with_capacity(fetched.len());
    for raw in fetched {
        let mut category = classify_mail(&raw.subject, &raw.sender_email, &rules, &company_domain);

        if settings.ai_categorization {
            if let Some(provider) = &inner.ai {
                match ai::classify::classify_mail(provider.as_ref(), &raw.subject, &raw.sender_email)
                    .await
                {
                    Ok(verdict) if verdict.confidence >= AI_CONFIDENCE_THRESHOLD => {
                        category = verdict.category;
                    }
                    Ok(verdict) => {
                        log::debug!(
                            "poller: ai confidence {:.2} below threshold, keeping {}",
                            verdict.confidence,
                            category.as_str()
                        );
                    }
                    Err(e) => {
                        log::warn!("poller: ai classification failed, keeping rule verdict: {e}");
                    }
                }
            }
        }

        prepared.push(build_mail(raw, category, settings));
    }

    let fetched_count = prepared.len();
    let mut new_mails = Vec::new();
    {
        let db = inner.db.lock();
        for mail in prepared {
            if db.insert_mail(&mail).map_err(PollError::Store)? {
                new_mails.push(mail);
            }
        }
    }

    if !new_mails.is_empty() {
        if settings.notifications_enabled {
            for mail in &new_mails {
                dispatch_new_mail(inner.notifier.as_ref(), mail);
            }
        }
        let _ = inner.events.send(PollerEvent::NewMails(new_mails.clone()));
    }

    // Retention cleanup runs last, after delivery, so a cleanup failure
    // counts toward the backoff counter without losing the new mails
    if settings.auto_cleanup_days > 0 {
        let removed = inner
            .db
            .lock()
            .cleanup_old_mails(settings.auto_cleanup_days)
            .map_err(PollError::Store)?;
        if removed > 0 {
            log::info!(
                "poller: removed {removed} mails older than {} days",
                settings.auto_cleanup_days
            );
        }
    }

    Ok(CycleOutcome::Completed {
        fetched: fetched_count,
        inserted: new_mails.len(),
    })
}

fn build_mail(raw: RawMail, category: crate::types::MailCategory, settings: &AppSettings) -> Mail {
    Mail {
        id: raw.id,
        sender_name: raw.sender_name,
        sender_email: raw.sender_email,
        subject: raw.subject,
        received_at: raw.received_at,
        category,
        web_link: settings.webmail_url.clone(),
        // Dispatch is fire-and-forget; never pre-recorded as delivered
        notified: false,
        is_read: false,
        project_id: None,
        message_id: raw.message_id,
        created_at: String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use crate::mail_client::FetchError;
    use crate::types::MailCategory;
    use async_trait::async_trait;
    use std::collections::VecDeque;

    struct ScriptedClient {
        script: parking_lot::Mutex<VecDeque<Result<Vec<RawMail>, FetchError>>>,
    }

    impl ScriptedClient {
        fn new(script: Vec<Result<Vec<RawMail>, FetchError>>) -> Self {
            Self {
                script: parking_lot::Mutex::new(script.into()),
            }
        }
    }

    #[async_trait]
    impl MailClient for ScriptedClient {
        async fn fetch_since(
            &self,
            _credentials: &MailCredentials,
            _since: Option<&str>,
        ) -> Result<Vec<RawMail>, FetchError> {
            self.script.lock().pop_front().unwrap_or(Ok(Vec::new()))
        }
    }

    struct RecordingNotifier {
        posted: parking_lot::Mutex<Vec<String>>,
    }

    impl RecordingNotifier {
        fn new() -> Self {
            Self {
                posted: parking_lot::Mutex::new(Vec::new()),
            }
        }
    }

    impl Notifier for RecordingNotifier {
        fn permission_granted(&self) -> bool {
            true
        }

        fn notify(&self, title: &str, _body: &str) -> Result<(), String> {
            self.posted.lock().push(title.to_string());
            Ok(())
        }
    }

    struct CannedProvider {
        reply: String,
    }

    #[async_trait]
    impl AiProvider for CannedProvider {
        async fn complete(&self, _system: &str, _user: &str) -> Result<String, AiError> {
            Ok(self.reply.clone())
        }
    }

    fn raw(id: &str, subject: &str, sender: &str, received_at: &str) -> RawMail {
        RawMail {
            id: id.to_string(),
            sender_name: "Kim".to_string(),
            sender_email: sender.to_string(),
            subject: subject.to_string(),
            received_at: received_at.to_string(),
            message_id: String::new(),
        }
    }

    fn credentials() -> MailCredentials {
        MailCredentials {
            host: "imap.example.com".to_string(),
            port: 993,
            email: "me@mycompany.com".to_string(),
            password: "secret".to_string(),
        }
    }

    fn test_db() -> Arc<parking_lot::Mutex<MailDb>> {
        Arc::new(parking_lot::Mutex::new(MailDb::open_in_memory().unwrap()))
    }

    fn poller_with(
        db: Arc<parking_lot::Mutex<MailDb>>,
        client: ScriptedClient,
        notifier: Arc<RecordingNotifier>,
        ai: Option<Arc<dyn AiProvider>>,
    ) -> Poller {
        Poller::new(db, Arc::new(client), notifier, ai)
    }

    #[test]
    fn test_next_delay_backoff_table() {
        assert_eq!(next_delay(60, 0), Duration::from_secs(60));
        assert_eq!(next_delay(60, 1), Duration::from_secs(60));
        assert_eq!(next_delay(60, 2), Duration::from_secs(60));
        assert_eq!(next_delay(60, 3), Duration::from_secs(120));
        assert_eq!(next_delay(60, 4), Duration::from_secs(240));
        assert_eq!(next_delay(60, 5), Duration::from_secs(480));
        assert_eq!(next_delay(60, 6), Duration::from_secs(600));
        assert_eq!(next_delay(60, 50), Duration::from_secs(600));
    }

    #[test]
    fn test_window_contains() {
        let t = |s: &str| NaiveTime::parse_from_str(s, "%H:%M").unwrap();

        assert!(window_contains(t("09:00"), "09:00", "18:00"));
        assert!(window_contains(t("18:00"), "09:00", "18:00"));
        assert!(window_contains(t("12:30"), "09:00", "18:00"));
        assert!(!window_contains(t("08:59"), "09:00", "18:00"));
        assert!(!window_contains(t("18:01"), "09:00", "18:00"));

        // Overnight window
        assert!(window_contains(t("23:00"), "22:00", "06:00"));
        assert!(window_contains(t("05:00"), "22:00", "06:00"));
        assert!(!window_contains(t("12:00"), "22:00", "06:00"));

        // Unparseable bounds fail open
        assert!(window_contains(t("03:00"), "nine", "18:00"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_cycle_inserts_classifies_and_notifies() {
        let _ = env_logger::builder().is_test(true).try_init();
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![
            raw("m1", "[긴급] 서버 장애", "ops@vendor.com", "2026-08-01T09:00:00+00:00"),
            raw("m2", "주간 보고", "kim@mycompany.com", "2026-08-01T09:05:00+00:00"),
        ])]);

        let poller = poller_with(Arc::clone(&db), client, Arc::clone(&notifier), None);
        let mut rx = poller.subscribe();
        poller.start(credentials(), AppSettings::default());

        let event = rx.recv().await.unwrap();
        let PollerEvent::NewMails(mails) = event else {
            panic!("expected NewMails");
        };
        assert_eq!(mails.len(), 2);
        assert_eq!(mails[0].category, MailCategory::Urgent);
        assert_eq!(mails[1].category, MailCategory::Internal);

        // Notifications fired in fetch order
        let posted = notifier.posted.lock().clone();
        assert_eq!(posted.len(), 2);
        assert!(posted[0].starts_with("🔴"));

        assert_eq!(db.lock().get_mails(None).unwrap().len(), 2);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicates_are_not_re_emitted() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![
            Ok(vec![
                raw("m1", "one", "a@vendor.com", "2026-08-01T09:00:00+00:00"),
                raw("m2", "two", "a@vendor.com", "2026-08-01T09:01:00+00:00"),
            ]),
            // Overlapping refetch: m2 again plus one genuinely new mail
            Ok(vec![
                raw("m2", "two", "a@vendor.com", "2026-08-01T09:01:00+00:00"),
                raw("m3", "three", "a@vendor.com", "2026-08-01T09:02:00+00:00"),
            ]),
        ]);

        let poller = poller_with(Arc::clone(&db), client, notifier, None);
        let mut rx = poller.subscribe();
        poller.start(credentials(), AppSettings::default());

        let PollerEvent::NewMails(first) = rx.recv().await.unwrap() else {
            panic!("expected NewMails");
        };
        assert_eq!(first.len(), 2);

        let PollerEvent::NewMails(second) = rx.recv().await.unwrap() else {
            panic!("expected NewMails");
        };
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].id, "m3");

        assert_eq!(db.lock().get_mails(None).unwrap().len(), 3);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_events_still_emitted_with_notifications_disabled() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "hello",
            "a@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);

        let poller = poller_with(db, client, Arc::clone(&notifier), None);
        let mut rx = poller.subscribe();

        let settings = AppSettings {
            notifications_enabled: false,
            ..AppSettings::default()
        };
        poller.start(credentials(), settings);

        let PollerEvent::NewMails(mails) = rx.recv().await.unwrap() else {
            panic!("expected NewMails");
        };
        assert_eq!(mails.len(), 1);
        assert!(notifier.posted.lock().is_empty());
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_auth_failure_emits_event_and_stops() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Err(FetchError::Auth)]);

        let poller = poller_with(db, client, notifier, None);
        let mut rx = poller.subscribe();
        poller.start(credentials(), AppSettings::default());

        assert!(matches!(rx.recv().await.unwrap(), PollerEvent::AuthFailed));

        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_low_confidence_ai_verdict_keeps_rule_category() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "[긴급] 배포 실패",
            "ops@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);
        let provider: Arc<dyn AiProvider> = Arc::new(CannedProvider {
            reply: r#"{"category": "system", "confidence": 0.5, "reason": "unsure"}"#.to_string(),
        });

        let poller = poller_with(Arc::clone(&db), client, notifier, Some(provider));
        let mut rx = poller.subscribe();

        let settings = AppSettings {
            ai_categorization: true,
            ..AppSettings::default()
        };
        poller.start(credentials(), settings);

        let PollerEvent::NewMails(mails) = rx.recv().await.unwrap() else {
            panic!("expected NewMails");
        };
        assert_eq!(mails[0].category, MailCategory::Urgent);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_confident_ai_verdict_overrides_rule_category() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "[긴급] newsletter",
            "news@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);
        let provider: Arc<dyn AiProvider> = Arc::new(CannedProvider {
            reply: r#"{"category": "system", "confidence": 0.95, "reason": "bulk mail"}"#
                .to_string(),
        });

        let poller = poller_with(Arc::clone(&db), client, notifier, Some(provider));
        let mut rx = poller.subscribe();

        let settings = AppSettings {
            ai_categorization: true,
            ..AppSettings::default()
        };
        poller.start(credentials(), settings);

        let PollerEvent::NewMails(mails) = rx.recv().await.unwrap() else {
            panic!("expected NewMails");
        };
        assert_eq!(mails[0].category, MailCategory::System);
        poller.stop();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_replaces_previous_run() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "hello",
            "a@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);

        let poller = poller_with(db, client, notifier, None);
        let mut rx = poller.subscribe();
        poller.start(credentials(), AppSettings::default());
        rx.recv().await.unwrap();
        assert!(poller.is_running());

        poller.start(credentials(), AppSettings::default());
        assert!(poller.is_running());

        poller.stop();
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
        assert!(!poller.is_running());
    }

    #[tokio::test]
    async fn test_poll_now_runs_one_cycle() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "hello",
            "a@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);

        let poller = poller_with(Arc::clone(&db), client, notifier, None);
        let outcome = poller
            .poll_now(&credentials(), &AppSettings::default())
            .await
            .unwrap();
        assert_eq!(
            outcome,
            CycleOutcome::Completed {
                fetched: 1,
                inserted: 1
            }
        );
        assert_eq!(db.lock().get_mails(None).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stored_mails_are_never_pre_marked_notified() {
        let db = test_db();
        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "hello",
            "a@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);

        let poller = poller_with(Arc::clone(&db), client, Arc::clone(&notifier), None);
        poller
            .poll_now(&credentials(), &AppSettings::default())
            .await
            .unwrap();

        // The notification did fire, but the stored record must not claim
        // delivery up front
        assert_eq!(notifier.posted.lock().len(), 1);
        let stored = db.lock().get_mails(None).unwrap();
        assert!(!stored[0].notified);
    }

    #[tokio::test]
    async fn test_cleanup_failure_fails_the_cycle_after_delivery() {
        let db = test_db();
        {
            let db = db.lock();
            db.insert_mail(&Mail {
                id: "stale".to_string(),
                sender_name: "Kim".to_string(),
                sender_email: "kim@mycompany.com".to_string(),
                subject: "old".to_string(),
                received_at: "2026-06-01T09:00:00+00:00".to_string(),
                category: MailCategory::Internal,
                web_link: String::new(),
                notified: false,
                is_read: false,
                project_id: None,
                message_id: String::new(),
                created_at: String::new(),
            })
            .unwrap();
            // Push the stale row past the retention window, then make any
            // delete of it fail
            db.conn_ref()
                .execute_batch(
                    "UPDATE mails SET created_at = datetime(created_at, '-40 days')
                     WHERE id = 'stale';
                     CREATE TRIGGER block_delete BEFORE DELETE ON mails
                     BEGIN SELECT RAISE(ABORT, 'delete blocked'); END;",
                )
                .unwrap();
        }

        let notifier = Arc::new(RecordingNotifier::new());
        let client = ScriptedClient::new(vec![Ok(vec![raw(
            "m1",
            "hello",
            "a@vendor.com",
            "2026-08-01T09:00:00+00:00",
        )])]);

        let poller = poller_with(Arc::clone(&db), client, Arc::clone(&notifier), None);
        let mut rx = poller.subscribe();

        let err = poller
            .poll_now(&credentials(), &AppSettings::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PollError::Store(_)));

        // The new mail was stored, notified, and emitted before cleanup ran
        assert_eq!(notifier.posted.lock().len(), 1);
        let PollerEvent::NewMails(mails) = rx.try_recv().unwrap() else {
            panic!("expected NewMails");
        };
        assert_eq!(mails[0].id, "m1");
    }
}
