mod common {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use chrono::{DateTime, TimeZone, Utc};
    use seatwatch::config::MonitorConfig;
    use seatwatch::monitoring::{
        AlertKind, ClassName, ClassNumber, DeliveryError, FetchError, Notifier, RenderedAlert,
        SeatMonitor, SeatStatus, SectionSnapshot, SnapshotSource,
    };

    pub(super) fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 2, 8, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    pub(super) fn minutes(count: i64) -> chrono::Duration {
        chrono::Duration::minutes(count)
    }

    pub(super) fn section(status: SeatStatus) -> SectionSnapshot {
        SectionSnapshot {
            class_number: ClassNumber::new("76543"),
            class_name: ClassName::new("PHY 121"),
            status,
            title: "University Physics I: Mechanics".to_string(),
            instructor: "Emmy Noether".to_string(),
            seats: if status.is_open() {
                "2 of 200".to_string()
            } else {
                "0 of 200".to_string()
            },
        }
    }

    #[derive(Default)]
    pub(super) struct MemorySource {
        sections: Mutex<HashMap<ClassName, Vec<SectionSnapshot>>>,
        calls: AtomicUsize,
    }

    impl MemorySource {
        pub(super) fn publish(&self, snapshot: SectionSnapshot) {
            self.sections
                .lock()
                .expect("lock")
                .insert(snapshot.class_name.clone(), vec![snapshot]);
        }

        pub(super) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait::async_trait]
    impl SnapshotSource for MemorySource {
        async fn fetch(
            &self,
            class_name: &ClassName,
            _term: &str,
        ) -> Result<Vec<SectionSnapshot>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .sections
                .lock()
                .expect("lock")
                .get(class_name)
                .cloned()
                .unwrap_or_default())
        }
    }

    #[derive(Default)]
    pub(super) struct MemoryNotifier {
        events: Mutex<Vec<RenderedAlert>>,
    }

    impl MemoryNotifier {
        pub(super) fn events(&self) -> Vec<RenderedAlert> {
            self.events.lock().expect("lock").clone()
        }

        pub(super) fn kinds(&self) -> Vec<AlertKind> {
            self.events().into_iter().map(|alert| alert.kind).collect()
        }
    }

    #[async_trait::async_trait]
    impl Notifier for MemoryNotifier {
        async fn deliver(&self, alert: &RenderedAlert) -> Result<(), DeliveryError> {
            self.events.lock().expect("lock").push(alert.clone());
            Ok(())
        }
    }

    pub(super) fn config() -> MonitorConfig {
        MonitorConfig {
            ntfy_topic: "physics-seats".to_string(),
            fetch_timeout: Duration::from_millis(250),
            delivery_timeout: Duration::from_millis(250),
            ..MonitorConfig::default()
        }
    }

    pub(super) fn build(
        config: &MonitorConfig,
    ) -> (
        SeatMonitor<MemorySource, MemoryNotifier>,
        Arc<MemorySource>,
        Arc<MemoryNotifier>,
    ) {
        let source = Arc::new(MemorySource::default());
        let notifier = Arc::new(MemoryNotifier::default());
        let monitor = SeatMonitor::new(source.clone(), notifier.clone(), config);
        (monitor, source, notifier)
    }
}

mod lifecycle {
    use super::common::*;
    use seatwatch::monitoring::{AlertKind, ClassNumber, SeatStatus};

    #[tokio::test]
    async fn open_remind_close_and_reopen() {
        let (monitor, source, notifier) = build(&config());
        let class_number = ClassNumber::new("76543");

        source.publish(section(SeatStatus::Full));
        monitor
            .track(section(SeatStatus::Full))
            .await
            .expect("track succeeds");
        assert!(notifier.events().is_empty());

        source.publish(section(SeatStatus::Open));
        let report = monitor.reconcile(t0()).await;
        assert_eq!(report.alerts, 1);
        assert_eq!(notifier.kinds(), vec![AlertKind::SeatOpened]);

        assert_eq!(monitor.remind(t0() + minutes(20)).await.delivered, 0);
        assert_eq!(monitor.remind(t0() + minutes(60)).await.delivered, 1);
        assert_eq!(monitor.remind(t0() + minutes(90)).await.delivered, 0);
        assert_eq!(monitor.remind(t0() + minutes(125)).await.delivered, 1);

        let reminders: Vec<_> = notifier
            .events()
            .into_iter()
            .filter(|alert| alert.kind == AlertKind::Reminder)
            .collect();
        assert_eq!(reminders.len(), 2);
        assert!(reminders[0].message.contains("(1/10)"));
        assert!(reminders[1].message.contains("(2/10)"));
        assert!(reminders[1].body().contains("Instructor: Emmy Noether"));

        source.publish(section(SeatStatus::Full));
        monitor.reconcile(t0() + minutes(130)).await;
        assert_eq!(notifier.kinds().last(), Some(&AlertKind::SeatClosed));
        assert_eq!(monitor.remind(t0() + minutes(300)).await.delivered, 0);

        source.publish(section(SeatStatus::Open));
        monitor.reconcile(t0() + minutes(400)).await;
        let state = monitor
            .notification_state(&class_number)
            .expect("tracked state");
        assert_eq!(state.reminder_count, 1);
        assert_eq!(state.last_sent_at, Some(t0() + minutes(400)));
        assert_eq!(
            notifier.kinds(),
            vec![
                AlertKind::SeatOpened,
                AlertKind::Reminder,
                AlertKind::Reminder,
                AlertKind::SeatClosed,
                AlertKind::SeatOpened,
            ]
        );
    }

    #[tokio::test]
    async fn state_view_reflects_tracked_sections() {
        let (monitor, source, _notifier) = build(&config());
        source.publish(section(SeatStatus::Open));

        monitor
            .track(section(SeatStatus::Full))
            .await
            .expect("track succeeds");

        let view = monitor.state_view();
        assert_eq!(view.settings.term_name, "Fall 2025");
        assert_eq!(view.settings.ntfy_topic, "physics-seats");
        assert_eq!(view.tracked_classes.len(), 1);
        assert_eq!(view.tracked_classes[0].status, SeatStatus::Open);
    }
}

mod scheduling {
    use std::time::Duration;

    use super::common::*;
    use seatwatch::config::MonitorConfig;
    use seatwatch::monitoring::{AlertKind, SeatStatus};

    #[tokio::test]
    async fn scheduler_runs_both_jobs_until_shutdown() {
        let config = MonitorConfig {
            reconcile_interval: Duration::from_millis(20),
            reminder_tick: Duration::from_millis(20),
            ..config()
        };
        let (monitor, source, notifier) = build(&config);
        source.publish(section(SeatStatus::Open));
        monitor
            .track(section(SeatStatus::Full))
            .await
            .expect("track succeeds");
        let calls_after_track = source.calls();

        let scheduler = monitor.start_scheduler();
        tokio::time::sleep(Duration::from_millis(120)).await;
        scheduler.shutdown().await;

        let calls_at_shutdown = source.calls();
        assert!(calls_at_shutdown > calls_after_track);
        assert_eq!(notifier.kinds(), vec![AlertKind::SeatOpened]);

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(source.calls(), calls_at_shutdown, "no cycles after shutdown");
    }
}
