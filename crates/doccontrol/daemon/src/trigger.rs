//! Periodic effectivity sweep trigger

use crate::config::SchedulerConfig;
use crate::error::DaemonResult;
use chrono::{DateTime, Utc};
use doccontrol_engine::DocumentControl;
use doccontrol_types::PromotionOutcome;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::time::{interval, Duration};

/// Tally of one sweep run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub promoted: usize,
    pub obsoleted: usize,
    pub forced_terminations: usize,
    pub skipped: usize,
    /// Events past their date plus the grace window before this run
    pub overdue: usize,
}

impl SweepReport {
    pub fn processed(&self) -> usize {
        self.promoted + self.obsoleted + self.forced_terminations + self.skipped
    }
}

/// Drives [`DocumentControl::sweep`] on an interval and on demand
pub struct SweepTrigger {
    config: SchedulerConfig,
    engine: Arc<DocumentControl>,
    trigger_tx: mpsc::Sender<()>,
    running: Arc<RwLock<bool>>,
}

impl SweepTrigger {
    pub fn new(
        config: SchedulerConfig,
        engine: Arc<DocumentControl>,
    ) -> (Arc<Self>, mpsc::Receiver<()>) {
        let (trigger_tx, trigger_rx) = mpsc::channel(10);

        let trigger = Arc::new(Self {
            config,
            engine,
            trigger_tx,
            running: Arc::new(RwLock::new(false)),
        });

        (trigger, trigger_rx)
    }

    /// Request an immediate sweep
    pub async fn trigger_now(&self) {
        let _ = self.trigger_tx.send(()).await;
    }

    /// One sweep at `now`: report missed windows, then process due events
    pub fn run_once(&self, now: DateTime<Utc>) -> DaemonResult<SweepReport> {
        let overdue = self.engine.overdue_events(now)?;
        let results = self.engine.sweep(now)?;

        let mut report = SweepReport {
            overdue: overdue.len(),
            ..Default::default()
        };
        for result in &results {
            match result.outcome {
                PromotionOutcome::Promoted { .. } => report.promoted += 1,
                PromotionOutcome::Obsoleted => report.obsoleted += 1,
                PromotionOutcome::ForcedTermination { .. } => report.forced_terminations += 1,
                PromotionOutcome::Skipped { .. } => report.skipped += 1,
            }
        }

        if report.processed() > 0 || report.overdue > 0 {
            tracing::info!(
                promoted = report.promoted,
                obsoleted = report.obsoleted,
                forced_terminations = report.forced_terminations,
                skipped = report.skipped,
                overdue = report.overdue,
                "Effectivity sweep finished"
            );
        }
        Ok(report)
    }

    /// Run until [`stop`](Self::stop) is called or the trigger channel closes
    pub async fn start(self: Arc<Self>, mut trigger_rx: mpsc::Receiver<()>) {
        {
            let mut running = self.running.write().await;
            *running = true;
        }

        tracing::info!(
            interval_secs = self.config.sweep_interval_secs,
            "Sweep trigger started"
        );

        let mut ticker = interval(Duration::from_secs(self.config.sweep_interval_secs.max(1)));
        // The first tick completes immediately
        if !self.config.run_on_start {
            ticker.tick().await;
        }

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.run_once(Utc::now()) {
                        tracing::error!(error = %e, "Effectivity sweep failed");
                    }
                }
                Some(_) = trigger_rx.recv() => {
                    if let Err(e) = self.run_once(Utc::now()) {
                        tracing::error!(error = %e, "Triggered sweep failed");
                    }
                }
                else => break,
            }

            let running = self.running.read().await;
            if !*running {
                break;
            }
        }

        tracing::info!("Sweep trigger stopped");
    }

    /// Stop after the current iteration
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}
