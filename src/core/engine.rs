use crate::domain::ports::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// 驅動整個分流流程,並在結束時清理連線
///
/// Owns a [`Pipeline`] and runs its phases in order. The mailbox logout in
/// `finalize` happens whether the run succeeded or not, so an analysis
/// failure never leaves a session dangling on the server.
pub struct TriageEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> TriageEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    /// Run extract, transform and load, then clean up. Returns the load
    /// phase's summary line.
    pub async fn run(&self) -> Result<String> {
        let result = self.execute().await;

        if let Err(e) = self.pipeline.finalize().await {
            tracing::warn!("⚠️ Cleanup after the run failed: {}", e);
        }
        self.monitor.log_final_stats();

        result
    }

    async fn execute(&self) -> Result<String> {
        tracing::info!("🚀 Starting triage run...");

        tracing::info!("📥 Extracting unread messages...");
        let messages = self.pipeline.extract().await?;
        tracing::info!("📥 Extracted {} message(s)", messages.len());
        self.monitor.log_stats("Extract");

        tracing::info!("🔍 Analyzing messages...");
        let report = self.pipeline.transform(messages).await?;
        tracing::info!("🔍 Analyzed {} message(s)", report.total());
        self.monitor.log_stats("Transform");

        tracing::info!("💾 Archiving results...");
        let summary = self.pipeline.load(report).await?;
        self.monitor.log_stats("Load");

        Ok(summary)
    }
}
