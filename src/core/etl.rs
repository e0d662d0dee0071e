use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

/// Drives fetch → split → persist through a [`Pipeline`].
pub struct IngestEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> IngestEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting TMA ingest");
        self.monitor.log_stats("Start");

        // Extract
        let areas = self.pipeline.extract().await?;
        tracing::info!("Extracted {} areas", areas.len());
        self.monitor.log_stats("Extract");

        // Transform
        let result = self.pipeline.transform(areas).await?;
        tracing::info!(
            "Transformed {} areas ({} skipped)",
            result.areas.len(),
            result.skipped.len()
        );
        self.monitor.log_stats("Transform");

        // Load
        let output = self.pipeline.load(result).await?;
        tracing::info!("Area files written to: {}", output);
        self.monitor.log_stats("Load");
        self.monitor.log_final_stats();

        Ok(output)
    }
}
