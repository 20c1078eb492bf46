use crate::monitor::{RecordState, TimerRegistry};
use anyhow::Result;
use prometheus::{opts, GaugeVec, IntGaugeVec, Registry, TextEncoder};
use tracing::debug;

// Prometheus view of a timer registry
pub struct TimerMetrics {
    registry: Registry,
    pub section_duration: GaugeVec, // Last closed duration
    pub section_pending: IntGaugeVec,
}

impl TimerMetrics {
    /// # Errors
    /// Will return an error if the metrics can't be registered
    pub fn new() -> Result<Self> {
        let registry = Registry::new();

        let section_duration = GaugeVec::new(
            opts!(
                "section_duration_seconds",
                "Last measured duration of a named section in seconds"
            ),
            &["label"],
        )?;

        let section_pending = IntGaugeVec::new(
            opts!(
                "section_pending",
                "Section timer state (1 = in progress, 0 = closed)"
            ),
            &["label"],
        )?;

        registry.register(Box::new(section_duration.clone()))?;
        registry.register(Box::new(section_pending.clone()))?;

        Ok(Self {
            registry,
            section_duration,
            section_pending,
        })
    }

    /// Replaces every gauge with the registry's current entries, labels no
    /// longer in the registry are dropped.
    pub fn record(&self, timers: &TimerRegistry) {
        self.section_duration.reset();
        self.section_pending.reset();

        for record in timers.snapshot() {
            let labels = [record.label.as_str()];

            match record.state {
                RecordState::Pending => {
                    self.section_pending.with_label_values(&labels).set(1);
                }
                RecordState::Closed { seconds } => {
                    self.section_pending.with_label_values(&labels).set(0);
                    self.section_duration.with_label_values(&labels).set(seconds);
                }
            }
        }

        debug!("metrics refreshed from {} timers", timers.len());
    }

    /// Text exposition format.
    /// # Errors
    /// Will return an error if encoding fails
    pub fn encode(&self) -> Result<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();

        let mut metrics_str = String::new();
        encoder.encode_utf8(&metric_families, &mut metrics_str)?;

        Ok(metrics_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{thread, time::Duration};

    #[test]
    fn test_record_closed_and_pending() -> Result<()> {
        let timers = TimerRegistry::new();
        let metrics = TimerMetrics::new()?;

        timers.begin("load");
        thread::sleep(Duration::from_millis(5));
        timers.end("load")?;
        timers.begin("render");

        metrics.record(&timers);

        let load = metrics.section_duration.with_label_values(&["load"]).get();
        assert!(load >= 0.005, "load = {load}");
        assert_eq!(metrics.section_pending.with_label_values(&["load"]).get(), 0);
        assert_eq!(
            metrics.section_pending.with_label_values(&["render"]).get(),
            1
        );

        Ok(())
    }

    #[test]
    fn test_encode() -> Result<()> {
        let timers = TimerRegistry::new();
        let metrics = TimerMetrics::new()?;

        timers.measure("step", || ());
        metrics.record(&timers);

        let text = metrics.encode()?;

        assert!(text.contains("# TYPE section_duration_seconds gauge"));
        assert!(text.contains("section_pending{label=\"step\"} 0"));

        Ok(())
    }

    #[test]
    fn test_record_drops_cleared_labels() -> Result<()> {
        let timers = TimerRegistry::new();
        let metrics = TimerMetrics::new()?;

        timers.measure("gone", || ());
        metrics.record(&timers);
        assert!(metrics.encode()?.contains("label=\"gone\""));

        timers.clear();
        timers.begin("fresh");
        metrics.record(&timers);

        let text = metrics.encode()?;
        assert!(!text.contains("label=\"gone\""));
        assert!(text.contains("section_pending{label=\"fresh\"} 1"));

        Ok(())
    }

    #[test]
    fn test_restarted_label_drops_old_duration() -> Result<()> {
        let timers = TimerRegistry::new();
        let metrics = TimerMetrics::new()?;

        timers.measure("step", || ());
        metrics.record(&timers);

        timers.begin("step");
        metrics.record(&timers);

        let text = metrics.encode()?;
        assert!(!text.contains("section_duration_seconds{label=\"step\"}"));
        assert!(text.contains("section_pending{label=\"step\"} 1"));

        Ok(())
    }

    #[test]
    fn test_pending_never_sets_duration() -> Result<()> {
        let timers = TimerRegistry::new();
        let metrics = TimerMetrics::new()?;

        timers.begin("open");
        metrics.record(&timers);

        let text = metrics.encode()?;
        assert!(!text.contains("section_duration_seconds{label=\"open\"}"));

        Ok(())
    }
}
