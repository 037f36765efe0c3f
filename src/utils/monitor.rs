use std::time::{Duration, Instant};

#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// 單一階段的耗時紀錄
#[derive(Debug, Clone, serde::Serialize)]
pub struct StageTiming {
    pub stage: String,
    pub duration_ms: u128,
}

/// 依序記錄各階段耗時
#[derive(Debug, Default)]
pub struct StageClock {
    timings: Vec<StageTiming>,
}

impl StageClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, stage: &str, started: Instant) -> Duration {
        let elapsed = started.elapsed();
        self.timings.push(StageTiming {
            stage: stage.to_string(),
            duration_ms: elapsed.as_millis(),
        });
        elapsed
    }

    pub fn timings(&self) -> &[StageTiming] {
        &self.timings
    }

    pub fn into_timings(self) -> Vec<StageTiming> {
        self.timings
    }

    pub fn total(&self) -> Duration {
        self.timings
            .iter()
            .map(|t| Duration::from_millis(t.duration_ms as u64))
            .sum()
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct SystemStats {
    pub cpu_usage: f32,
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
pub struct SystemMonitor {
    inner: Option<Mutex<MonitorState>>,
    start_time: Instant,
}

#[cfg(feature = "cli")]
struct MonitorState {
    system: System,
    pid: Pid,
    peak_memory_mb: u64,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        // 取不到 PID 時直接停用監控
        let inner = if enabled {
            sysinfo::get_current_pid().ok().map(|pid| {
                let mut system = System::new();
                system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
                Mutex::new(MonitorState {
                    system,
                    pid,
                    peak_memory_mb: 0,
                })
            })
        } else {
            None
        };

        Self {
            inner,
            start_time: Instant::now(),
        }
    }

    pub fn get_stats(&self) -> Option<SystemStats> {
        let mut state = self.inner.as_ref()?.lock().ok()?;
        let pid = state.pid;
        state
            .system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        let (cpu_usage, memory_mb) = {
            let process = state.system.process(pid)?;
            (process.cpu_usage(), process.memory() / 1024 / 1024)
        };
        state.peak_memory_mb = state.peak_memory_mb.max(memory_mb);

        Some(SystemStats {
            cpu_usage,
            memory_usage_mb: memory_mb,
            peak_memory_mb: state.peak_memory_mb,
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&self, stage: &str) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                stage,
                stats.cpu_usage,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                stats.elapsed_time
            );
        }
    }

    pub fn log_final_stats(&self) {
        if let Some(stats) = self.get_stats() {
            tracing::info!(
                "📊 Final Stats - Total Time: {:?}, Peak Memory: {}MB",
                stats.elapsed_time,
                stats.peak_memory_mb
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

// 非 CLI 環境的空實現
#[cfg(not(feature = "cli"))]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn log_stats(&self, _stage: &str) {}

    pub fn log_final_stats(&self) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_clock_records_in_order() {
        let mut clock = StageClock::new();
        let started = Instant::now();
        clock.record("analysis_groups", started);
        clock.record("strategy_group", started);

        let stages: Vec<&str> = clock.timings().iter().map(|t| t.stage.as_str()).collect();
        assert_eq!(stages, vec!["analysis_groups", "strategy_group"]);
    }

    #[test]
    fn test_disabled_monitor_reports_nothing() {
        let monitor = SystemMonitor::new(false);
        assert!(!monitor.is_enabled());
    }
}
