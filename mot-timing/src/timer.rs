use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Monotonic clock used to drive animation and pacing.
pub trait Timer {
    /// Time since the timer was created.
    fn now(&self) -> Duration;
    fn elapsed(&self, since: Duration) -> Duration {
        self.now().saturating_sub(since)
    }
    fn sleep(&self, d: Duration);
    fn record_frame(&mut self, d: Duration);
    fn frame_stats(&self) -> FrameStats;
    fn reset_frames(&mut self);
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FrameStats {
    pub frames: usize,
    pub average_frame_time_ns: f64,
    pub jitter_ns: f64,
    pub min_frame_time_ns: f64,
    pub max_frame_time_ns: f64,
    pub effective_fps: f64,
}

impl FrameStats {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a Duration>) -> Self {
        let times: Vec<f64> = samples.into_iter().map(|d| d.as_nanos() as f64).collect();
        if times.is_empty() {
            return Self::default();
        }
        let avg = times.iter().sum::<f64>() / times.len() as f64;
        let var = times.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / times.len() as f64;
        let min = times.iter().copied().fold(f64::INFINITY, f64::min);
        let max = times.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        FrameStats {
            frames: times.len(),
            average_frame_time_ns: avg,
            jitter_ns: var.sqrt(),
            min_frame_time_ns: min,
            max_frame_time_ns: max,
            effective_fps: if avg > 0.0 { 1e9 / avg } else { 0.0 },
        }
    }
}

/// Wall-clock timer with a bounded frame-time history and platform sleeps.
#[derive(Debug, Clone)]
pub struct HighPrecisionTimer {
    pub start: Instant,
    pub frame_times: VecDeque<Duration>,
    pub max_samples: usize,
}

impl Timer for HighPrecisionTimer {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }
    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
    fn record_frame(&mut self, d: Duration) {
        if self.frame_times.len() >= self.max_samples {
            self.frame_times.pop_front();
        }
        self.frame_times.push_back(d);
    }
    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_samples(&self.frame_times)
    }
    fn reset_frames(&mut self) {
        self.frame_times.clear();
    }
}

impl HighPrecisionTimer {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            frame_times: VecDeque::with_capacity(1000),
            max_samples: 1000,
        }
    }

    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(target_os = "windows")]
        self.windows_sleep(duration);
        #[cfg(target_os = "linux")]
        self.linux_sleep(duration);
        #[cfg(target_os = "macos")]
        self.macos_sleep(duration);
        #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
        std::thread::sleep(duration);
    }

    #[cfg(target_os = "windows")]
    fn windows_sleep(&self, duration: Duration) {
        use windows::core::PCWSTR;
        use windows::Win32::Foundation::CloseHandle;
        use windows::Win32::System::Threading::{
            CreateWaitableTimerW, SetWaitableTimer, WaitForSingleObject, INFINITE,
        };

        unsafe {
            let Ok(timer) = CreateWaitableTimerW(None, true, PCWSTR::null()) else {
                std::thread::sleep(duration);
                return;
            };

            // Negative due time is relative, in 100 ns intervals.
            let due_time = -((duration.as_nanos() / 100) as i64);

            if SetWaitableTimer(timer, &due_time, 0, None, None, false).is_ok() {
                WaitForSingleObject(timer, INFINITE);
            }

            let _ = CloseHandle(timer);
        }
    }

    #[cfg(target_os = "linux")]
    fn linux_sleep(&self, duration: Duration) {
        use libc::{clock_nanosleep, timespec, CLOCK_MONOTONIC};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(target_os = "macos")]
    fn macos_sleep(&self, duration: Duration) {
        use mach2::mach_time::{mach_absolute_time, mach_timebase_info, mach_timebase_info_data_t};

        if duration.as_nanos() < 100_000 {
            unsafe {
                let start = mach_absolute_time();
                let mut timebase = mach_timebase_info_data_t { numer: 0, denom: 0 };
                mach_timebase_info(&mut timebase);

                let target_ticks =
                    duration.as_nanos() as u64 * timebase.denom as u64 / timebase.numer as u64;

                while mach_absolute_time() - start < target_ticks {
                    std::hint::spin_loop();
                }
            }
        } else {
            std::thread::sleep(duration);
        }
    }
}

impl Default for HighPrecisionTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_of_empty_history_are_zero() {
        let timer = HighPrecisionTimer::new();
        assert_eq!(timer.frame_stats(), FrameStats::default());
    }

    #[test]
    fn history_is_bounded() {
        let mut timer = HighPrecisionTimer::new();
        timer.max_samples = 3;
        for ms in 1..=5 {
            timer.record_frame(Duration::from_millis(ms));
        }
        let stats = timer.frame_stats();
        assert_eq!(stats.frames, 3);
        assert_eq!(stats.min_frame_time_ns, 3_000_000.0);
        assert_eq!(stats.max_frame_time_ns, 5_000_000.0);
    }

    #[test]
    fn steady_frames_have_no_jitter() {
        let samples = vec![Duration::from_micros(16_667); 10];
        let stats = FrameStats::from_samples(&samples);
        assert!(stats.jitter_ns.abs() < 1e-6);
        assert!((stats.effective_fps - 60.0).abs() < 0.01);
    }

    #[test]
    fn clock_is_monotonic_and_sleep_waits() {
        let timer = HighPrecisionTimer::new();
        let before = timer.now();
        timer.sleep(Duration::from_millis(2));
        assert!(timer.elapsed(before) >= Duration::from_millis(2));
    }
}
