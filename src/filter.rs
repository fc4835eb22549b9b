//! Fixed-window moving average for the analog channels.
//!
//! Both channel windows are indexed by one shared write cursor owned by
//! [`SmoothingBank`]; the cursor advances once per sampling period, after the
//! ECG and PPG readings have both been filtered at the same slot.

use crate::config::SMOOTHING_WINDOW;

/// Ring of the last `N` raw readings with a running total.
#[derive(Debug, Clone)]
pub struct SmoothingFilter<const N: usize> {
    readings: [i32; N],
    total: i64,
}

impl<const N: usize> SmoothingFilter<N> {
    pub const fn new() -> Self {
        Self {
            readings: [0; N],
            total: 0,
        }
    }

    /// Replace the slot at `cursor` with `value` and return the window average.
    ///
    /// The average truncates toward zero. Slots that were never written count
    /// as zero, so the first `N - 1` outputs lean low.
    pub fn smooth(&mut self, value: i32, cursor: usize) -> i32 {
        let slot = &mut self.readings[cursor % N];
        self.total = self.total - i64::from(*slot) + i64::from(value);
        *slot = value;
        // The mean of i32 values always fits back into an i32.
        (self.total / N as i64) as i32
    }

    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn window(&self) -> &[i32; N] {
        &self.readings
    }
}

/// ECG and PPG filters sharing one write cursor.
#[derive(Debug, Clone)]
pub struct SmoothingBank<const N: usize = SMOOTHING_WINDOW> {
    ecg: SmoothingFilter<N>,
    ppg: SmoothingFilter<N>,
    cursor: usize,
}

impl<const N: usize> SmoothingBank<N> {
    pub const fn new() -> Self {
        Self {
            ecg: SmoothingFilter::new(),
            ppg: SmoothingFilter::new(),
            cursor: 0,
        }
    }

    /// Filter one period's pair of raw readings, then advance the cursor.
    pub fn smooth(&mut self, ecg: i32, ppg: i32) -> (i32, i32) {
        let ecg = self.ecg.smooth(ecg, self.cursor);
        let ppg = self.ppg.smooth(ppg, self.cursor);
        self.cursor = (self.cursor + 1) % N;
        (ecg, ppg)
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn ecg(&self) -> &SmoothingFilter<N> {
        &self.ecg
    }

    pub fn ppg(&self) -> &SmoothingFilter<N> {
        &self.ppg
    }
}
