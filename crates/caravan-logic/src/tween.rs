//! Explicit interpolation records.
//!
//! Anything that moves over time (a wagon on the road, an exploded cargo
//! view) is a `Tween`: start time, duration, start and end values. The
//! caller samples it at the current time; it is finished once the elapsed
//! time reaches the duration.

use serde::{Deserialize, Serialize};

use crate::grid::Vec3;

pub trait Lerp: Copy {
    fn lerp(self, to: Self, t: f32) -> Self;
}

impl Lerp for f32 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Lerp for f64 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t as f64
    }
}

impl Lerp for Vec3 {
    fn lerp(self, to: Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tween<T> {
    /// Start time, in hours.
    pub start: f64,
    /// Length, in hours.
    pub duration: f64,
    pub from: T,
    pub to: T,
}

impl<T: Lerp> Tween<T> {
    pub fn new(start: f64, duration: f64, from: T, to: T) -> Self {
        Self {
            start,
            duration: duration.max(0.0),
            from,
            to,
        }
    }

    /// Completion fraction in [0, 1].
    pub fn progress(&self, now: f64) -> f32 {
        if self.duration <= 0.0 {
            return 1.0;
        }
        ((now - self.start) / self.duration).clamp(0.0, 1.0) as f32
    }

    pub fn sample(&self, now: f64) -> T {
        self.from.lerp(self.to, self.progress(now))
    }

    pub fn is_finished(&self, now: f64) -> bool {
        now - self.start >= self.duration
    }

    pub fn remaining(&self, now: f64) -> f64 {
        (self.start + self.duration - now).max(0.0)
    }
}
