//! "Perfect information" windows for prices and events.
//!
//! A window is either permanent or expires at a game time. Granting zero
//! hours makes it permanent; positive hours extend the current expiry (or
//! start from now if it already lapsed).

use serde::{Deserialize, Serialize};

use crate::clock::GameTime;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoWindow {
    permanent: bool,
    expires: Option<GameTime>,
}

impl InfoWindow {
    pub fn permanent() -> Self {
        Self {
            permanent: true,
            expires: None,
        }
    }

    /// Negative hours are ignored, as is any grant once permanent.
    pub fn grant(&mut self, hours: i64, now: GameTime) {
        if self.permanent || hours < 0 {
            return;
        }
        if hours == 0 {
            self.permanent = true;
            self.expires = None;
            return;
        }

        let base = match self.expires {
            Some(expiry) if expiry > now => expiry,
            _ => now,
        };
        let hours = u32::try_from(hours).unwrap_or(u32::MAX / 2);
        self.expires = Some(base.plus_hours(hours));
    }

    pub fn is_active(&self, now: GameTime) -> bool {
        self.permanent || self.expires.is_some_and(|expiry| now < expiry)
    }

    pub fn is_permanent(&self) -> bool {
        self.permanent
    }

    pub fn expires(&self) -> Option<GameTime> {
        self.expires
    }

    /// Clears a lapsed expiry. Returns true if the window just closed.
    pub fn refresh(&mut self, now: GameTime) -> bool {
        match self.expires {
            Some(expiry) if now >= expiry => {
                self.expires = None;
                true
            }
            _ => false,
        }
    }
}

/// A settlement's price and event intel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intel {
    pub prices: InfoWindow,
    pub events: InfoWindow,
}

impl Intel {
    pub fn refresh(&mut self, now: GameTime) {
        self.prices.refresh(now);
        self.events.refresh(now);
    }
}
