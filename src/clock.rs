//! Wrap-safe elapsed-time checks over a free-running tick counter.
//!
//! The hardware counter wraps at its bit width, so "has `threshold` ticks
//! passed since `since`" must be answered with a wrapping subtraction in
//! the counter's own width. Comparing absolute values breaks at the wrap.

/// A fixed-width unsigned tick count.
pub trait Tick: Copy + PartialOrd {
    /// Modular difference `self - earlier` in the counter's width.
    fn ticks_since(self, earlier: Self) -> Self;
}

macro_rules! impl_tick {
    ($($t:ty),*) => {
        $(
            impl Tick for $t {
                #[inline]
                fn ticks_since(self, earlier: Self) -> Self {
                    self.wrapping_sub(earlier)
                }
            }
        )*
    };
}

impl_tick!(u8, u16, u32, u64);

/// Returns `true` once at least `threshold` ticks separate `since` and `now`,
/// including when the counter wrapped in between.
#[inline]
pub fn elapsed<T: Tick>(now: T, since: T, threshold: T) -> bool {
    now.ticks_since(since) >= threshold
}

/// A source of the free-running hardware tick counter.
pub trait TickSource {
    fn now(&self) -> u32;
}

/// One time-based cadence: a period and the tick at which it last fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cadence {
    since: Option<u32>,
    period: u32,
}

impl Cadence {
    /// A cadence that has never fired. It is due on the first poll.
    pub const fn new(period: u32) -> Self {
        Self {
            since: None,
            period,
        }
    }

    pub const fn period(&self) -> u32 {
        self.period
    }

    /// Tick of the last firing, if any.
    pub const fn since(&self) -> Option<u32> {
        self.since
    }

    /// Whether the cadence is due at `now`, without consuming it.
    pub fn is_due(&self, now: u32) -> bool {
        match self.since {
            Some(since) => elapsed(now, since, self.period),
            None => true,
        }
    }

    /// Consume the cadence if due: records `now` as the new start point.
    pub fn poll(&mut self, now: u32) -> bool {
        if self.is_due(now) {
            self.since = Some(now);
            true
        } else {
            false
        }
    }
}
