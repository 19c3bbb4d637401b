//! Concrete rule sets, one per strategy family.

pub mod channel_breakout;
pub mod down_streak;
pub mod oscillator;
pub mod triple_average;

pub use channel_breakout::{BreakoutTrigger, ChannelBreakout, ChannelBreakoutParams};
pub use down_streak::{DownStreak, DownStreakParams, StreakExit};
pub use oscillator::{Oscillator, OscillatorParams};
pub use triple_average::{TripleAverage, TripleAverageParams};
