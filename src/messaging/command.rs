// Command types - Control thread → audio callback

use crate::sequencer::metronome::ScheduledClick;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AudioCommand {
    /// Play a click at its absolute sample time
    Click(ScheduledClick),
    /// Cut ringing clicks and drop pending ones (output teardown)
    Reset,
}
