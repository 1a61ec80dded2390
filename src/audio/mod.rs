pub mod alert;
pub mod capture;
pub mod listener;
pub mod processing;
pub mod wav;

pub use alert::{AlertDevice, RodioBeeper, ALARM_DURATION, ALARM_FREQUENCY_HZ};
pub use listener::{ConsoleListener, ListenPolicy, MicrophoneListener, SpeechInput};
