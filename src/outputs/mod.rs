pub mod speech;
pub mod text;

pub use speech::{CommandSpeaker, SpeechOutput};
pub use text::ConsoleSpeaker;
