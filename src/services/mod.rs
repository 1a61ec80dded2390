pub mod browser;
pub mod launcher;
pub mod llm;
pub mod stt;
pub mod weather;
