pub mod dispatcher;
pub mod gate;
pub mod intent;
pub mod scheduler;
pub mod speech;
pub mod ticker;
pub mod time;
pub mod timeparse;
pub mod wake;
