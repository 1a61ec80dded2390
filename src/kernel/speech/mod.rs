pub mod phrases;

pub use phrases::PhraseBook;
