pub mod decoder;
pub mod token;

pub use decoder::{BlockDecoder, State};
pub use token::Token;
