//! External service clients and the diagnosis flow.

pub mod articles;
pub mod diagnosis;
pub mod encyclopedia;

pub use encyclopedia::{Article, Encyclopedia, EncyclopediaError, WikipediaClient};
