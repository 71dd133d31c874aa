pub mod cli;
pub mod crawler;
pub mod epub;
pub mod logger;
pub mod parser;
pub mod range;
pub mod site;
pub mod tcy;
pub mod utils;

pub use cli::Args;
pub use crawler::Crawler;
pub use epub::{Chapter, Episode, Epub};
pub use site::Site;
