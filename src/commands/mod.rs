pub mod error;
pub mod faq;
pub mod help;
pub mod info;
pub mod leaderboard;
pub mod quiz;
pub mod stats;
pub mod welcome;
