use crate::commands;
use serenity::all::CreateCommand;

/// Get all slash commands to register
pub fn get_all_commands() -> Vec<CreateCommand> {
    vec![
        commands::faq::register(),
        commands::help::register(),
        commands::info::register(),
        commands::leaderboard::register(),
        commands::quiz::register(),
        commands::stats::register(),
        commands::welcome::register(),
    ]
}
