use std::path::PathBuf;

use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};

use crate::domain::day::DayType;
use crate::domain::record::RecordCategory;
use crate::domain::reward::RewardCategory;

fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightCyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::BrightYellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::BrightGreen.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::BrightMagenta.on_default())
}

pub fn styled_command() -> clap::Command {
    Cli::command()
}

#[derive(Debug, Parser)]
#[command(name = "donmani")]
#[command(bin_name = "donmani")]
#[command(version)]
#[command(about = "Daily spending journal: one good and one bad spend, kept as stars in a bottle")]
#[command(styles = cli_styles())]
pub struct Cli {
    #[arg(
        short = 'c',
        long,
        env = "DONMANI_CONFIG",
        help = "TOML file overriding the built-in configuration."
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'D',
        long,
        env = "DONMANI_DATA_DIR",
        help = "Directory holding the local cache, identity and resources [default: ~/.donmani]."
    )]
    pub data_dir: Option<PathBuf>,

    #[arg(long, global = true, help = "Print machine-readable JSON.")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    #[command(about = "Register, warm the local cache and check the app version.")]
    Init,
    #[command(about = "Record today's or yesterday's spending.")]
    Record(RecordArgs),
    #[command(about = "List this month's records.")]
    List,
    #[command(about = "Show this month's category statistics.")]
    Stats,
    #[command(about = "Show the yearly star bottle calendar.")]
    Calendar,
    #[command(about = "Show or open rewards.")]
    Rewards(RewardsArgs),
    #[command(about = "Equip an owned decoration item.")]
    Decorate(DecorateArgs),
    #[command(about = "Change the nickname.")]
    Name(NameArgs),
    #[command(about = "Inspect and set persisted flags.")]
    Flags(FlagsArgs),
    #[command(about = "Route a notification payload.")]
    Push(PushArgs),
    #[command(about = "Generate or install shell completions.")]
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DayArg {
    Today,
    Yesterday,
}

impl From<DayArg> for DayType {
    fn from(value: DayArg) -> Self {
        match value {
            DayArg::Today => DayType::Today,
            DayArg::Yesterday => DayType::Yesterday,
        }
    }
}

#[derive(Debug, Args)]
pub struct RecordArgs {
    #[arg(long, value_enum, default_value = "today", help = "Day to record.")]
    pub day: DayArg,

    #[arg(
        long,
        value_name = "CATEGORY[:MEMO]",
        help = "Good spend, e.g. flex:coffee with a friend.",
        conflicts_with = "empty"
    )]
    pub good: Option<String>,

    #[arg(
        long,
        value_name = "CATEGORY[:MEMO]",
        help = "Bad spend, e.g. impulse:shoes.",
        conflicts_with = "empty"
    )]
    pub bad: Option<String>,

    #[arg(long, help = "Record a day without any spending.")]
    pub empty: bool,
}

/// A category with an optional memo, as written on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentArg {
    pub category: RecordCategory,
    pub memo: String,
}

impl ContentArg {
    pub fn parse(raw: &str) -> Result<Self, String> {
        let (name, memo) = raw.split_once(':').unwrap_or((raw, ""));
        let category = name
            .parse::<RecordCategory>()
            .map_err(|err| err.to_string())?;
        Ok(Self {
            category,
            memo: memo.trim().to_string(),
        })
    }
}

#[derive(Debug, Args)]
pub struct RewardsArgs {
    #[command(subcommand)]
    pub command: Option<RewardsSubcommands>,
}

#[derive(Debug, Subcommand)]
pub enum RewardsSubcommands {
    #[command(about = "Show feedback progress and unopened gifts.")]
    Status,
    #[command(about = "Open every unopened gift.")]
    Open,
    #[command(about = "List owned items by category.")]
    Owned,
}

#[derive(Debug, Args)]
pub struct DecorateArgs {
    #[arg(help = "Item category: background, effect, decoration, bottle or sound.")]
    pub category: RewardCategory,
    #[arg(help = "Id of an owned item.")]
    pub item_id: i64,
}

#[derive(Debug, Args)]
pub struct NameArgs {
    #[arg(help = "New nickname; omit to print the current one.")]
    pub name: Option<String>,
}

#[derive(Debug, Args)]
pub struct FlagsArgs {
    #[command(subcommand)]
    pub command: Option<FlagsSubcommands>,
}

#[derive(Debug, Subcommand)]
pub enum FlagsSubcommands {
    #[command(about = "List every flag with its value.")]
    List,
    #[command(about = "Set one flag.")]
    Set(FlagSetArgs),
}

#[derive(Debug, Args)]
pub struct FlagSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Args)]
pub struct PushArgs {
    #[arg(help = "Notification payload JSON, e.g. {\"destination\":\"yesterday\"}.")]
    pub payload: String,
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    #[arg(help = "Shell to generate completions for (bash, zsh, fish). Auto-detected if omitted.")]
    pub shell: Option<String>,

    #[arg(long, help = "Write completions to the standard location for the shell.")]
    pub install: bool,
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Commands, ContentArg, DayArg, RewardsSubcommands};
    use crate::domain::record::RecordCategory;

    #[test]
    fn content_arg_splits_category_and_memo() {
        let parsed = ContentArg::parse("flex: coffee with a friend").unwrap();
        assert_eq!(parsed.category, RecordCategory::Flex);
        assert_eq!(parsed.memo, "coffee with a friend");

        let bare = ContentArg::parse("Saving").unwrap();
        assert_eq!(bare.category, RecordCategory::Saving);
        assert!(bare.memo.is_empty());

        assert!(ContentArg::parse("lottery:ticket").is_err());
    }

    #[test]
    fn record_command_parses_day_and_contents() {
        let cli = Cli::try_parse_from([
            "donmani",
            "record",
            "--day",
            "yesterday",
            "--good",
            "health:gym",
            "--bad",
            "impulse",
        ])
        .unwrap();
        let Commands::Record(args) = cli.command else {
            panic!("expected record");
        };
        assert_eq!(args.day, DayArg::Yesterday);
        assert_eq!(args.good.as_deref(), Some("health:gym"));
        assert!(!args.empty);
    }

    #[test]
    fn empty_record_conflicts_with_contents() {
        assert!(Cli::try_parse_from(["donmani", "record", "--empty", "--good", "flex"]).is_err());
    }

    #[test]
    fn rewards_default_and_json_flag() {
        let cli = Cli::try_parse_from(["donmani", "rewards", "open", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(
            cli.command,
            Commands::Rewards(args) if matches!(args.command, Some(RewardsSubcommands::Open))
        ));
    }

    #[test]
    fn decorate_rejects_unknown_categories() {
        assert!(Cli::try_parse_from(["donmani", "decorate", "bottle", "24"]).is_ok());
        assert!(Cli::try_parse_from(["donmani", "decorate", "hat", "24"]).is_err());
    }
}
