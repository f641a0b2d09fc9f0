mod app;
mod bootstrap;
mod cli;
mod completions;
mod config;
mod db;
mod domain;
mod feature;
mod flags;
mod identity;
mod network;
mod push;
mod repository;
mod store;
mod ui;
mod usecase;

use std::path::PathBuf;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn print_json(value: &impl serde::Serialize) -> Result<(), app::AppError> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| app::AppError::InvalidArgument(format!("cannot render JSON: {err}")))?;
    println!("{rendered}");
    Ok(())
}

/// `DONMANI_LOG` wins over `RUST_LOG`; the config level applies otherwise.
/// Logs go to stderr so `--json` output stays clean.
fn init_tracing(default_level: &str) {
    let filter = std::env::var("DONMANI_LOG")
        .ok()
        .and_then(|raw| EnvFilter::try_new(raw).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(format!("donmani={default_level},warn")));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn default_data_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".donmani"))
        .unwrap_or_else(|| PathBuf::from(".donmani"))
}

fn run() -> Result<(), app::AppError> {
    use clap::Parser;
    use cli::{Commands, FlagsSubcommands, RewardsSubcommands};

    let cli = cli::Cli::parse();
    if let Commands::Completions(args) = &cli.command {
        return completions::run_completions_command(args.shell.as_deref(), args.install);
    }

    let config = config::AppConfig::load(cli.config.as_deref())?;
    init_tracing(&config.log_level);
    let data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    let app = app::App::open(&config, &data_dir)?;

    if let Commands::Flags(args) = &cli.command {
        return match &args.command {
            Some(FlagsSubcommands::Set(set)) => {
                let entry = app.set_flag(&set.key, &set.value)?;
                if cli.json {
                    print_json(&entry)
                } else {
                    ui::print_flags(std::slice::from_ref(&entry));
                    Ok(())
                }
            }
            None | Some(FlagsSubcommands::List) => {
                let entries = app.flags();
                if cli.json {
                    print_json(&entries)
                } else {
                    ui::print_flags(&entries);
                    Ok(())
                }
            }
        };
    }

    let json = cli.json;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(async move {
        match cli.command {
            Commands::Init => {
                let view = app.launch().await?;
                if json {
                    return print_json(&view);
                }
                ui::print_launch(&view);
            }
            Commands::Record(args) => {
                let request = app::RecordRequest {
                    day: args.day.into(),
                    good: parse_content(args.good.as_deref())?,
                    bad: parse_content(args.bad.as_deref())?,
                    empty: args.empty,
                };
                let record = app.record(request).await?;
                if json {
                    return print_json(&record);
                }
                ui::print_record(&record);
            }
            Commands::List => {
                let view = app.month().await?;
                if json {
                    return print_json(&view);
                }
                ui::print_month(&view);
            }
            Commands::Stats => {
                let view = app.statistics().await?;
                if json {
                    return print_json(&view);
                }
                ui::print_statistics(&view);
            }
            Commands::Calendar => {
                let view = app.calendar().await?;
                if json {
                    return print_json(&view);
                }
                ui::print_calendar(&view);
            }
            Commands::Rewards(args) => match args.command {
                None | Some(RewardsSubcommands::Status) => {
                    let view = app.reward_status().await?;
                    if json {
                        return print_json(&view);
                    }
                    ui::print_reward_status(&view);
                }
                Some(RewardsSubcommands::Open) => {
                    let opened = app.open_rewards().await?;
                    if json {
                        return print_json(&opened);
                    }
                    ui::print_rewards(&opened);
                }
                Some(RewardsSubcommands::Owned) => {
                    let owned = app.owned_rewards();
                    if json {
                        return print_json(&owned);
                    }
                    ui::print_owned(&owned);
                }
            },
            Commands::Decorate(args) => {
                let view = app.decorate(args.category, args.item_id).await?;
                if json {
                    return print_json(&view);
                }
                ui::print_decoration(&view);
            }
            Commands::Name(args) => {
                let name = app.rename(args.name.as_deref()).await?;
                if json {
                    return print_json(&serde_json::json!({ "user_name": name }));
                }
                println!("{name}");
            }
            Commands::Push(args) => {
                let view = app.open_push(&args.payload).await?;
                if json {
                    return print_json(&view);
                }
                ui::print_push(&view);
            }
            Commands::Flags(_) | Commands::Completions(_) => {}
        }
        Ok::<(), app::AppError>(())
    })
}

fn parse_content(raw: Option<&str>) -> Result<Option<cli::ContentArg>, app::AppError> {
    raw.map(cli::ContentArg::parse)
        .transpose()
        .map_err(app::AppError::InvalidArgument)
}
