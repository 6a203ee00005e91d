mod cli;
mod commands;
mod config;
mod datekey;
mod drag;
mod grid;
mod logging;
mod lunar;
mod model;
mod storage;
mod ui;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let config = config::Config::load()?;
    let data_dir = config.data_dir(args.data_dir.as_deref())?;
    logging::init_or_warn(&config.log_level, &logging::log_dir(&data_dir));
    let env = commands::Env { config, data_dir };

    let command = args.command.unwrap_or(cli::Command::Tui);
    match command {
        cli::Command::Month { year, month } => commands::month(&env, year, month),
        cli::Command::List { date } => commands::list(&env, date),
        cli::Command::Add { date, text } => commands::add(&env, date, text),
        cli::Command::Toggle { date, id } => commands::toggle(&env, date, id),
        cli::Command::Remove { date, id } => commands::remove(&env, date, id),
        cli::Command::Move { date, from, to } => commands::move_todo(&env, date, from, to),
        cli::Command::Tui => commands::tui(&env),
    }
}
