use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "freshcal",
    version,
    about = "Month calendar with lunar days and per-day todos"
)]
pub struct Cli {
    /// Directory holding the todo document (overrides config)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the annotated month grid
    Month {
        /// Year (defaults to the current year)
        #[arg(long)]
        year: Option<i32>,
        /// Month 1-12 (defaults to the current month)
        #[arg(long)]
        month: Option<u32>,
    },
    /// List the todos of a day
    List {
        /// today, tomorrow, yesterday or YYYY-MM-DD
        #[arg(default_value = "today")]
        date: String,
    },
    /// Add a todo to a day
    Add {
        /// today, tomorrow, yesterday or YYYY-MM-DD
        date: String,
        /// Todo text
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Flip a todo between done and not done
    Toggle {
        date: String,
        /// Todo id as shown by `list`
        id: String,
    },
    /// Delete a todo
    Remove { date: String, id: String },
    /// Move a todo from one position to another (1-based)
    Move { date: String, from: usize, to: usize },
    /// Launch the interactive TUI
    Tui,
}
