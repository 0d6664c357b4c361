use std::env;
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{bail, eyre, WrapErr};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use corkboard::app;
use corkboard::board::engine::{BoardEngine, NewCard};
use corkboard::board::storage::{self, find_board_dir, init_board, load_board, save_board, StorageError};
use corkboard::board::template::{builtin_template, builtin_templates};
use corkboard::board::{Board, Card, Priority};

#[derive(Parser)]
#[command(name = "corkboard", version, about = "A board editor with undo and mouse drag reordering")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Initialize a new .corkboard/ board in the current directory
    Init {
        /// Board name (defaults to current directory name)
        #[arg(short, long)]
        name: Option<String>,
        /// Built-in template for the columns (basic, scrum, bugs)
        #[arg(short, long, default_value = "basic")]
        template: String,
    },
    /// Add a new card
    Add {
        /// Card title
        title: String,
        /// Column name or id (defaults to the first column)
        #[arg(short, long)]
        column: Option<String>,
        /// Tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Vec<String>,
        /// Assignees (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        assignee: Vec<String>,
        /// Priority (none, low, medium, high, urgent)
        #[arg(short, long, default_value = "none")]
        priority: Priority,
    },
    /// List cards column by column
    List {
        /// Only this column (name or id)
        #[arg(short, long)]
        column: Option<String>,
        /// Filter by tag
        #[arg(short, long)]
        tag: Option<String>,
    },
    /// Move a card to a column, optionally at a position
    Move {
        /// Card id, or its number (e.g. 4 for card-4)
        card_id: String,
        /// Target column name or id
        column: String,
        /// Zero-based position in the target column (defaults to the end)
        #[arg(short, long)]
        position: Option<usize>,
    },
    /// List columns with card counts and WIP limits
    Columns,
    /// List all tags with card counts
    Tags,
    /// List built-in and saved templates
    Templates,
}

fn main() {
    // Install color_eyre for unexpected panics/errors (developer bugs).
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let cwd = match env::current_dir() {
        Ok(d) => d,
        Err(e) => {
            eprintln!("error: cannot determine current directory: {e}");
            std::process::exit(1);
        }
    };
    init_tracing(&cwd, cli.command.is_none());

    let result = match cli.command {
        Some(Command::Init { name, template }) => {
            let name = name.unwrap_or_else(|| {
                cwd.file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or("My Project")
                    .to_string()
            });
            cmd_init(&cwd, &name, &template)
        }
        Some(Command::Add { title, column, tags, assignee, priority }) => {
            cmd_add(&cwd, &title, column.as_deref(), tags, assignee, priority)
        }
        Some(Command::List { column, tag }) => cmd_list(&cwd, column.as_deref(), tag.as_deref()),
        Some(Command::Move { card_id, column, position }) => cmd_move(&cwd, &card_id, &column, position),
        Some(Command::Columns) => cmd_columns(&cwd),
        Some(Command::Tags) => cmd_tags(&cwd),
        Some(Command::Templates) => cmd_templates(&cwd),
        None => cmd_tui(&cwd),
    };

    if let Err(e) = result {
        print_user_error(&e);
        std::process::exit(1);
    }
}

/// Set up logging from `CORKBOARD_LOG` (an `EnvFilter` directive).
///
/// The TUI owns the terminal, so it logs to `.corkboard/corkboard.log` and only
/// when `CORKBOARD_LOG` is set. Subcommands log warnings to stderr.
fn init_tracing(cwd: &Path, tui: bool) {
    let explicit = EnvFilter::try_from_env("CORKBOARD_LOG").ok();
    if tui {
        let Some(filter) = explicit else {
            return;
        };
        let Ok(board_dir) = find_board_dir(cwd) else {
            return;
        };
        let Ok(file) = OpenOptions::new()
            .create(true)
            .append(true)
            .open(board_dir.join("corkboard.log"))
        else {
            return;
        };
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
            .init();
        return;
    }
    let filter = explicit.unwrap_or_else(|| EnvFilter::new("corkboard=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Print a user-friendly error message, with actionable hints for known error types.
fn print_user_error(error: &color_eyre::Report) {
    if let Some(storage_err) = error.downcast_ref::<StorageError>() {
        match storage_err {
            StorageError::NotFound(_) => {
                eprintln!("error: no corkboard found in this directory.");
                eprintln!("  Run `corkboard init` to create one.");
            }
            StorageError::AlreadyExists(path) => {
                eprintln!("error: a board already exists at {}.", path.display());
            }
            StorageError::Json(e) => {
                eprintln!("error: board.json is not a valid board.");
                eprintln!("  {e}");
            }
            StorageError::TomlDe(e) => {
                eprintln!("error: config.toml has invalid TOML syntax.");
                eprintln!("  {e}");
            }
            StorageError::TomlSer(e) => {
                eprintln!("error: failed to save config.");
                eprintln!("  {e}");
            }
            StorageError::Io(e) => {
                eprintln!("error: could not read or write board files.");
                eprintln!("  {e}");
            }
        }
        return;
    }

    // For eyre!() / bail!() messages, print the full error chain.
    eprintln!("error: {e:#}", e = error);
}

/// Load the engine for the board above `cwd`, with the configured history depth.
fn open_engine(cwd: &Path) -> color_eyre::Result<(std::path::PathBuf, BoardEngine)> {
    let board_dir = find_board_dir(cwd)?;
    let config = storage::load_config(&board_dir)?;
    let board = load_board(&board_dir)?;
    Ok((board_dir, BoardEngine::with_capacity(board, config.history_capacity)))
}

fn cmd_init(cwd: &Path, name: &str, template: &str) -> color_eyre::Result<()> {
    let Some(template) = builtin_template(template) else {
        let names: Vec<String> = builtin_templates().into_iter().map(|t| t.name).collect();
        bail!("Unknown template '{template}'. Available: {}", names.join(", "));
    };
    let board = Board::from_template(name, &template);
    let board_dir = init_board(cwd, &board)?;
    println!("Initialized board '{}' in {}", name, board_dir.display());
    let columns: Vec<&str> = board.sorted_columns().iter().map(|c| c.name.as_str()).collect();
    println!("\nCreated columns: {}", columns.join(", "));
    println!("Run `corkboard` to open the board, or `corkboard add \"Card title\"` to add cards.");
    Ok(())
}

fn cmd_add(
    cwd: &Path,
    title: &str,
    column: Option<&str>,
    tags: Vec<String>,
    assignees: Vec<String>,
    priority: Priority,
) -> color_eyre::Result<()> {
    let title = title.trim();
    if title.is_empty() {
        bail!("Card title cannot be empty");
    }
    let (board_dir, mut engine) = open_engine(cwd)?;
    let column_id = match column {
        Some(key) => engine
            .board()
            .find_column(key)
            .map(|c| c.id.clone())
            .ok_or_else(|| eyre!("Column '{key}' not found"))?,
        None => engine
            .board()
            .sorted_columns()
            .first()
            .map(|c| c.id.clone())
            .ok_or_else(|| eyre!("Board has no columns"))?,
    };

    let card = engine.add_card(
        &column_id,
        NewCard {
            tags,
            assignees,
            priority: Some(priority),
            ..NewCard::titled(title)
        },
    )?;
    save_board(&board_dir, engine.board())?;
    println!("Created {}: {}", card.id, card.title);
    Ok(())
}

fn format_card_line(card: &Card) -> String {
    let tags = if card.tags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", card.tags.join(", "))
    };
    let priority = match card.priority {
        Priority::None => String::new(),
        p => format!("  ({p})"),
    };
    let blocked = if card.blocked { " [blocked]" } else { "" };
    let done = if card.is_completed() { "x" } else { " " };
    format!("  [{done}] {:>8}  {}{}{}{}", card.id, card.title, tags, priority, blocked)
}

fn cmd_list(cwd: &Path, column: Option<&str>, tag: Option<&str>) -> color_eyre::Result<()> {
    let board_dir = find_board_dir(cwd)?;
    let board = load_board(&board_dir)?;
    let only = match column {
        Some(key) => Some(
            board
                .find_column(key)
                .map(|c| c.id.clone())
                .ok_or_else(|| eyre!("Column '{key}' not found"))?,
        ),
        None => None,
    };

    for col in board.sorted_columns() {
        if only.as_deref().is_some_and(|id| id != col.id) {
            continue;
        }
        let cards: Vec<&Card> = board
            .column_cards(&col.id)
            .into_iter()
            .filter(|card| tag.map_or(true, |t| card.tags.iter().any(|ct| ct == t)))
            .collect();
        if cards.is_empty() && only.is_none() {
            continue;
        }

        println!("\n{} ({})", col.name, cards.len());
        println!("{}", "─".repeat(40));
        for card in &cards {
            println!("{}", format_card_line(card));
        }
    }
    println!();
    Ok(())
}

fn cmd_move(cwd: &Path, card_key: &str, target: &str, position: Option<usize>) -> color_eyre::Result<()> {
    let (board_dir, mut engine) = open_engine(cwd)?;
    let board = engine.board();
    let card = board
        .find_card(card_key)
        .ok_or_else(|| eyre!("Card '{card_key}' not found"))?;
    let column = board
        .find_column(target)
        .ok_or_else(|| eyre!("Column '{target}' not found"))?;
    let (card_id, column_id, column_name) = (card.id.clone(), column.id.clone(), column.name.clone());
    let lane = card.swim_lane_id.clone();

    let before = board.updated_at;
    engine.move_card(&card_id, &column_id, position.unwrap_or(usize::MAX), lane.as_deref());
    if engine.board().updated_at == before {
        println!("{card_id} is already there");
        return Ok(());
    }
    save_board(&board_dir, engine.board())?;
    println!("Moved {card_id} to {column_name}");
    Ok(())
}

fn cmd_columns(cwd: &Path) -> color_eyre::Result<()> {
    let (_, engine) = open_engine(cwd)?;
    for col in engine.columns() {
        let count = engine.board().column_card_count(&col.id);
        let wip = match col.wip_limit {
            Some(limit) if engine.is_wip_limit_exceeded(&col.id) => format!(" / {limit} over limit"),
            Some(limit) => format!(" / {limit}"),
            None => String::new(),
        };
        let category = engine.status_category(&col.id).map_or("", |c| c.as_str());
        println!("  {:<10} {:<20} {:<12} {count}{wip}", col.id, col.name, category);
    }
    Ok(())
}

fn cmd_tags(cwd: &Path) -> color_eyre::Result<()> {
    let board_dir = find_board_dir(cwd)?;
    let board = load_board(&board_dir)?;
    let tags = board.all_tags();
    if tags.is_empty() {
        println!("No tags found.");
        return Ok(());
    }
    for (tag, count) in &tags {
        println!("  {tag:<20} {count}");
    }
    Ok(())
}

fn cmd_templates(cwd: &Path) -> color_eyre::Result<()> {
    println!("Built-in:");
    for t in builtin_templates() {
        println!("  {:<12} {}", t.name, t.description);
    }
    // Saved templates live on a board, so they only show inside one.
    if let Ok(board_dir) = find_board_dir(cwd) {
        let board = load_board(&board_dir)?;
        if !board.templates.is_empty() {
            println!("\nSaved on this board:");
            for t in &board.templates {
                println!("  {:<12} {}", t.name, t.description);
            }
        }
    }
    Ok(())
}

fn cmd_tui(cwd: &Path) -> color_eyre::Result<()> {
    // Fail before touching the terminal when there is no board.
    find_board_dir(cwd).wrap_err("cannot open the board")?;
    let mut terminal = ratatui::init();
    let result = app::run(&mut terminal, cwd);
    ratatui::restore();
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        cmd_init(dir.path(), "Test", "basic").unwrap();
        dir
    }

    fn board_at(dir: &Path) -> Board {
        load_board(&find_board_dir(dir).unwrap()).unwrap()
    }

    #[test]
    fn init_uses_template_columns() {
        let dir = tempfile::tempdir().unwrap();
        cmd_init(dir.path(), "Bugs", "scrum").unwrap();
        let board = board_at(dir.path());
        let names: Vec<&str> = board.sorted_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Backlog", "Sprint", "In Progress", "Review", "Done"]);
    }

    #[test]
    fn init_rejects_unknown_template_and_existing_board() {
        let dir = tempfile::tempdir().unwrap();
        assert!(cmd_init(dir.path(), "X", "nope").is_err());
        cmd_init(dir.path(), "X", "basic").unwrap();
        let err = cmd_init(dir.path(), "X", "basic").unwrap_err();
        assert!(matches!(err.downcast_ref::<StorageError>(), Some(StorageError::AlreadyExists(_))));
    }

    #[test]
    fn add_defaults_to_first_column() {
        let dir = init_dir();
        cmd_add(dir.path(), "First", None, vec!["ui".into()], vec![], Priority::High).unwrap();
        let board = board_at(dir.path());
        let first = board.sorted_columns()[0].id.clone();
        let cards = board.partition(&first, None);
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "First");
        assert_eq!(cards[0].priority, Priority::High);
        assert_eq!(cards[0].tags, vec!["ui".to_string()]);
    }

    #[test]
    fn add_to_named_column() {
        let dir = init_dir();
        cmd_add(dir.path(), "Doing", Some("in progress"), vec![], vec![], Priority::None).unwrap();
        let board = board_at(dir.path());
        let col = board.find_column("In Progress").unwrap();
        assert_eq!(board.partition(&col.id, None).len(), 1);
        assert!(cmd_add(dir.path(), "x", Some("missing"), vec![], vec![], Priority::None).is_err());
        assert!(cmd_add(dir.path(), "   ", None, vec![], vec![], Priority::None).is_err());
    }

    #[test]
    fn move_places_card_at_position() {
        let dir = init_dir();
        cmd_add(dir.path(), "A", Some("Done"), vec![], vec![], Priority::None).unwrap();
        cmd_add(dir.path(), "B", Some("Done"), vec![], vec![], Priority::None).unwrap();
        cmd_add(dir.path(), "C", None, vec![], vec![], Priority::None).unwrap();
        let c_id = board_at(dir.path()).cards.iter().find(|c| c.title == "C").unwrap().id.clone();

        cmd_move(dir.path(), &c_id, "Done", Some(1)).unwrap();
        let board = board_at(dir.path());
        let done = board.find_column("Done").unwrap();
        let titles: Vec<&str> = board.partition(&done.id, None).iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["A", "C", "B"]);
        let orders: Vec<u32> = board.partition(&done.id, None).iter().map(|c| c.order).collect();
        assert_eq!(orders, [0, 1, 2]);
    }

    #[test]
    fn move_unknown_card_errors() {
        let dir = init_dir();
        assert!(cmd_move(dir.path(), "card-99", "Done", None).is_err());
    }

    #[test]
    fn commands_without_board_return_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = cmd_list(dir.path(), None, None).unwrap_err();
        assert!(matches!(err.downcast_ref::<StorageError>(), Some(StorageError::NotFound(_))));
        assert!(cmd_columns(dir.path()).is_err());
        assert!(cmd_tags(dir.path()).is_err());
        assert!(cmd_templates(dir.path()).is_ok());
    }

    #[test]
    fn card_line_marks_state() {
        let dir = init_dir();
        cmd_add(dir.path(), "Fix", None, vec!["bug".into()], vec![], Priority::Urgent).unwrap();
        let board = board_at(dir.path());
        let line = format_card_line(&board.cards[0]);
        assert!(line.contains("Fix"));
        assert!(line.contains("[bug]"));
        assert!(line.contains("(urgent)"));
        assert!(line.starts_with("  [ ]"));
    }
}
