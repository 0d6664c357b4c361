use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::Board;
use crate::config::AppConfig;

/// Directory holding a board, found by walking up from the working directory.
pub const BOARD_DIR: &str = ".corkboard";
const BOARD_FILE: &str = "board.json";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("toml deserialization error: {0}")]
    TomlDe(#[from] toml::de::Error),
    #[error(".corkboard directory not found (walk up from {0})")]
    NotFound(PathBuf),
    #[error("board already exists at {0}")]
    AlreadyExists(PathBuf),
}

/// Find the .corkboard directory by walking up from `start`.
pub fn find_board_dir(start: &Path) -> Result<PathBuf, StorageError> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(BOARD_DIR);
        if candidate.is_dir() {
            return Ok(candidate);
        }
        if !dir.pop() {
            return Err(StorageError::NotFound(start.to_path_buf()));
        }
    }
}

/// Create `.corkboard/` under `root` holding `board` and a default config.
pub fn init_board(root: &Path, board: &Board) -> Result<PathBuf, StorageError> {
    let board_dir = root.join(BOARD_DIR);
    if board_dir.join(BOARD_FILE).exists() {
        return Err(StorageError::AlreadyExists(board_dir));
    }
    fs::create_dir_all(&board_dir)?;
    save_board(&board_dir, board)?;
    save_config(&board_dir, &AppConfig::default())?;
    Ok(board_dir)
}

/// Load the board from a .corkboard directory.
pub fn load_board(board_dir: &Path) -> Result<Board, StorageError> {
    let content = fs::read_to_string(board_dir.join(BOARD_FILE))?;
    let mut board: Board = serde_json::from_str(&content)?;
    board.reseed_next_id();
    debug!(cards = board.cards.len(), columns = board.columns.len(), "loaded board");
    Ok(board)
}

/// Save the board, writing a temp file first so a crash never truncates it.
pub fn save_board(board_dir: &Path, board: &Board) -> Result<(), StorageError> {
    let content = serde_json::to_string_pretty(board)?;
    let path = board_dir.join(BOARD_FILE);
    let tmp = board_dir.join(format!("{BOARD_FILE}.tmp"));
    fs::write(&tmp, content)?;
    fs::rename(&tmp, &path)?;
    debug!(path = %path.display(), "saved board");
    Ok(())
}

/// Load `.corkboard/config.toml`, or the defaults when it is absent.
pub fn load_config(board_dir: &Path) -> Result<AppConfig, StorageError> {
    let path = board_dir.join(CONFIG_FILE);
    if !path.exists() {
        return Ok(AppConfig::default());
    }
    let content = fs::read_to_string(&path)?;
    Ok(toml::from_str(&content)?)
}

pub fn save_config(board_dir: &Path, config: &AppConfig) -> Result<(), StorageError> {
    let content = toml::to_string_pretty(config)?;
    fs::write(board_dir.join(CONFIG_FILE), content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::engine::{BoardEngine, CardUpdate, NewCard};

    #[test]
    fn test_init_and_load_board() {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::new("Test Project");
        let board_dir = init_board(dir.path(), &board).unwrap();

        assert!(board_dir.join("board.json").exists());
        assert!(board_dir.join("config.toml").exists());

        let loaded = load_board(&board_dir).unwrap();
        assert_eq!(loaded, board);
    }

    #[test]
    fn test_init_refuses_existing_board() {
        let dir = tempfile::tempdir().unwrap();
        init_board(dir.path(), &Board::new("A")).unwrap();
        let err = init_board(dir.path(), &Board::new("B")).unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists(_)));
    }

    #[test]
    fn test_find_board_dir_walks_up() {
        let dir = tempfile::tempdir().unwrap();
        init_board(dir.path(), &Board::new("Test")).unwrap();
        let nested = dir.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();

        let found = find_board_dir(&nested).unwrap();
        assert_eq!(found, dir.path().join(".corkboard"));
    }

    #[test]
    fn test_find_board_dir_missing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(find_board_dir(dir.path()), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_save_and_load_with_cards() {
        let dir = tempfile::tempdir().unwrap();
        let board_dir = init_board(dir.path(), &Board::new("Test")).unwrap();

        let mut engine = BoardEngine::new(load_board(&board_dir).unwrap());
        let todo = engine.columns()[0].id.clone();
        let card = engine
            .add_card(&todo, NewCard { tags: vec!["test".into()], ..NewCard::titled("Test card") })
            .unwrap();
        engine.add_checklist_item(&card.id, "sub task");
        engine.update_card(&card.id, CardUpdate { completed: Some(true), ..Default::default() });
        engine.add_milestone("v1", None);
        save_board(&board_dir, engine.board()).unwrap();

        let reloaded = load_board(&board_dir).unwrap();
        assert_eq!(&reloaded, engine.board());
        assert!(!board_dir.join("board.json.tmp").exists());
    }

    #[test]
    fn test_nulls_are_explicit_and_timestamps_iso() {
        let dir = tempfile::tempdir().unwrap();
        let board_dir = init_board(dir.path(), &Board::new("Test")).unwrap();
        let mut engine = BoardEngine::new(load_board(&board_dir).unwrap());
        let todo = engine.columns()[0].id.clone();
        engine.add_card(&todo, NewCard::titled("x")).unwrap();
        save_board(&board_dir, engine.board()).unwrap();

        let raw = fs::read_to_string(board_dir.join("board.json")).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        let card = &value["cards"][0];
        assert!(card["swimLaneId"].is_null());
        assert!(card["completedAt"].is_null());
        assert!(card["dueDate"].is_null());
        let created = card["createdAt"].as_str().unwrap();
        assert!(created.parse::<chrono::DateTime<chrono::Utc>>().is_ok());
    }

    #[test]
    fn test_missing_next_id_keeps_ids_unique() {
        let dir = tempfile::tempdir().unwrap();
        let board_dir = init_board(dir.path(), &Board::new("Test")).unwrap();
        let mut engine = BoardEngine::new(load_board(&board_dir).unwrap());
        let todo = engine.columns()[0].id.clone();
        let card = engine.add_card(&todo, NewCard::titled("x")).unwrap();
        engine.add_checklist_item(&card.id, "step");
        save_board(&board_dir, engine.board()).unwrap();

        let raw = fs::read_to_string(board_dir.join("board.json")).unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        value.as_object_mut().unwrap().remove("nextId");
        fs::write(board_dir.join("board.json"), value.to_string()).unwrap();

        let mut engine = BoardEngine::new(load_board(&board_dir).unwrap());
        engine.add_card(&todo, NewCard::titled("y")).unwrap();
        let review = engine.add_column("Review");
        let board = engine.board();
        let mut ids: Vec<&str> = std::iter::once(board.id.as_str())
            .chain(board.columns.iter().map(|c| c.id.as_str()))
            .chain(board.cards.iter().map(|c| c.id.as_str()))
            .chain(board.cards.iter().flat_map(|c| c.checklist.iter().map(|i| i.id.as_str())))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total, "duplicate ids");

        engine.move_column(&review.id, 0);
        assert_eq!(engine.columns()[0].name, "Review");
    }

    #[test]
    fn test_config_roundtrip_and_default() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), AppConfig::default());

        let config = AppConfig { history_capacity: 7, ..Default::default() };
        save_config(dir.path(), &config).unwrap();
        assert_eq!(load_config(dir.path()).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_surfaces_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("config.toml"), "history_capacity = \"lots\"").unwrap();
        assert!(matches!(load_config(dir.path()), Err(StorageError::TomlDe(_))));
    }
}
