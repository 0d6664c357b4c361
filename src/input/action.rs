/// All semantic actions the board view understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    // Navigation
    FocusPrevColumn,
    FocusNextColumn,
    SelectPrevCard,
    SelectNextCard,

    // Card movement
    MoveCardPrevColumn,
    MoveCardNextColumn,
    MoveCardUp,
    MoveCardDown,
    MoveToColumn,

    // Card actions
    NewCard,
    DeleteCard,
    DuplicateCard,
    EditTitle,
    EditTags,
    PickPriority,
    ToggleCompleted,
    ToggleBlocked,

    // Column mode
    AddColumn,
    RenameColumn,
    DeleteColumn,
    ToggleColumnCollapsed,
    SetWipLimit,
    MoveColumnLeft,
    MoveColumnRight,

    // Board structure
    AddSwimLane,
    SaveTemplate,
    ApplyTemplate,

    // History
    Undo,
    Redo,

    // Search & filter
    StartFilter,
    StartTagFilter,
    ClearFilters,

    // Board
    ShowHelp,
    Quit,

    // Minor mode entry
    EnterSpaceMode,
    EnterColumnMode,

    // Input modal
    InputConfirm,
    InputCancel,
    InputChar(char),
    InputBackspace,
    InputLeft,
    InputRight,
    InputHome,
    InputEnd,
    InputDeleteWord,

    // Confirmation
    Confirm,
    Deny,

    // No-op
    None,
}
