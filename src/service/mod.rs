//! CrudEngine and the pieces it drives: list view, relation options and
//! cascading selects.

mod cascade;
mod crud;
mod relation;
mod view;

pub use cascade::CascadingSelect;
pub use crud::{
    Confirmer, CrudEngine, DeclineAll, EditorMode, EditorSession, LogNotifier, Notifier, DELETE_PROMPT,
};
pub use relation::{filter_options, map_options, OptionFilter, RelationOptions};
pub use view::{display_value, ListView, TableModel, TableRow, DEFAULT_PAGE_SIZE, EMPTY_MESSAGE};
