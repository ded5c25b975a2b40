mod app;
mod editor;
mod input;
mod widgets;

pub use app::TuiApp;
pub use editor::Editor;
