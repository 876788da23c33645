pub mod components;
pub mod config_form;
pub mod project_form;
pub mod projects;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};

/// Blocks until the next key press.
///
/// Release and repeat events are swallowed so a single press is never seen
/// twice on platforms that report both edges.
pub fn read_key() -> Result<Option<KeyCode>> {
    if let Event::Key(key) = event::read()? {
        if key.kind == KeyEventKind::Press {
            return Ok(Some(key.code));
        }
    }
    Ok(None)
}
