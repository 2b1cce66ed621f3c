//! Interactive side of the bridge: line editing, command classification, the
//! shared console and the output route for received data.

pub mod command;
pub mod console;
pub mod editor;
pub mod line;
pub mod router;

pub use command::Command;
pub use console::Console;
pub use editor::{Input, KeySource, LineEditor, LineEnding};
pub use line::InputLine;
pub use router::{OutputMode, OutputRouter};
