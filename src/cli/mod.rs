//! Terminal front end for the routing agent.

mod repl;

pub use repl::{is_exit, Interrupts, Repl, BANNER, EXIT_COMMAND, FAREWELL, PROMPT};
