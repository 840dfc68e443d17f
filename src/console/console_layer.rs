// Console adapter: reads lines from stdin and renders session state as text.

pub mod commands;
pub mod formatter;
