pub mod repl;
pub mod theme;
pub mod window;
