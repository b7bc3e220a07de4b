//! 命令定义和实现

pub mod config;
pub mod r#move;
pub mod position;
pub mod run;

pub use config::ConfigCommand;
pub use r#move::MoveCommand;
pub use position::PositionCommand;
pub use run::RunCommand;
