mod command_def;
mod command_handler;

pub use command_def::CounterCommand;
pub use command_handler::handle_counter_command;
