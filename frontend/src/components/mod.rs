pub mod console;
pub mod scanner;
