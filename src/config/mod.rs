pub mod assemble;

pub use assemble::{load_config, parse_cli, AssembleConfig};
