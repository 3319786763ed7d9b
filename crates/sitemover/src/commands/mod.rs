pub mod config_cmd;
pub mod migrate;
pub mod preview;
pub mod util;
