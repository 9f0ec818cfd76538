/// Configuration for tradescan
///
/// - `macros`: the `config_struct!` macro (struct + defaults in one place)
/// - `schemas`: every configuration section
/// - `utils`: loading from TOML, env overrides, validation
pub mod macros;
pub mod schemas;
pub mod utils;

pub use schemas::{
    Config, CovalentConfig, DexScreenerConfig, ReportConfig, RetrievalConfig, RetrievalMode,
};
pub use utils::{
    apply_env_overrides, load_config, load_config_from_path, validate, API_KEY_ENV,
    CONFIG_FILE_PATH,
};
