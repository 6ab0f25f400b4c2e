pub const APP_NAME: &str = "confab";

/// Default configuration file name, looked up in the current directory.
pub const CONFIG_FILENAME: &str = "confab.lua";

/// Key under which environment/host/role/component are exposed to templates.
pub const CONFAB_KEY: &str = "confab";

/// Extension of a strict data document.
pub const DATA_EXTENSION: &str = "lua";

/// Extension of a templated data document (rendered before evaluation).
pub const DATA_TEMPLATE_EXTENSION: &str = "lua.tmpl";

pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_GENERATED_DIR: &str = "generated";
pub const DEFAULT_REMOTES_DIR: &str = "remotes";
