mod error;
mod paths;
mod settings;
mod workflow_file;

pub use error::ConfigError;
pub use paths::{
    default_global_config_path, default_state_root, CONFIG_PATH_ENV, GLOBAL_SETTINGS_FILE_NAME,
    GLOBAL_STATE_DIR,
};
pub use settings::{load_settings, Settings};
pub use workflow_file::{
    CleanupMode, ContextMode, SessionMode, StepSessionOverride, StepType, WorkflowAgent,
    WorkflowDefinition, WorkflowStep, RESERVED_STEP_IDS,
};
