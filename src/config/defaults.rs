//! Default values for configuration fields.

pub fn default_block_count() -> u8 {
    15
}

pub fn default_default_max_clients() -> u8 {
    12
}

pub fn default_persistent_idle_timeout_secs() -> u64 {
    300
}

pub fn default_log_directory() -> String {
    "logs".to_string()
}

pub fn default_log_file_name_prefix() -> String {
    "starboard-server".to_string()
}

pub fn default_log_rotation() -> String {
    "daily".to_string()
}
