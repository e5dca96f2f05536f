use cf_core::FlowError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> FlowError {
    FlowError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: FlowError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"\"".to_string())
    );
    1
}

pub(crate) fn map_host_io(error: std::io::Error) -> FlowError {
    map_error("HOST_IO", error)
}

pub(crate) fn map_cli_stdin(error: std::io::Error) -> FlowError {
    map_error("CLI_STDIN", error)
}

pub(crate) fn map_cli_runtime(error: std::io::Error) -> FlowError {
    map_error("CLI_RUNTIME", error)
}

pub(crate) fn map_cli_log_filter(error: impl Display) -> FlowError {
    map_error("CLI_LOG_FILTER", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> FlowError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> FlowError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> FlowError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_settings_read(error: std::io::Error) -> FlowError {
    map_error("CLI_SETTINGS_READ", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(FlowError::new("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(map_host_io(std::io::Error::other("io")).code, "HOST_IO");
        assert_eq!(map_cli_stdin(std::io::Error::other("io")).code, "CLI_STDIN");
        assert_eq!(
            map_cli_runtime(std::io::Error::other("rt")).code,
            "CLI_RUNTIME"
        );
        assert_eq!(map_cli_log_filter("bad").code, "CLI_LOG_FILTER");
        assert_eq!(
            map_cli_source_path(std::io::Error::other("path")).code,
            "CLI_SOURCE_PATH"
        );

        let strip_error = std::path::Path::new("/a")
            .strip_prefix("/b")
            .expect_err("strip prefix");
        assert_eq!(map_cli_source_scan(strip_error).code, "CLI_SOURCE_SCAN");

        assert_eq!(
            map_cli_source_read(std::io::Error::other("read")).code,
            "CLI_SOURCE_READ"
        );
        assert_eq!(
            map_cli_settings_read(std::io::Error::other("read")).code,
            "CLI_SETTINGS_READ"
        );
    }
}
