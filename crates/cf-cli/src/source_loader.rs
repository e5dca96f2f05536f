use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cf_core::{FlowError, Settings};
use walkdir::WalkDir;

use crate::{map_cli_settings_read, map_cli_source_path, map_cli_source_read, map_cli_source_scan};

const FLOW_SUFFIX: &str = ".flow.xml";

pub(crate) fn load_flows_by_dir(flow_dir: &str) -> Result<BTreeMap<String, String>, FlowError> {
    let root = resolve_flow_dir(flow_dir)?;
    read_flows_xml_from_dir(&root)
}

pub(crate) fn resolve_flow_dir(flow_dir: &str) -> Result<PathBuf, FlowError> {
    let path = PathBuf::from(flow_dir);
    let absolute = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(path)
    };

    if !absolute.exists() {
        return Err(FlowError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("flow-dir does not exist: {}", absolute.display()),
        ));
    }

    if !absolute.is_dir() {
        return Err(FlowError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("flow-dir is not a directory: {}", absolute.display()),
        ));
    }

    Ok(absolute)
}

pub(crate) fn read_flows_xml_from_dir(
    flow_dir: &Path,
) -> Result<BTreeMap<String, String>, FlowError> {
    let mut flows = BTreeMap::new();

    for entry in WalkDir::new(flow_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if !path.to_string_lossy().ends_with(FLOW_SUFFIX) {
            continue;
        }

        let relative = path
            .strip_prefix(flow_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        flows.insert(relative, content);
    }

    if flows.is_empty() {
        return Err(FlowError::new(
            "CLI_SOURCE_EMPTY",
            format!("No {} files under {}", FLOW_SUFFIX, flow_dir.display()),
        ));
    }

    Ok(flows)
}

/// Reads the optional settings file. Without one every field takes its default.
pub(crate) fn load_settings(path: Option<&str>) -> Result<Settings, FlowError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    let source = fs::read_to_string(path).map_err(map_cli_settings_read)?;
    Settings::from_json_str(&source)
}

#[cfg(test)]
mod source_loader_tests {
    use super::*;
    use crate::cli_test_support::*;
    use cf_core::BotDelivery;

    #[test]
    fn resolve_flow_dir_validates_existence_and_directory() {
        let missing = temp_path("missing-dir");
        let missing_err = resolve_flow_dir(missing.to_string_lossy().as_ref())
            .expect_err("missing path should fail");
        assert_eq!(missing_err.code, "CLI_SOURCE_NOT_FOUND");

        let file_path = temp_path("plain-file");
        write_file(&file_path, "x");
        let file_err = resolve_flow_dir(file_path.to_string_lossy().as_ref())
            .expect_err("file path should fail");
        assert_eq!(file_err.code, "CLI_SOURCE_NOT_DIR");
    }

    #[test]
    fn read_flows_xml_from_dir_keeps_only_flow_documents() {
        let root = temp_path("flow-dir");
        write_file(&root.join("main.flow.xml"), "<flow></flow>");
        write_file(&root.join("nested").join("more.flow.xml"), "<flow></flow>");
        write_file(&root.join("notes.xml"), "<notes/>");
        write_file(&root.join("skip.txt"), "ignored");

        let flows = read_flows_xml_from_dir(&root).expect("scan should pass");
        assert_eq!(
            flows.keys().cloned().collect::<Vec<_>>(),
            vec!["main.flow.xml".to_string(), "nested/more.flow.xml".to_string()]
        );
    }

    #[test]
    fn read_flows_xml_from_dir_errors_when_no_flow_files() {
        let root = temp_path("empty-flow-dir");
        write_file(&root.join("readme.txt"), "not source");

        let error = read_flows_xml_from_dir(&root).expect_err("empty source set should fail");
        assert_eq!(error.code, "CLI_SOURCE_EMPTY");
    }

    #[test]
    fn load_settings_defaults_and_reads_files() {
        assert_eq!(
            load_settings(None).expect("default settings"),
            Settings::default()
        );

        let path = temp_path("settings.json");
        write_file(&path, r#"{"botDelivery":"stream","streamChunkDelayMs":0}"#);
        let settings =
            load_settings(Some(path.to_string_lossy().as_ref())).expect("settings should load");
        assert_eq!(settings.bot_delivery, BotDelivery::Stream);
        assert_eq!(settings.stream_chunk_delay_ms, 0);

        let missing = temp_path("missing-settings.json");
        let error = load_settings(Some(missing.to_string_lossy().as_ref()))
            .expect_err("missing file should fail");
        assert_eq!(error.code, "CLI_SETTINGS_READ");

        let broken = temp_path("broken-settings.json");
        write_file(&broken, "{");
        let error = load_settings(Some(broken.to_string_lossy().as_ref()))
            .expect_err("broken file should fail");
        assert_eq!(error.code, "CONFIG_SETTINGS_INVALID");
    }
}
