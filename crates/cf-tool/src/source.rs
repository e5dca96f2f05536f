use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::{CfToolError, TestCase, TESTCASE_SCHEMA_V1};

pub fn read_flows_xml_from_dir(flow_dir: &Path) -> Result<BTreeMap<String, String>, CfToolError> {
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
        if !path.to_string_lossy().ends_with(".flow.xml") {
            continue;
        }

        let Ok(relative) = path.strip_prefix(flow_dir) else {
            continue;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");

        let content = fs::read_to_string(path).map_err(|source| CfToolError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        flows.insert(relative, content);
    }

    if flows.is_empty() {
        return Err(CfToolError::SourceEmpty {
            path: flow_dir.to_path_buf(),
        });
    }

    Ok(flows)
}

pub fn read_test_case(case_path: &Path) -> Result<TestCase, CfToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| CfToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| CfToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(CfToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}
