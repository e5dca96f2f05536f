use std::path::PathBuf;

use walkdir::WalkDir;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn demos_root() -> PathBuf {
    workspace_root().join("demos").join("flows")
}

pub fn demo_dir(name: &str) -> PathBuf {
    demos_root().join(name)
}

pub fn testcase_path(name: &str) -> PathBuf {
    demo_dir(name).join("testcase.json")
}

/// Names of demo directories that carry a `testcase.json`, sorted.
pub fn demo_names() -> Vec<String> {
    let mut names: Vec<String> = WalkDir::new(demos_root())
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_dir() && entry.path().join("testcase.json").is_file())
        .map(|entry| entry.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workspace_root_points_to_workspace() {
        assert!(workspace_root().join("Cargo.toml").exists());
    }

    #[test]
    fn demos_root_points_to_demo_directory() {
        assert!(demos_root().is_dir());
    }

    #[test]
    fn demo_dir_joins_name() {
        assert!(demo_dir("01-greeting").is_dir());
    }

    #[test]
    fn testcase_path_joins_default_filename() {
        let path = testcase_path("01-greeting");
        assert!(path.ends_with("testcase.json"));
        assert!(path.is_file());
    }

    #[test]
    fn demo_names_lists_cases_in_order() {
        let names = demo_names();
        assert!(names.len() >= 5);
        assert_eq!(names.first().map(String::as_str), Some("01-greeting"));
        assert!(names.contains(&"03-transition".to_string()));
    }
}
