//! Command handlers: plan, validate, init

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;
use volante::{BusinessFlow, Manifest, ModuleData, RowSelection, Settings, TestParameters};

use crate::config::CliConfig;
use crate::error::{CliError, CliResult};
use crate::output::ProgressReporter;

/// One resolved row of a `plan` listing
#[derive(Debug, Serialize)]
pub struct PlannedInstance {
    /// Resolved parameters, defaults applied
    #[serde(flatten)]
    pub params: TestParameters,
}

/// Resolve the manifest against the settings and list what would run
pub fn plan(
    config: &CliConfig,
    settings_path: &Path,
    manifest_path: &Path,
    run_configuration: Option<&str>,
    json: bool,
) -> CliResult<()> {
    let settings = Settings::load(settings_path)?;
    let manifest = Manifest::load(manifest_path)?;
    let name = run_configuration.unwrap_or(&settings.run_configuration);
    let run_config = manifest.run_configuration(name)?;

    let mut planned = Vec::new();
    for mut params in run_config.instances_to_run()? {
        settings.resolve(&mut params);
        planned.push(PlannedInstance { params });
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&planned)?);
        return Ok(());
    }

    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    reporter.header(&format!(
        "Run configuration \"{name}\": {} instance(s)",
        planned.len()
    ));
    for instance in &planned {
        let p = &instance.params;
        reporter.line(&format!(
            "  {}  {}/{}  [{} | {} | iterations: {} {}..{}]",
            p.test_instance,
            p.module,
            p.test_case,
            p.execution_mode
                .map_or_else(String::new, |m| m.to_string()),
            p.browser_and_platform(),
            p.iteration_mode,
            p.start_iteration,
            p.end_iteration,
        ));
    }
    Ok(())
}

/// Check the settings, manifest and per-module data files for problems
pub fn validate(
    config: &CliConfig,
    settings_path: &Path,
    manifest_path: &Path,
    datatable_dir: Option<&Path>,
) -> CliResult<()> {
    let settings = Settings::load(settings_path)?;
    let manifest = Manifest::load(manifest_path)?;
    let run_config = manifest.run_configuration(&settings.run_configuration)?;

    let mut reporter =
        ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let mut problems: Vec<String> = Vec::new();
    let executable: Vec<_> = run_config
        .entries
        .iter()
        .filter(|e| e.should_execute())
        .collect();

    reporter.header(&format!(
        "Validating \"{}\": {} executable instance(s)",
        run_config.name,
        executable.len()
    ));
    reporter.start_progress(executable.len() as u64, "checking instances");

    for entry in &executable {
        let label = format!("{}/{}", entry.test_scenario, entry.test_case);
        match entry.to_params() {
            Ok(params) => {
                if params.iteration_mode == volante::IterationMode::Range
                    && params.start_iteration > params.end_iteration
                {
                    problems.push(format!(
                        "{label}: start iteration {} exceeds end iteration {}",
                        params.start_iteration, params.end_iteration
                    ));
                }
                if let Some(dir) = datatable_dir {
                    check_module_data(dir, &params, &settings, &mut problems);
                }
            }
            Err(e) => problems.push(format!("{label}: {e}")),
        }
        reporter.increment(1);
    }
    reporter.finish();

    for problem in &problems {
        reporter.failure(problem);
    }
    reporter.summary(executable.len(), problems.len());

    if problems.is_empty() {
        info!("validation passed");
        Ok(())
    } else {
        Err(CliError::Validation {
            count: problems.len(),
        })
    }
}

fn check_module_data(
    dir: &Path,
    params: &TestParameters,
    settings: &Settings,
    problems: &mut Vec<String>,
) {
    let label = format!("{}/{}", params.module, params.test_case);
    let path = dir.join(format!("{}.yaml", params.module));
    if !path.exists() {
        problems.push(format!("{label}: data table {} not found", path.display()));
        return;
    }

    let data = match ModuleData::load(&path) {
        Ok(data) => data,
        Err(e) => {
            problems.push(format!("{label}: data table unreadable: {e}"));
            return;
        }
    };

    if let Err(e) = BusinessFlow::load(&data, &params.test_case) {
        problems.push(format!("{label}: {e}"));
    }

    let table = volante::DataTable::new(params.module.clone(), data, RowSelection::SubIterative)
        .with_default_sheet(settings.default_sheet.clone());
    match table.iteration_count(&params.test_case) {
        Ok(0) => problems.push(format!("{label}: no data rows configured")),
        Ok(_) => {}
        Err(e) => problems.push(format!("{label}: {e}")),
    }
}

const SETTINGS_TEMPLATE: &str = "# Volante global settings
project_name: MyProject
run_configuration: Smoke
execution_mode: Local
browser: Chrome
platform: Any
device_type: Desktop
on_error: NextIteration
thread_count: 1
element_wait_timeout_secs: 10
page_load_timeout_secs: 30
";

const MANIFEST_TEMPLATE: &str = "# Volante run manifest
run_configurations:
  Smoke:
    - execute: 'Yes'
      test_scenario: Login
      test_case: ValidLogin
      test_instance: '1'
      description: Sign in with valid credentials
";

const DATATABLE_TEMPLATE: &str = "# Data table for the Login module
sheets:
  General_Data:
    columns: [TestCase, Iteration, SubIteration, Username, Password]
    rows:
      - [ValidLogin, '1', '1', admin, '#AdminPassword']
  Business_Flow:
    columns: [TestCase]
    rows:
      - [ValidLogin, enterUsername, enterPassword, clickSubmit]
  Common:
    columns: [Key, Value]
    rows:
      - [AdminPassword, change-me]
";

/// Scaffold a starter settings file, manifest and data table
pub fn init(config: &CliConfig, dir: &Path) -> CliResult<()> {
    let reporter = ProgressReporter::new(config.color.should_color(), config.verbosity.is_quiet());
    let datatable_dir = dir.join("datatables");
    std::fs::create_dir_all(&datatable_dir)?;

    let files: [(PathBuf, &str); 3] = [
        (dir.join("settings.yaml"), SETTINGS_TEMPLATE),
        (dir.join("manifest.yaml"), MANIFEST_TEMPLATE),
        (datatable_dir.join("Login.yaml"), DATATABLE_TEMPLATE),
    ];

    for (path, _) in &files {
        if path.exists() {
            return Err(CliError::WouldOverwrite {
                path: path.display().to_string(),
            });
        }
    }
    for (path, contents) in &files {
        std::fs::write(path, contents)?;
        reporter.success(&format!("created {}", path.display()));
    }

    reporter.line("");
    reporter.line("Next: register your step libraries and run the batch from your runner binary.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, contents: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_init_scaffolds_parseable_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::default();
        init(&config, dir.path()).unwrap();

        // The generated templates must load through the library types
        let settings = Settings::load(dir.path().join("settings.yaml")).unwrap();
        assert_eq!(settings.run_configuration, "Smoke");
        let manifest = Manifest::load(dir.path().join("manifest.yaml")).unwrap();
        assert!(manifest.run_configurations.contains_key("Smoke"));
        let data = ModuleData::load(dir.path().join("datatables/Login.yaml")).unwrap();
        assert!(BusinessFlow::load(&data, "ValidLogin").is_ok());
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::default();
        init(&config, dir.path()).unwrap();
        let err = init(&config, dir.path()).unwrap_err();
        assert!(matches!(err, CliError::WouldOverwrite { .. }));
    }

    #[test]
    fn test_validate_accepts_the_scaffolded_project() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            verbosity: crate::config::Verbosity::Quiet,
            ..Default::default()
        };
        init(&config, dir.path()).unwrap();

        validate(
            &config,
            &dir.path().join("settings.yaml"),
            &dir.path().join("manifest.yaml"),
            Some(&dir.path().join("datatables")),
        )
        .unwrap();
    }

    #[test]
    fn test_validate_flags_missing_data_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            verbosity: crate::config::Verbosity::Quiet,
            ..Default::default()
        };
        let settings = write(dir.path(), "settings.yaml", "run_configuration: Smoke\n");
        let manifest = write(
            dir.path(),
            "manifest.yaml",
            "run_configurations:
  Smoke:
    - execute: 'Yes'
      test_scenario: Ghost
      test_case: Anything
",
        );
        let datatables = dir.path().join("datatables");
        std::fs::create_dir_all(&datatables).unwrap();

        let err = validate(&config, &settings, &manifest, Some(&datatables)).unwrap_err();
        assert!(matches!(err, CliError::Validation { count: _ }));
    }

    #[test]
    fn test_validate_flags_inverted_range() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            verbosity: crate::config::Verbosity::Quiet,
            ..Default::default()
        };
        let settings = write(dir.path(), "settings.yaml", "run_configuration: Smoke\n");
        let manifest = write(
            dir.path(),
            "manifest.yaml",
            "run_configurations:
  Smoke:
    - execute: 'Yes'
      test_scenario: Login
      test_case: ValidLogin
      iteration_mode: Range
      start_iteration: 5
      end_iteration: 2
",
        );

        let err = validate(&config, &settings, &manifest, None).unwrap_err();
        assert!(matches!(err, CliError::Validation { count: 1 }));
    }

    #[test]
    fn test_plan_resolves_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            verbosity: crate::config::Verbosity::Quiet,
            ..Default::default()
        };
        init(&config, dir.path()).unwrap();

        plan(
            &config,
            &dir.path().join("settings.yaml"),
            &dir.path().join("manifest.yaml"),
            None,
            false,
        )
        .unwrap();
    }
}
