//! Runs the process-backed executor against a fake migrate script

#[cfg(all(test, unix))]
mod tests {
    use rustf_migration_test::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    // Appends its arguments to calls.log; fails when asked for migration "broken"
    const FAKE_MIGRATE: &str = r#"
echo "$@" >> calls.log
if [ "$3" = "broken" ]; then
    echo "conflicting column 'total'" >&2
    exit 3
fi
"#;

    fn fake_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("migrate.sh"), FAKE_MIGRATE).unwrap();
        temp_dir
    }

    fn executor(dir: &Path) -> CommandExecutor {
        CommandExecutor::new("sh").arg("migrate.sh").current_dir(dir)
    }

    fn logged_calls(dir: &Path) -> Vec<String> {
        fs::read_to_string(dir.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_apply_passes_target_and_options() {
        let project = fake_project();
        let executor = executor(project.path());

        executor
            .apply(
                "billing",
                &MigrationTarget::parse("0006"),
                &CommandOptions::new(Some("reporting".to_string())),
            )
            .unwrap();
        executor
            .apply("billing", &MigrationTarget::Latest, &CommandOptions::default())
            .unwrap();

        assert_eq!(
            logged_calls(project.path()),
            vec![
                "migrate billing 0006 --verbosity 0 --database reporting",
                "migrate billing --verbosity 0",
            ]
        );
    }

    #[test]
    fn test_failed_command_reports_stderr() {
        let project = fake_project();
        let executor = executor(project.path());

        let err = executor
            .apply("billing", &MigrationTarget::parse("broken"), &CommandOptions::default())
            .unwrap_err();

        assert!(matches!(err, Error::DatabaseMigration(_)));
        let message = err.to_string();
        assert!(message.contains("exit 3"));
        assert!(message.contains("conflicting column 'total'"));
    }

    #[test]
    fn test_drives_a_migration_test_case() {
        let project = fake_project();
        let executor = executor(project.path());
        let loader = StaticSchemaLoader::new()
            .with_state("0005", ProjectState::new("billing"))
            .with_state("0006", ProjectState::new("billing"));
        let spec = MigrationSpec::new("billing").migrate_from("0005").migrate_to("0006");

        run_migration_test(spec, &executor, &loader, |case| case.run_forward()).unwrap();

        assert_eq!(
            logged_calls(project.path()),
            vec![
                "migrate billing 0005 --verbosity 0",
                "migrate billing 0006 --verbosity 0",
                "migrate billing --verbosity 0",
            ]
        );
    }
}
