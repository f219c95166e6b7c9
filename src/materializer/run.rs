//! Whole-registry runs.

use serde::Serialize;
use std::time::{Duration, Instant};

use super::{Materializer, MaterializeOutcome, RepositoryOutcome};
use crate::error::Result;
use crate::paths;
use crate::registry::Registry;
use crate::ui::UserInterface;

/// Options for [`Materializer::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report what would happen without doing it.
    pub dry_run: bool,
    /// Leave archives alone.
    pub skip_archives: bool,
    /// Leave repositories alone.
    pub skip_repositories: bool,
}

/// A pull or setup step that exited unsuccessfully.
#[derive(Debug, Clone, Serialize)]
pub struct FailedStep {
    /// Repository URL the step belongs to.
    pub repository: String,
    /// Command line that failed.
    pub command: String,
    /// Exit code (None if it never started or was killed).
    pub exit_code: Option<i32>,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunSummary {
    pub downloaded: usize,
    pub resumed: usize,
    pub present: usize,
    pub cloned: usize,
    pub pulled: usize,
    /// Entries reported but not acted on (dry run).
    pub planned: usize,
    pub failed: Vec<FailedStep>,
    #[serde(skip)]
    pub duration: Duration,
}

impl RunSummary {
    /// Whether every subprocess step succeeded.
    pub fn success(&self) -> bool {
        self.failed.is_empty()
    }
}

impl Materializer {
    /// Materialize every archive, then every repository, in `registry`.
    ///
    /// Stops at the first fatal error (download, extraction, clone). Failed
    /// pull or setup steps are collected in the summary instead.
    pub fn run(
        &self,
        registry: &Registry,
        options: &RunOptions,
        ui: &mut dyn UserInterface,
    ) -> Result<RunSummary> {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        if !options.skip_archives {
            for artifact in registry.archives() {
                if options.dry_run {
                    let plan = self.plan_archive(artifact)?;
                    ui.message(&format!("  {}", plan));
                    summary.planned += 1;
                    continue;
                }

                let label = paths::archive_file_name(&artifact.url)
                    .unwrap_or_else(|_| artifact.url.clone());
                let mut spinner = ui.start_spinner(&format!("Fetching {}", label));

                match self.materialize(artifact) {
                    Ok(outcome) => {
                        let dest = outcome.destination().display().to_string();
                        match outcome {
                            MaterializeOutcome::Downloaded { .. } => {
                                summary.downloaded += 1;
                                spinner.finish_success(&format!("{} -> {}", label, dest));
                            }
                            MaterializeOutcome::Resumed { .. } => {
                                summary.resumed += 1;
                                spinner.finish_success(&format!(
                                    "{} -> {} (already downloaded)",
                                    label, dest
                                ));
                            }
                            MaterializeOutcome::AlreadyPresent { .. } => {
                                summary.present += 1;
                                spinner.finish_skipped(&format!("{} (present)", label));
                            }
                        }
                    }
                    Err(e) => {
                        spinner.finish_error(&format!("{} failed", label));
                        return Err(e);
                    }
                }
            }
        }

        if !options.skip_repositories {
            for repo in registry.repositories() {
                if options.dry_run {
                    let plan = self.plan_repository(repo)?;
                    ui.message(&format!("  {}", plan));
                    summary.planned += 1;
                    continue;
                }

                let mut spinner = ui.start_spinner(&format!("Updating {}", repo.url));

                let outcome = match self.clone_or_pull(repo) {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        spinner.finish_error(&format!("Clone of {} failed", repo.url));
                        return Err(e);
                    }
                };

                match &outcome {
                    RepositoryOutcome::Cloned { .. } => summary.cloned += 1,
                    RepositoryOutcome::Pulled { .. } => summary.pulled += 1,
                }

                if let Some(step) = outcome.failed_step() {
                    spinner.finish_error(&format!("{} exited with {:?}", step.command, step.exit_code));
                    ui.show_error_block(&step.command, &step.combined_output());
                    summary.failed.push(FailedStep {
                        repository: repo.url.clone(),
                        command: step.command.clone(),
                        exit_code: step.exit_code,
                    });
                    continue;
                }

                let verb = match outcome {
                    RepositoryOutcome::Cloned { .. } => "Cloned",
                    RepositoryOutcome::Pulled { .. } => "Pulled",
                };
                spinner.finish_success(&format!(
                    "{} {} -> {}",
                    verb,
                    repo.url,
                    outcome.destination().display()
                ));

                if ui.output_mode().shows_command_output() {
                    let step = outcome.step();
                    ui.message(&format!("    $ {}", step.command));
                    for line in step.combined_output().lines() {
                        ui.message(&format!("    {}", line));
                    }
                }
            }
        }

        summary.duration = start.elapsed();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DepfetchError;
    use crate::platform::Platform;
    use crate::registry::{ArtifactRef, RepositoryRef, SetupStep};
    use crate::ui::{MockUI, SpinnerOutcome};
    use httpmock::prelude::*;
    use tempfile::TempDir;

    fn setup_repo(destination: &str) -> RepositoryRef {
        RepositoryRef {
            url: "https://example.com/common.git".into(),
            branch: "master".into(),
            destination: destination.into(),
            setup: SetupStep {
                path: ".".into(),
                entry: "setup.sh".into(),
                interpreter: None,
            },
        }
    }

    #[test]
    fn dry_run_touches_nothing() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET);
            then.status(200);
        });
        let temp = TempDir::new().unwrap();
        let m = Materializer::new(temp.path().join("scripts")).unwrap();
        let registry = Registry::from_entries(
            Platform::Linux,
            vec![ArtifactRef::new(server.url("/a.zip"), "../A")],
            vec![setup_repo("../Common")],
        );
        let mut ui = MockUI::new();
        let options = RunOptions {
            dry_run: true,
            ..Default::default()
        };

        let summary = m.run(&registry, &options, &mut ui).unwrap();

        mock.assert_calls(0);
        assert_eq!(summary.planned, 2);
        assert!(summary.success());
        assert!(ui.has_message("download"));
        assert!(ui.has_message("clone https://example.com/common.git"));
        assert!(!temp.path().join("A").exists());
        assert!(!temp.path().join("Common").exists());
    }

    #[test]
    fn present_opaque_files_are_counted_and_skipped() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("T")).unwrap();
        std::fs::write(temp.path().join("T/tool.exe"), "MZ").unwrap();
        let m = Materializer::new(temp.path().join("scripts")).unwrap();
        let registry = Registry::from_entries(
            Platform::Windows,
            vec![ArtifactRef::new("http://127.0.0.1:9/tool.exe", "../T")],
            vec![],
        );
        let mut ui = MockUI::new();

        let summary = m.run(&registry, &RunOptions::default(), &mut ui).unwrap();

        assert_eq!(summary.present, 1);
        assert_eq!(summary.downloaded, 0);
        assert_eq!(
            ui.spinner_outcomes(),
            vec![SpinnerOutcome::Skipped("tool.exe (present)".to_string())]
        );
    }

    #[test]
    fn download_failure_stops_the_run() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.path("/first.zip");
            then.status(500);
        });
        let second = server.mock(|when, then| {
            when.path("/second.zip");
            then.status(200);
        });
        let temp = TempDir::new().unwrap();
        let m = Materializer::new(temp.path().join("scripts")).unwrap();
        let registry = Registry::from_entries(
            Platform::Linux,
            vec![
                ArtifactRef::new(server.url("/first.zip"), "../First"),
                ArtifactRef::new(server.url("/second.zip"), "../Second"),
            ],
            vec![],
        );
        let mut ui = MockUI::new();

        let err = m
            .run(&registry, &RunOptions::default(), &mut ui)
            .unwrap_err();

        assert!(matches!(err, DepfetchError::DownloadFailed { .. }));
        second.assert_calls(0);
        assert!(matches!(
            ui.spinner_outcomes().last(),
            Some(SpinnerOutcome::Error(_))
        ));
    }

    #[test]
    fn skip_flags_filter_entries() {
        let temp = TempDir::new().unwrap();
        let m = Materializer::new(temp.path().join("scripts")).unwrap();
        let registry = Registry::from_entries(
            Platform::Linux,
            vec![ArtifactRef::new("http://127.0.0.1:9/a.zip", "../A")],
            vec![setup_repo("../Common")],
        );
        let mut ui = MockUI::new();
        let options = RunOptions {
            skip_archives: true,
            skip_repositories: true,
            ..Default::default()
        };

        let summary = m.run(&registry, &options, &mut ui).unwrap();

        assert!(ui.spinners().is_empty());
        assert_eq!(summary.downloaded + summary.cloned + summary.planned, 0);
    }

    #[cfg(unix)]
    #[test]
    fn failed_setup_is_collected_and_run_continues() {
        use crate::fetch::git::test_support::{create_bare_repo, GIT_LOCK};

        let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        let bare = create_bare_repo(&upstream, &[("setup.sh", "#!/bin/sh\nexit 2\n")]);
        let url = bare.to_string_lossy().to_string();
        let m = Materializer::new(temp.path().join("scripts")).unwrap();
        let mut first = setup_repo("../One");
        first.url = url.clone();
        first.branch = "main".into();
        let mut second = setup_repo("../Two");
        second.url = url;
        second.branch = "main".into();
        let registry = Registry::from_entries(Platform::Linux, vec![], vec![first, second]);
        let mut ui = MockUI::new();

        let summary = m.run(&registry, &RunOptions::default(), &mut ui).unwrap();

        assert_eq!(summary.cloned, 2);
        assert_eq!(summary.failed.len(), 2);
        assert_eq!(summary.failed[0].exit_code, Some(2));
        assert!(!summary.success());
        assert_eq!(ui.error_blocks().len(), 2);
    }

    #[cfg(unix)]
    #[test]
    fn verbose_mode_shows_setup_output() {
        use crate::fetch::git::test_support::{create_bare_repo, GIT_LOCK};
        use crate::ui::OutputMode;

        let _lock = GIT_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let temp = TempDir::new().unwrap();
        let upstream = temp.path().join("upstream");
        std::fs::create_dir_all(&upstream).unwrap();
        let bare = create_bare_repo(
            &upstream,
            &[("setup.sh", "#!/bin/sh\necho generated headers\n")],
        );
        let m = Materializer::new(temp.path().join("scripts")).unwrap();
        let mut repo = setup_repo("../Common");
        repo.url = bare.to_string_lossy().to_string();
        repo.branch = "main".into();
        let registry = Registry::from_entries(Platform::Linux, vec![], vec![repo]);

        let mut normal = MockUI::new();
        m.run(&registry, &RunOptions::default(), &mut normal).unwrap();
        assert!(!normal.has_message("generated headers"));

        std::fs::remove_dir_all(temp.path().join("Common")).unwrap();
        let mut verbose = MockUI::with_mode(OutputMode::Verbose);
        let summary = m.run(&registry, &RunOptions::default(), &mut verbose).unwrap();

        assert!(summary.success());
        assert!(verbose.has_message("setup.sh"));
        assert!(verbose.has_message("generated headers"));
    }
}
