//! Command dispatch: maps parsed arguments onto the lineage service.

use std::io;
use std::path::Path;

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::LineageService;
use crate::cli::args::{AppCommands, Cli, Commands, ConfigCommands, ShowFormat, TreeCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::output;
use crate::config::{global_config_path, Settings};
use crate::domain::{label, outline, DomainError, ForestRender, HeirForest, MemberId, RenderOptions};
use crate::infrastructure::di::ServiceContainer;
use crate::infrastructure::InfraError;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        return Ok(());
    };

    if let Commands::Completion { shell } = command {
        let mut cmd = Cli::command();
        let name = cmd.get_name().to_string();
        generate(*shell, &mut cmd, name, &mut io::stdout());
        return Ok(());
    }

    let settings = load_settings(cli)?;
    let container = ServiceContainer::new(settings);

    match command {
        Commands::Tree { command } => execute_tree(&container, command),
        Commands::App { command } => execute_app(&container, command),
        Commands::Config { command } => execute_config(&container, command),
        Commands::Info => info(&container),
        Commands::Completion { .. } => Ok(()),
    }
}

/// Layered settings plus command line overrides.
fn load_settings(cli: &Cli) -> CliResult<Settings> {
    let mut settings = Settings::load()?;
    if let Some(dir) = &cli.data_dir {
        settings.data_dir = dir.clone();
    }
    if let Some(policy) = cli.policy {
        settings.reference_policy = policy.into();
    }
    if cli.ids {
        settings.render.show_ids = true;
    }
    debug!("settings: {:?}", settings);
    Ok(settings)
}

fn execute_tree(container: &ServiceContainer, command: &TreeCommands) -> CliResult<()> {
    let service = container.lineage_service();
    let options = container.settings.render_options();

    match command {
        TreeCommands::Show { file } => {
            let forest = service.forest_from_file(file)?;
            print_trees(&forest, &options);
            Ok(())
        }
        TreeCommands::Json { file } => {
            let forest = service.forest_from_file(file)?;
            print_json(&forest)
        }
        TreeCommands::Outline { file } => {
            let forest = service.forest_from_file(file)?;
            print!("{}", outline(&forest, &options));
            Ok(())
        }
        TreeCommands::Branches { file } => _branches(&service, file, &options),
        TreeCommands::Leaves { file } => {
            let forest = service.forest_from_file(file)?;
            for leaf in forest.leaf_nodes() {
                output::info(&label(leaf, &options));
            }
            Ok(())
        }
        TreeCommands::Ancestors { file, id } => _ancestors(&service, file, id, &options),
        TreeCommands::Validate { file } => _validate(&service, file),
    }
}

#[instrument(skip(service, options))]
fn _branches(service: &LineageService, file: &Path, options: &RenderOptions) -> CliResult<()> {
    let forest = service.forest_from_file(file)?;
    let branches = forest.branches();
    debug!("found {} branches", branches.len());
    for branch in branches {
        let labels: Vec<String> = branch.iter().map(|r| label(r, options)).collect();
        output::lineage(&labels);
    }
    Ok(())
}

#[instrument(skip(service, options))]
fn _ancestors(
    service: &LineageService,
    file: &Path,
    id: &str,
    options: &RenderOptions,
) -> CliResult<()> {
    if id.trim().is_empty() {
        return Err(CliError::InvalidArgs("member id must not be empty".to_string()));
    }
    let forest = service.forest_from_file(file)?;
    let id = MemberId::new(id);
    let node = forest
        .find(&id)
        .ok_or_else(|| DomainError::MemberNotFound(id.clone()))?;

    output::header(&label(&node.record, options));
    for ancestor in forest.ancestors(&id) {
        output::detail(&label(ancestor, options));
    }
    Ok(())
}

#[instrument(skip(service))]
fn _validate(service: &LineageService, file: &Path) -> CliResult<()> {
    let records = service.read_records(file)?;
    let issues = service.check(&records);
    if issues.is_empty() {
        output::success(&format!(
            "{}: {} members, references valid",
            file.display(),
            records.len()
        ));
        return Ok(());
    }

    output::header(&format!("{}:", file.display()));
    for issue in &issues {
        output::failure(issue);
    }
    Err(CliError::Validation(issues.len()))
}

fn execute_app(container: &ServiceContainer, command: &AppCommands) -> CliResult<()> {
    let service = container.lineage_service();
    let options = container.settings.render_options();

    match command {
        AppCommands::Submit {
            application,
            drafts,
        } => {
            let drafts = service.read_drafts(drafts)?;
            let ids = service.submit(application, &drafts)?;
            output::action(
                "Submitted",
                &format!("{} members to application {}", ids.len(), application),
            );
            Ok(())
        }
        AppCommands::Show {
            application,
            format,
        } => {
            let forest = service.load_forest(application)?;
            match format {
                ShowFormat::Tree => {
                    print_trees(&forest, &options);
                    Ok(())
                }
                ShowFormat::Outline => {
                    print!("{}", outline(&forest, &options));
                    Ok(())
                }
                ShowFormat::Json => print_json(&forest),
            }
        }
        AppCommands::List => {
            for application in service.applications()? {
                output::info(&application);
            }
            Ok(())
        }
    }
}

fn execute_config(container: &ServiceContainer, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => {
            output::info(&container.settings.to_toml()?);
            Ok(())
        }
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("Global config", &path.display()),
                None => output::warning("cannot determine global config directory"),
            }
            output::action("Data dir", &container.settings.data_dir.display());
            Ok(())
        }
        ConfigCommands::Init { force } => {
            let path = global_config_path().ok_or_else(|| {
                CliError::Usage("cannot determine global config directory".to_string())
            })?;
            if container.fs.exists(&path) && !force {
                return Err(CliError::Usage(format!(
                    "config already exists: {} (use --force to overwrite)",
                    path.display()
                )));
            }
            container
                .fs
                .ensure_parent(&path)
                .and_then(|_| container.fs.write(&path, &Settings::template()))
                .map_err(|e| InfraError::io(format!("write config {}", path.display()), e))?;
            output::action("Created", &path.display());
            Ok(())
        }
    }
}

fn info(container: &ServiceContainer) -> CliResult<()> {
    let settings = &container.settings;
    let applications = container.lineage_service().applications()?;

    output::header(&format!("warish {}", env!("CARGO_PKG_VERSION")));
    output::detail(&format!("data dir:         {}", settings.data_dir.display()));
    output::detail(&format!("reference policy: {}", settings.reference_policy));
    output::detail(&format!("applications:     {}", applications.len()));
    Ok(())
}

fn print_trees(forest: &HeirForest, options: &RenderOptions) {
    match forest.render_trees(options) {
        Some(text) => print!("{}", text),
        None if forest.is_empty() => output::warning("no members"),
        None => output::warning(&format!(
            "{} members, none reachable from a root (parent cycle)",
            forest.len()
        )),
    }
}

fn print_json(forest: &HeirForest) -> CliResult<()> {
    let json = serde_json::to_string_pretty(&forest.to_nodes())
        .map_err(|e| InfraError::json("forest", e))?;
    output::info(&json);
    Ok(())
}
