//! Command line front-end for the anamnesis template store.
//!
//! # Responsibility
//! - Validate, import, export, list and delete templates from a shell.
//! - Resolve configuration once (`.env`, environment, flags) at startup.

use anamnesis_core::db::open_db;
use anamnesis_core::{
    init_logging, validate_for_submission, AnamnesisTemplate, CoreConfig, ServiceError,
    SqliteTemplateRepository, TemplateEditor, TemplateListQuery, TemplateRepository,
    TemplateService, KNOWN_TEMPLATE_TYPES,
};
use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "anamnesis")]
#[command(about = "Manage anamnesis questionnaire templates")]
#[command(version)]
struct Cli {
    /// Template store file (overrides ANAMNESIS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,
    /// Absolute directory for rolling logs (overrides ANAMNESIS_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,
    /// Log level: trace|debug|info|warn|error (overrides ANAMNESIS_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a template JSON file against the submission rules
    Validate {
        /// Path to the template document
        file: PathBuf,
    },
    /// Store a template JSON file as a new template
    Import {
        /// Path to the template document
        file: PathBuf,
    },
    /// Print a stored template as JSON
    Export {
        /// Template id
        id: String,
        /// Write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List stored templates
    List {
        /// Case-insensitive name filter
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Show the groups and questions of a stored template
    Show {
        /// Template id
        id: String,
    },
    /// Delete a stored template
    Delete {
        /// Template id
        id: String,
    },
}

fn main() -> anyhow::Result<()> {
    // Missing .env is fine; explicit environment and flags still apply.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Some(log_dir) = config.log_dir() {
        init_logging(config.log_level(), log_dir).context("failed to initialize logging")?;
    }

    match cli.command {
        Commands::Validate { file } => validate_file(&file),
        command => {
            let conn = open_db(config.db_path())
                .with_context(|| format!("failed to open {}", config.db_path().display()))?;
            let service =
                TemplateService::with_config(SqliteTemplateRepository::try_new(&conn)?, &config);
            run(command, &service)
        }
    }
}

fn run<R: TemplateRepository>(
    command: Commands,
    service: &TemplateService<R>,
) -> anyhow::Result<()> {
    match command {
        Commands::Validate { file } => validate_file(&file)?,
        Commands::Import { file } => {
            let template = read_template(&file)?;
            let mut editor = TemplateEditor::hydrate(AnamnesisTemplate {
                id: None,
                ..template
            })?;
            let id = service.save(&mut editor).map_err(report_validation)?;
            info!("event=cli_import module=cli status=ok template_id={id}");
            println!("{id}");
        }
        Commands::Export { id, out } => {
            let json = service.open(&id)?.template().to_json_pretty()?;
            match out {
                Some(path) => fs::write(&path, json)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{json}"),
            }
        }
        Commands::List {
            search,
            limit,
            offset,
        } => {
            let summaries = service.list(&TemplateListQuery {
                search,
                limit,
                offset,
            })?;
            if summaries.is_empty() {
                println!("No templates found.");
            }
            for summary in summaries {
                println!(
                    "{}\t{}\t{}\tgroups={}\tquestions={}",
                    summary.id,
                    summary.name,
                    summary.category,
                    summary.group_count,
                    summary.question_count
                );
            }
        }
        Commands::Show { id } => {
            let editor = service.open(&id)?;
            let template = editor.template();
            println!("{} [{}]", template.name, template.category);
            for group in &template.groups {
                println!("  {}", group.name);
                for question in &group.questions {
                    let marker = if question.required { "*" } else { "" };
                    println!(
                        "    {}. {}{} ({})",
                        question.order, question.text, marker, question.kind
                    );
                    for option in question.options() {
                        println!("       - {}", option.text);
                    }
                }
            }
        }
        Commands::Delete { id } => {
            service.delete(&id)?;
            println!("deleted {id}");
        }
    }

    Ok(())
}

fn resolve_config(cli: &Cli) -> anyhow::Result<CoreConfig> {
    let mut config = CoreConfig::from_env()?;
    if let Some(db) = &cli.db {
        config = config.with_db_path(db);
    }
    if let Some(dir) = &cli.log_dir {
        config = config.with_log_dir(dir);
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(level);
    }
    Ok(config)
}

fn read_template(file: &Path) -> anyhow::Result<AnamnesisTemplate> {
    let json =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    Ok(AnamnesisTemplate::from_json(&json)?)
}

fn validate_file(file: &Path) -> anyhow::Result<()> {
    let template = read_template(file)?;
    template.check_structure()?;
    if !template.has_known_type() {
        eprintln!(
            "warning: type `{}` is not one of {}",
            template.category,
            KNOWN_TEMPLATE_TYPES.join(", ")
        );
    }
    match validate_for_submission(&template) {
        Ok(()) => {
            println!("ok");
            Ok(())
        }
        Err(failed) => {
            for message in failed.messages() {
                eprintln!("error: {message}");
            }
            bail!("{} validation issue(s)", failed.issues.len())
        }
    }
}

fn report_validation(err: ServiceError) -> anyhow::Error {
    if let ServiceError::Validation(failed) = &err {
        for message in failed.messages() {
            eprintln!("error: {message}");
        }
    }
    err.into()
}
