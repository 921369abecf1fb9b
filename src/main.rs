use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use clubdesk::controller::{AssumeYes, Confirm, RemoveOutcome};
use clubdesk::export::{ExportFile, ExportFormat};
use clubdesk::form::FormData;
use clubdesk::notify::ConsoleNotifier;
use clubdesk::preview::read_selected_file;
use clubdesk::resources::{self, ResourceSpec};
use clubdesk::transport::{FileAction, HttpTransport};
use clubdesk::{PortalConfig, PortalError, RecordId, ResourceListController};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("unknown resource `{0}`; run `clubdesk resources` for the list")]
    UnknownResource(String),
    #[error("{0}")]
    Portal(#[from] PortalError),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "clubdesk", about = "Club administration portal CLI")]
struct Cli {
    #[arg(long, env = "PORTAL_BASE_URL")]
    base_url: Option<String>,

    #[arg(long, env = "PORTAL_SESSION_COOKIE")]
    session_cookie: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the known resource keys.
    Resources,
    List {
        resource: String,
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    Show {
        resource: String,
        id: String,
    },
    Create {
        resource: String,
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Update {
        resource: String,
        id: String,
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
        #[arg(long)]
        file: Option<PathBuf>,
    },
    Delete {
        resource: String,
        id: String,
        #[arg(long, default_value_t = false)]
        yes: bool,
    },
    Export {
        resource: String,
        #[arg(long, value_enum, default_value_t = FormatArg::Csv)]
        format: FormatArg,
        #[arg(long, default_value = ".")]
        out: PathBuf,
        #[arg(long, default_value_t = false, help = "Download the server-side export instead")]
        remote: bool,
    },
    Link {
        resource: String,
        id: String,
        #[arg(value_enum)]
        action: LinkArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum FormatArg {
    Csv,
    Json,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => Self::Csv,
            FormatArg::Json => Self::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LinkArg {
    View,
    Download,
}

type Controller = ResourceListController<HttpTransport>;

/// Asks on stderr and reads the answer from stdin.
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("{prompt} [y/N] ");
        if io::stderr().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        match io::stdin().lock().read_line(&mut answer) {
            Ok(_) => matches!(answer.trim(), "y" | "Y" | "yes"),
            Err(_) => false,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let cli = Cli::parse();
    let mut config = PortalConfig::from_env().with_session_cookie(cli.session_cookie);
    if let Some(base_url) = &cli.base_url {
        config = config.with_base_url(base_url);
    }

    match cli.command {
        Command::Resources => {
            for spec in resources::catalog() {
                println!("{:<12} {:<28} {}", spec.key, spec.endpoint, spec.label);
            }
            Ok(())
        }
        Command::List { resource, json } => run_list(&config, &resource, json).await,
        Command::Show { resource, id } => {
            let controller = controller(&config, &resource)?;
            let session = controller.begin_edit(&RecordId::new(id)).await?;
            print_json(&session.record)
        }
        Command::Create { resource, fields, file } => {
            let controller = controller(&config, &resource)?;
            let form = build_form(controller.spec(), FormData::new(), &fields, file).await?;
            if let Some(record) = controller.create(form).await? {
                print_json(&record)?;
            }
            Ok(())
        }
        Command::Update { resource, id, fields, file } => {
            let controller = controller(&config, &resource)?;
            let session = controller.begin_edit(&RecordId::new(id)).await?;
            let form = build_form(controller.spec(), session.form, &fields, file).await?;
            if let Some(record) = controller.submit(form).await? {
                print_json(&record)?;
            }
            Ok(())
        }
        Command::Delete { resource, id, yes } => {
            let confirm: Arc<dyn Confirm> = if yes { Arc::new(AssumeYes) } else { Arc::new(StdinConfirm) };
            let controller = controller(&config, &resource)?.with_confirm(confirm);
            if controller.remove(&RecordId::new(id)).await? == RemoveOutcome::Cancelled {
                eprintln!("cancelled");
            }
            Ok(())
        }
        Command::Export { resource, format, out, remote } => {
            let controller = controller(&config, &resource)?;
            let file = if remote {
                controller.export_remote(format.into()).await?
            } else {
                match ExportFormat::from(format) {
                    ExportFormat::Csv => controller.export_csv().await?,
                    ExportFormat::Json => controller.export_json().await?,
                }
            };
            write_export(&out, &file).await
        }
        Command::Link { resource, id, action } => {
            let controller = controller(&config, &resource)?;
            let action = match action {
                LinkArg::View => FileAction::View,
                LinkArg::Download => FileAction::Download,
            };
            println!("{}", controller.file_link(&RecordId::new(id), action));
            Ok(())
        }
    }
}

fn controller(config: &PortalConfig, key: &str) -> Result<Controller, CliError> {
    let spec = resources::find(key).ok_or_else(|| CliError::UnknownResource(key.to_owned()))?;
    let transport = HttpTransport::new(config)?;
    Ok(ResourceListController::new(spec, transport)
        .with_notifier(Arc::new(ConsoleNotifier))
        .with_max_upload(config.max_upload_bytes))
}

async fn run_list(config: &PortalConfig, key: &str, json: bool) -> Result<(), CliError> {
    let controller = controller(config, key)?;
    controller.initialize().await?;
    if json {
        return print_json(&controller.items());
    }
    println!("<table class=\"table\">");
    println!("{}", controller.spec().table.header().to_html());
    println!("{}", controller.view_html());
    println!("</table>");
    Ok(())
}

async fn build_form(
    spec: &ResourceSpec,
    mut form: FormData,
    assignments: &[String],
    file: Option<PathBuf>,
) -> Result<FormData, CliError> {
    for raw in assignments {
        let (key, value) = FormData::parse_assignment(raw)?;
        form.set(key, value);
    }
    if let Some(path) = file {
        let field = spec.rules.file.as_ref().map_or("file", |rule| rule.field);
        form = form.with_file(field, read_selected_file(&path).await?);
    }
    Ok(form)
}

async fn write_export(dir: &std::path::Path, file: &ExportFile) -> Result<(), CliError> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(&file.filename);
    tokio::fs::write(&path, &file.bytes).await?;
    tracing::info!(path = %path.display(), bytes = file.bytes.len(), "export written");
    println!("{}", path.display());
    Ok(())
}

fn print_json(value: &impl serde::Serialize) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
