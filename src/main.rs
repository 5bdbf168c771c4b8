use anyhow::{bail, Context, Result};
use clap::Parser;
use fluxwindow::ast::Node;
use fluxwindow::ast_client::{HttpAstSource, WindowResolver};
use fluxwindow::cli::{AnalyzeArgs, Cli, Command, OutputFormat, TaskCommand, TasksArgs};
use fluxwindow::config::{FluxWindowConfig, KapacitorSettings};
use fluxwindow::duration::{datetime_millis, format_instant, format_millis};
use fluxwindow::tasks::{self, FluxTask, KapacitorTaskClient, TaskApi, TaskListing};
use fluxwindow::window::{self, WindowReport};
use std::fs;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber for debug output
fn init_tracing(debug: bool) {
    if debug {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive(tracing::Level::TRACE.into()),
            )
            .with_writer(std::io::stderr)
            .init();
    }
}

fn window_label(window: Option<f64>) -> String {
    match window {
        Some(ms) => format!("{} ({} ms)", format_millis(ms), ms),
        None => "undeterminable (no positive range window)".to_string(),
    }
}

fn status_label(task: &FluxTask) -> String {
    task.status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn print_report(report: &WindowReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Text => {
            for (i, range) in report.ranges.iter().enumerate() {
                println!(
                    "range {}: start={} stop={} duration={}",
                    i + 1,
                    format_instant(range.start),
                    format_instant(range.stop),
                    format_millis(range.duration())
                );
            }
            println!("min window: {}", window_label(report.min_window_ms));
        }
    }
    Ok(())
}

/// Analyze a pre-parsed AST file, or fetch the AST of a Flux script
async fn run_analyze(args: AnalyzeArgs, config: FluxWindowConfig, format: OutputFormat) -> Result<()> {
    let now = match &args.now {
        Some(text) => datetime_millis(text)
            .with_context(|| format!("Invalid --now timestamp: {}", text))?,
        None => window::now_millis(),
    };

    if let Some(path) = &args.ast {
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let ast = Node::from_json(&json)
            .with_context(|| format!("Failed to decode AST from {}", path.display()))?;

        let report = window::analyze(&ast, now).context("failed to analyze query")?;
        return print_report(&report, format);
    }

    let Some(path) = &args.query else {
        bail!("Must specify either --ast FILE or --query FILE");
    };
    let query = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let mut settings = config.window;
    if let Some(default_ms) = args.default_window_ms {
        settings.default_ms = default_ms;
    }
    let ast_link = args.ast_url.or(config.ast.url).unwrap_or_default();

    let resolver = WindowResolver::new(settings, HttpAstSource::new());
    let window = resolver.resolve_min_window_at(&ast_link, &query, now).await?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::json!({ "min_window_ms": window })),
        OutputFormat::Text => println!("min window: {}", window_label(window)),
    }
    Ok(())
}

fn print_tasks(list: &[FluxTask], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(list)?),
        OutputFormat::Text => {
            for task in list {
                println!("{}\t{}\t{}", task.id, status_label(task), task.name);
            }
        }
    }
    Ok(())
}

fn find_task<'a>(list: &'a [FluxTask], id: &str) -> Result<&'a FluxTask> {
    list.iter()
        .find(|t| t.id == id)
        .with_context(|| format!("No flux task with id {}", id))
}

async fn run_tasks(args: TasksArgs, config: FluxWindowConfig, format: OutputFormat) -> Result<()> {
    let settings = match (args.kapacitor_url, config.kapacitor) {
        (Some(url), Some(configured)) => KapacitorSettings { url, ..configured },
        (Some(url), None) => KapacitorSettings::new(url),
        (None, Some(configured)) => configured,
        (None, None) => bail!("No Kapacitor configured. Use --kapacitor-url or a [kapacitor] section."),
    };
    let api = KapacitorTaskClient::new(&settings);

    match args.action {
        TaskCommand::List { filter } => {
            let listing = tasks::load_tasks(&api, &filter)
                .await
                .map_err(|e| anyhow::anyhow!(tasks::describe_load_error(&e)))?;

            match (listing, format) {
                (TaskListing::Unavailable, _) => println!("{}", tasks::FLUX_TASKS_UNAVAILABLE),
                (TaskListing::Available(list), format) => print_tasks(&list, format)?,
            }
        }
        TaskCommand::Delete { id } => {
            let list = api.list_tasks().await.context("Failed to load tasks")?;
            let task = find_task(&list, &id)?;

            tasks::remove_task(&api, task)
                .await
                .with_context(|| format!("Failed to delete task {}", task.name))?;
            println!("Deleted task {} ({})", task.name, task.id);
        }
        TaskCommand::Toggle { id } => {
            let mut list = api.list_tasks().await.context("Failed to load tasks")?;
            let task = find_task(&list, &id)?;

            let updated = tasks::toggle_task_status(&api, task)
                .await
                .with_context(|| format!("Failed to update status of task {}", task.name))?;
            tasks::replace_task(&mut list, &updated);

            if format == OutputFormat::Text {
                println!("Task {} is now {}", updated.name, status_label(&updated));
            }
            print_tasks(&list, format)?;
        }
    }
    Ok(())
}

async fn run(args: Cli, config: FluxWindowConfig) -> Result<()> {
    match args.command {
        Command::Analyze(analyze) => run_analyze(analyze, config, args.format).await,
        Command::Tasks(task_args) => run_tasks(task_args, config, args.format).await,
    }
}

fn main() -> Result<()> {
    let args = Cli::parse();

    // Initialize tracing if --debug flag is set
    init_tracing(args.debug);

    let config = FluxWindowConfig::load(args.config.as_deref())?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| anyhow::anyhow!("Failed to create Tokio runtime: {}", e))?;
    runtime.block_on(run(args, config))
}
