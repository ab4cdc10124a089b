use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use steam_grid_ripper::app::{App, ApplyResult, ListResult};
use steam_grid_ripper::cdn::CdnHttpClient;
use steam_grid_ripper::config::{ConfigLoader, Overrides, Settings};
use steam_grid_ripper::domain::{TargetSelector, select_target};
use steam_grid_ripper::error::GridError;
use steam_grid_ripper::output::{JsonOutput, OutputMode, StderrProgress};
use steam_grid_ripper::tui::Tui;
use steam_grid_ripper::userdata::{Account, find_accounts, resolve_account};

#[derive(Parser)]
#[command(name = "steam-grid-ripper")]
#[command(about = "Apply Steam CDN artwork from a real AppID to a non-Steam shortcut")]
#[command(version, author)]
struct Cli {
    /// Emit JSON on stdout instead of text / the terminal UI
    #[arg(long, global = true)]
    non_interactive: bool,

    /// JSON config file (default: steam-grid-ripper.json in the config dir)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Steam userdata directory
    #[arg(long, global = true)]
    userdata: Option<PathBuf>,

    /// Account (numeric userdata directory) to use when there are several
    #[arg(long, global = true)]
    account: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "List Steam accounts found under userdata")]
    Accounts,
    #[command(about = "List non-Steam shortcuts from shortcuts.vdf")]
    List,
    #[command(about = "Download artwork for a source AppID and apply it to a shortcut")]
    Apply(ApplyArgs),
}

#[derive(Args, Clone)]
struct ApplyArgs {
    /// Shortcut AppID as listed, or #INDEX into the list
    #[arg(long)]
    target: String,

    /// Steam AppID to copy artwork from
    #[arg(long)]
    source: String,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<GridError>() {
            return ExitCode::from(map_exit_code(err));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &GridError) -> u8 {
    match error {
        GridError::UserdataNotFound(_)
        | GridError::AccountNotFound(_)
        | GridError::ShortcutNotFound(_) => 2,
        GridError::InvalidSourceAppId(_) | GridError::InvalidAppId(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let settings = ConfigLoader::resolve(
        cli.config.as_deref(),
        Overrides {
            userdata: cli.userdata.clone(),
            account: cli.account.clone(),
        },
    )?;
    tracing::debug!(userdata = %settings.userdata_base.display(), "resolved settings");

    if matches!(cli.command, Some(Commands::Accounts)) {
        return run_accounts(&settings, output_mode);
    }

    let account = resolve_account(&settings.userdata_base, settings.account.as_deref())?;
    let fetcher = CdnHttpClient::new(&settings)?;
    let app = App::new(settings, account, fetcher);

    match cli.command {
        Some(Commands::List) => run_list(&app, output_mode),
        Some(Commands::Apply(args)) => run_apply(&app, args, output_mode),
        Some(Commands::Accounts) => Ok(()),
        None => match output_mode {
            OutputMode::Interactive => {
                let listing = app.list(&JsonOutput)?;
                let mut tui = Tui::new(app, listing);
                tui.run()
            }
            OutputMode::NonInteractive => Err(miette::Report::msg(
                "command required (try `steam-grid-ripper --help`)",
            )),
        },
    }
}

fn run_accounts(settings: &Settings, output_mode: OutputMode) -> miette::Result<()> {
    let accounts = find_accounts(&settings.userdata_base)?;
    if accounts.is_empty() {
        return Err(GridError::UserdataNotFound(settings.userdata_base.clone()).into());
    }
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_accounts(&accounts).into_diagnostic(),
        OutputMode::Interactive => {
            print_accounts(&accounts, settings.account.as_deref());
            Ok(())
        }
    }
}

fn run_list(app: &App<CdnHttpClient>, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.list(&JsonOutput)?;
            JsonOutput::print_list(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.list(&StderrProgress)?;
            print_list(&result);
            Ok(())
        }
    }
}

fn run_apply(
    app: &App<CdnHttpClient>,
    args: ApplyArgs,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let selector: TargetSelector = args.target.parse()?;
    let listing = app.list(&JsonOutput)?;
    let target = select_target(&listing.shortcuts, selector)?.app_id;

    match output_mode {
        OutputMode::NonInteractive => {
            let result = app.apply(target, &args.source, &JsonOutput)?;
            JsonOutput::print_apply(&result).into_diagnostic()
        }
        OutputMode::Interactive => {
            let result = app.apply(target, &args.source, &StderrProgress)?;
            print_apply_summary(&result);
            Ok(())
        }
    }
}

fn print_accounts(accounts: &[Account], preferred: Option<&str>) {
    let cyan = "\x1b[36m";
    let green = "\x1b[32m";
    let reset = "\x1b[0m";
    let chosen = preferred
        .filter(|id| accounts.iter().any(|account| account.id == *id))
        .or_else(|| accounts.first().map(|account| account.id.as_str()));
    for account in accounts {
        if Some(account.id.as_str()) == chosen {
            println!("{green}* {}  {}{reset}", account.id, account.root);
        } else {
            println!("{cyan}  {}  {}{reset}", account.id, account.root);
        }
    }
}

fn print_list(result: &ListResult) {
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";
    println!(
        "{cyan}Non-Steam shortcuts for account {} ({}){reset}",
        result.account, result.shortcuts_path
    );
    for (index, record) in result.shortcuts.iter().enumerate() {
        println!("#{index:<3} {record}");
    }
}

fn print_apply_summary(result: &ApplyResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let reset = "\x1b[0m";
    let color = if result.assets.failed() == 0 {
        green
    } else {
        yellow
    };
    println!("{color}{}{reset}", result.summary());
    for outcome in result.assets.assets.values() {
        if let Some(err) = &outcome.error {
            println!("{yellow}   {}: {err}{reset}", outcome.path);
        }
    }
}
