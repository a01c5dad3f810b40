//! shellbracket CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use shellbracket::cli::{Cli, CommandDispatcher};
use shellbracket::config::Settings;
use shellbracket::lifecycle::Lifecycle;
use shellbracket::ui::{OutputStream, Theme};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is WARN
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("shellbracket=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("shellbracket=warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("shellbracket starting with args: {:?}", cli);

    // Handle --no-color
    if cli.no_color {
        std::env::set_var("NO_COLOR", "1");
    }

    let code = match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            let stderr = OutputStream::stderr();
            let theme = Theme::for_stream(&stderr);
            stderr
                .write_line(&theme.format_error(&format!("Error: {}", e)))
                .ok();
            1
        }
    };

    let report = Lifecycle::process().shutdown();
    tracing::debug!(ran = report.ran, failed = report.failed, "cleanup finished");

    ExitCode::from(code.clamp(0, 255) as u8)
}

fn run(cli: &Cli) -> shellbracket::Result<i32> {
    let mut settings = Settings::load(cli.config.as_deref())?;
    if cli.verbose {
        settings.verbose = true;
    }
    settings.apply_global();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(dispatch(cli, settings))
}

async fn dispatch(cli: &Cli, settings: Settings) -> shellbracket::Result<i32> {
    Lifecycle::process().install_signal_handlers()?;
    let dispatcher = CommandDispatcher::new(settings);
    let result = dispatcher.dispatch(cli).await?;
    Ok(result.exit_code)
}
