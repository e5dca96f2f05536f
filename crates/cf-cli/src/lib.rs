use std::collections::BTreeMap;
use std::ffi::OsString;
use std::sync::Arc;

use cf_api::{compile_flow_from_xml_map, spawn_session_from_xml, CreateSessionFromXmlOptions};
use cf_core::{FlowError, Settings};
use clap::Parser;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

mod cli_args;
mod error_map;
mod line_shell;
mod shell_state;
mod source_loader;
mod terminal_host;

pub(crate) use cli_args::{ChatArgs, CheckArgs, Cli, Mode};
pub(crate) use error_map::{
    emit_error, map_cli_log_filter, map_cli_runtime, map_cli_settings_read, map_cli_source_path,
    map_cli_source_read, map_cli_source_scan, map_cli_stdin, map_host_io,
};
pub(crate) use line_shell::{run_line_shell, HELP_TEXT};
pub(crate) use shell_state::SharedShell;
pub(crate) use source_loader::{load_flows_by_dir, load_settings};
pub(crate) use terminal_host::{TerminalHost, Transcript};

const LOG_ENV: &str = "CHATFLOW_LOG";
const DEFAULT_LOG_FILTER: &str = "warn";

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, FlowError> {
    match cli.command {
        Mode::Chat(args) => run_chat(args),
        Mode::Check(args) => run_check(args),
    }
}

fn run_check(args: CheckArgs) -> Result<i32, FlowError> {
    let flows_xml = load_flows_by_dir(&args.flow_dir)?;
    let flow = compile_flow_from_xml_map(&flows_xml)?;
    println!("RESULT:OK");
    println!("FILES:{}", flows_xml.len());
    println!("BLOCKS:{}", flow.len());
    Ok(0)
}

fn run_chat(args: ChatArgs) -> Result<i32, FlowError> {
    init_logging(args.log.as_deref())?;
    let flows_xml = load_flows_by_dir(&args.flow_dir)?;
    let settings = load_settings(args.settings.as_deref())?;
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(map_cli_runtime)?;
    let outcome = runtime.block_on(chat(flows_xml, settings));
    // A blocking stdin read cannot be cancelled, so do not wait for it.
    runtime.shutdown_background();
    outcome
}

async fn chat(flows_xml: BTreeMap<String, String>, settings: Settings) -> Result<i32, FlowError> {
    let transcript = Transcript::stdout();
    let shell = SharedShell::default();
    transcript.line(HELP_TEXT)?;
    let host = Arc::new(TerminalHost::new(transcript.clone(), shell.clone(), &settings));
    let running = spawn_session_from_xml(CreateSessionFromXmlOptions {
        flows_xml,
        host,
        settings: Some(settings.clone()),
    })?;

    let reader = BufReader::new(tokio::io::stdin());
    let outcome = run_line_shell(reader, &running.handle, &shell, &transcript, &settings).await;
    running.stop().await?;
    outcome.map(|()| 0)
}

/// Installs the stderr subscriber. `--log` wins over `CHATFLOW_LOG`.
fn init_logging(directives: Option<&str>) -> Result<(), FlowError> {
    let filter = match directives {
        Some(directives) => EnvFilter::try_new(directives).map_err(map_cli_log_filter)?,
        None => EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
    Ok(())
}

#[cfg(test)]
mod cli_test_support {
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    pub(crate) fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time should be monotonic")
            .as_nanos();
        std::env::temp_dir().join(format!("chatflow-rs-{}-{}", name, nanos))
    }

    pub(crate) fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("parent should be created");
        }
        fs::write(path, content).expect("file should be written");
    }
}
