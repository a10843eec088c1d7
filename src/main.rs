use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use goloc::app::api_client::ApiClient;
use goloc::app::layout::Viewport;
use goloc::app::settings_store::{
    default_settings, FileKvStore, KvStore, MemoryKvStore, SettingsStore, DEFAULT_SERVER_URL,
};
use goloc::app::{Action, AnalyzeStatus, AppState};
use goloc::model::{SettingsPatch, Theme};
use goloc::page::PageContext;
use goloc::platform::native::NativePlatform;
use goloc::platform::web::WebPlatform;
use goloc::platform::Platform;
use goloc::proxy::ProxyBroker;
use goloc::transport::{select_transport, HttpFetch, ReqwestFetcher};
use goloc::{analyze, format, logging};

/// Line-of-code statistics for GitHub repositories, served by a GoLoc service
#[derive(Parser)]
#[command(name = "goloc", version, about)]
struct Cli {
    /// Behave like code injected into a host page served from this origin
    /// (https origins route every service call through the background proxy)
    #[arg(long, global = true)]
    page_origin: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a repository by URL
    Analyze {
        repo_url: String,
        #[arg(long)]
        branch: Option<String>,
        /// Tree levels to print
        #[arg(long, default_value_t = 2)]
        depth: usize,
        /// Print the raw response as JSON
        #[arg(long)]
        json: bool,
    },
    /// Analyze whatever repository a host page path points at
    Page {
        /// Page path or full URL, e.g. /owner/repo/tree/dev
        path: String,
        /// Text of the page's branch selector
        #[arg(long)]
        branch_label: Option<String>,
        /// Act like a page load: only analyze when auto-analyze is enabled,
        /// and skip site sections such as /owner/settings
        #[arg(long)]
        auto: bool,
        #[arg(long, default_value_t = 2)]
        depth: usize,
        #[arg(long)]
        json: bool,
    },
    /// Service-side analysis configuration
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Client settings
    Settings {
        #[command(subcommand)]
        action: SettingsCommand,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    Show,
    Set {
        /// Cache lifetime in seconds
        #[arg(long)]
        cache_ttl: Option<u64>,
        #[arg(long)]
        depth: Option<u32>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
        /// Maximum repository size in MB
        #[arg(long)]
        max_size: Option<u64>,
        /// Comma separated directory names
        #[arg(long)]
        exclude_dirs: Option<String>,
        #[arg(long)]
        include_data_files: Option<bool>,
        #[arg(long)]
        include_documentation: Option<bool>,
    },
}

#[derive(Subcommand)]
enum SettingsCommand {
    Show,
    Set {
        #[arg(long)]
        server_url: Option<String>,
        #[arg(long, value_enum)]
        theme: Option<ThemeArg>,
        #[arg(long)]
        auto_analyze: Option<bool>,
        #[arg(long)]
        panel_width: Option<f64>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum ThemeArg {
    Light,
    Dark,
    Auto,
}

impl From<ThemeArg> for Theme {
    fn from(t: ThemeArg) -> Self {
        match t {
            ThemeArg::Light => Theme::Light,
            ThemeArg::Dark => Theme::Dark,
            ThemeArg::Auto => Theme::Auto,
        }
    }
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let cli = Cli::parse();

    match cli.command {
        Command::Analyze {
            ref repo_url,
            ref branch,
            depth,
            json,
        } => {
            let mut state = build_state(cli.page_origin.as_deref(), PageContext::default())?;
            state.apply_action(Action::Analyze {
                repo_url: repo_url.clone(),
                branch: branch.clone(),
            });
            finish_analysis(&mut state, depth, json)
        }
        Command::Page {
            ref path,
            ref branch_label,
            auto,
            depth,
            json,
        } => {
            let page = PageContext::new(path, branch_label.clone());
            let mut state = build_state(cli.page_origin.as_deref(), page)?;
            if auto {
                state.apply_action(Action::MaybeAutoAnalyze);
                if state.analysis.status == AnalyzeStatus::Idle {
                    println!("auto-analyze did not run for {}", state.page.path);
                    return Ok(());
                }
            } else {
                state.apply_action(Action::AnalyzeCurrentPage);
                if state.analysis.status == AnalyzeStatus::Idle {
                    bail!("{} is not a repository page", state.page.path);
                }
            }
            finish_analysis(&mut state, depth, json)
        }
        Command::Config { ref action } => {
            let mut state = build_state(cli.page_origin.as_deref(), PageContext::default())?;
            run_config(&mut state, action)
        }
        Command::Settings { ref action } => {
            let mut state = build_state(cli.page_origin.as_deref(), PageContext::default())?;
            run_settings(&mut state, action)
        }
    }
}

fn build_state(page_origin: Option<&str>, page: PageContext) -> Result<AppState> {
    let viewport = Viewport::default();
    let native = NativePlatform::new(viewport);
    let platform: Arc<dyn Platform> = match page_origin {
        Some(origin) => Arc::new(WebPlatform::new(origin, viewport, native.prefers_dark())),
        None => Arc::new(native),
    };

    let kv: Arc<dyn KvStore> = match platform.app_data_dir("goloc") {
        Ok(dir) => Arc::new(FileKvStore::new(dir)),
        Err(e) => {
            tracing::warn!("{:#}; settings are kept in memory for this run", e);
            Arc::new(MemoryKvStore::new())
        }
    };
    let server_url = std::env::var("GOLOC_SERVER_URL").unwrap_or_else(|_| DEFAULT_SERVER_URL.to_string());
    let store = SettingsStore::new(kv, default_settings(viewport, &server_url));

    let fetcher: Arc<dyn HttpFetch> = Arc::new(ReqwestFetcher::new()?);
    let ctx = platform.execution_context();
    let proxy = if ctx.is_restricted() {
        // detached; it exits once the last handle is gone
        let (handle, _join) = ProxyBroker::new(fetcher.clone()).spawn()?;
        Some(handle)
    } else {
        None
    };
    let transport = select_transport(&ctx, fetcher, proxy);

    let client = ApiClient::new(transport, store.clone());
    let server = client.server_url()?;
    tracing::info!(via = client.transport_name(), server = %server, "client ready");

    let mut state = AppState::new(platform.as_ref(), client, store, page);
    state.apply_action(Action::LoadSettings);
    Ok(state)
}

fn finish_analysis(state: &mut AppState, depth: usize, json: bool) -> Result<()> {
    if state.wait_analysis() == AnalyzeStatus::Error {
        let msg = state.analysis.error.clone().unwrap_or_default();
        bail!("analysis failed: {msg}");
    }
    let resp = state
        .analysis
        .result
        .as_ref()
        .context("analysis finished without a result")?;

    if json {
        let out = serde_json::json!({
            "response": resp,
            "languages": state.analysis.languages,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let when = OffsetDateTime::from_unix_timestamp(resp.timestamp)
        .ok()
        .and_then(|t| t.format(&Rfc3339).ok())
        .unwrap_or_else(|| resp.timestamp.to_string());

    println!("{} @ {} ({}, {})", resp.repo, resp.branch, resp.source, when);
    println!(
        "{} files, {} lines",
        format::format_number(analyze::file_count(&resp.data)),
        format::format_number(resp.data.stats.lines)
    );
    println!("{}", format::format_overview(&analyze::overview(&resp.data.stats)));
    println!();
    print!("{}", format::format_language_table(&state.analysis.languages));
    if depth > 0 {
        println!();
        print!("{}", format::format_tree(&resp.data, depth));
    }
    Ok(())
}

fn run_config(state: &mut AppState, action: &ConfigCommand) -> Result<()> {
    let current = state.client.get_config().context("Failed to load service config")?;

    match action {
        ConfigCommand::Show => {
            println!("{}", format::format_config(&current));
        }
        ConfigCommand::Set {
            cache_ttl,
            depth,
            timeout,
            max_size,
            exclude_dirs,
            include_data_files,
            include_documentation,
        } => {
            let mut cfg = current;
            if let Some(v) = cache_ttl {
                cfg.cache_ttl_seconds = *v;
            }
            if let Some(v) = depth {
                cfg.default_depth = *v;
            }
            if let Some(v) = timeout {
                cfg.request_timeout_seconds = *v;
            }
            if let Some(v) = max_size {
                cfg.max_repo_size_mb = *v;
            }
            if let Some(v) = exclude_dirs {
                cfg.exclude_dirs = format::parse_list(v);
            }
            if let Some(v) = include_data_files {
                cfg.include_data_files = *v;
            }
            if let Some(v) = include_documentation {
                cfg.include_documentation = *v;
            }

            state.update_config(&cfg).context("Failed to save service config")?;
            if let Some(saved) = &state.config {
                println!("{}", format::format_config(saved));
            }
        }
    }
    Ok(())
}

fn run_settings(state: &mut AppState, action: &SettingsCommand) -> Result<()> {
    if let SettingsCommand::Set {
        server_url,
        theme,
        auto_analyze,
        panel_width,
    } = action
    {
        state.apply_action(Action::UpdateSettings(SettingsPatch {
            server_url: server_url.clone(),
            auto_analyze: *auto_analyze,
            ..Default::default()
        }));
        if let Some(t) = theme {
            state.apply_action(Action::SetTheme((*t).into()));
        }
        if let Some(w) = panel_width {
            state.apply_action(Action::SetPanelWidth(*w));
        }
        state.apply_action(Action::LoadSettings);
    }

    state.apply_action(Action::LoadConfig);

    let s = state.settings.as_ref().context("settings were not loaded")?;
    println!("server url:    {}", s.server_url);
    println!("  resolved:    {}", state.client.server_url()?);
    println!(
        "theme:         {} ({})",
        format!("{:?}", s.theme).to_lowercase(),
        state.ui.effective_theme.as_str()
    );
    println!("auto analyze:  {}", s.auto_analyze);
    println!("anchor:        {}, {}", state.ui.anchor.x, state.ui.anchor.y);
    println!("panel width:   {}", state.ui.panel_width);
    println!("transport:     {}", state.client.transport_name());

    let sections: Vec<&str> = state.settings_sections().iter().map(|s| s.as_str()).collect();
    println!("sections:      {}", sections.join(", "));
    Ok(())
}
