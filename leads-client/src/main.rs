use anyhow::Context;
use clap::Parser;
use leads_client::api::LeadsApi;
use leads_client::console::{self, Command};
use leads_client::dashboard::{DeleteOutcome, SubmitError};
use leads_client::display::{has_next, has_prev};
use leads_client::forms::LeadForm;
use leads_client::session::AuthError;
use leads_client::{ApiClient, ClientConfig, Dashboard, SessionGate, SessionState};
use shared_types::FilterState;
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file to use instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Overrides `api.base_url`
    #[arg(long)]
    base_url: Option<String>,

    #[arg(long)]
    log_file_path: Option<String>,
}

fn init_tracing(log_file_path: Option<&str>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let log_path = std::path::Path::new(log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("leads.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Reads one command line; `None` at end of input
fn read_command(prompt: &str) -> io::Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line))
}

fn confirm(prompt: &str) -> bool {
    console::confirm(&mut io::stdin().lock(), &mut io::stdout(), prompt)
}

struct Shell {
    client: Arc<ApiClient>,
    gate: SessionGate,
    dashboard: Dashboard,
    ansi: bool,
}

impl Shell {
    async fn run(&self) -> anyhow::Result<()> {
        println!(
            "Lead Management ({}), type 'help' for commands",
            self.client.base_url()
        );

        if self.gate.check().await == SessionState::Authenticated {
            self.open_dashboard().await;
        } else {
            println!("Not signed in. Use 'login' or 'register'.");
        }

        loop {
            let prompt = if self.gate.is_authenticated() {
                "leads> "
            } else {
                "leads (signed out)> "
            };
            let Some(line) = read_command(prompt)? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(e) => {
                    println!("{}", e);
                    continue;
                }
            };
            if command == Command::Quit {
                break;
            }
            self.execute(command).await?;
        }

        Ok(())
    }

    fn render(&self) {
        print!(
            "{}",
            console::render_dashboard(&self.dashboard.snapshot(), self.ansi)
        );
    }

    async fn open_dashboard(&self) {
        self.dashboard.fetch().await;
        self.render();
    }

    async fn change_filters(&self, update: impl FnOnce(&mut FilterState)) {
        let mut filters = self.dashboard.snapshot().filters;
        update(&mut filters);
        self.dashboard.change_filter(filters).await;
        self.render();
    }

    async fn execute(&self, command: Command) -> anyhow::Result<()> {
        let needs_session = !matches!(
            command,
            Command::Login | Command::Register | Command::Help | Command::Quit
        );
        if needs_session && !self.gate.is_authenticated() {
            println!("Please log in first");
            return Ok(());
        }

        match command {
            Command::Login | Command::Register => {
                let credentials =
                    console::prompt_credentials(&mut io::stdin().lock(), &mut io::stdout())
                        .context("Failed to read credentials")?;
                let result = if command == Command::Login {
                    self.gate.login(&credentials).await
                } else {
                    self.gate.register(&credentials).await
                };
                match result {
                    Ok(_) => {
                        println!("Signed in as {}", credentials.email);
                        self.open_dashboard().await;
                    }
                    Err(AuthError::Invalid(errors)) => {
                        for error in errors.errors() {
                            println!("  {}", error.message);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            Command::Logout => {
                self.gate.logout().await;
                println!("Signed out");
            }
            Command::Whoami => match self.client.profile().await {
                Ok(user) => println!("{}", console::render_user(&user)),
                Err(e) => println!("{}", e),
            },
            Command::Rename(name) => match self.client.rename(&name).await {
                Ok(user) => println!("{}", console::render_user(&user)),
                Err(e) => println!("{}", e),
            },
            Command::Users => match self.client.list_users().await {
                Ok(users) => {
                    for user in users {
                        println!("{}", console::render_user(&user));
                    }
                }
                Err(e) => println!("{}", e),
            },
            Command::List => {
                self.dashboard.fetch().await;
                self.render();
            }
            Command::Show(id) => match self.client.get_lead(id).await {
                Ok(lead) => print!("{}", console::render_lead(&lead)),
                Err(e) => println!("{}", e),
            },
            Command::Page(page) => {
                self.dashboard.change_page(page).await;
                self.render();
            }
            Command::Next | Command::Prev => {
                let pagination = self.dashboard.snapshot().pagination;
                let target = match command {
                    Command::Next if has_next(&pagination) => Some(pagination.page + 1),
                    Command::Prev if has_prev(&pagination) => Some(pagination.page - 1),
                    _ => None,
                };
                match target {
                    Some(page) => {
                        self.dashboard.change_page(page).await;
                        self.render();
                    }
                    None => println!("No more pages in that direction"),
                }
            }
            Command::Limit(limit) => {
                self.dashboard.change_limit(limit).await;
                self.render();
            }
            Command::Search(text) => self.change_filters(|f| f.search = text).await,
            Command::Status(status) => self.change_filters(|f| f.status = status).await,
            Command::Source(source) => self.change_filters(|f| f.source = source).await,
            Command::Score(code) => self.change_filters(|f| f.score_range = code).await,
            Command::Value(code) => self.change_filters(|f| f.value_range = code).await,
            Command::Clear => self.change_filters(|f| *f = FilterState::cleared()).await,
            Command::New => {
                self.dashboard.open_create();
                self.submit_form(None, LeadForm::default()).await?;
            }
            Command::Edit(id) => match self.dashboard.open_edit(id) {
                Some(lead) => self.submit_form(Some(id), LeadForm::from_lead(&lead)).await?,
                None => println!("Lead {} is not on the current page", id),
            },
            Command::Delete(id) => {
                if self.dashboard.delete(id, &confirm).await != DeleteOutcome::Cancelled {
                    self.render();
                }
            }
            Command::Dismiss => {
                self.dashboard.dismiss_error();
                self.render();
            }
            Command::Help => println!("{}", console::HELP),
            Command::Quit => {}
        }

        Ok(())
    }

    /// Prompts until the form is accepted or the user gives up
    async fn submit_form(&self, id: Option<i64>, mut form: LeadForm) -> anyhow::Result<()> {
        loop {
            form = console::prompt_lead_form(&mut io::stdin().lock(), &mut io::stdout(), &form)
                .context("Failed to read lead form")?;

            let result = match id {
                Some(id) => self.dashboard.update(id, &form).await,
                None => self.dashboard.create(&form).await,
            };

            match result {
                Ok(()) => {
                    println!("{}", if id.is_some() { "Lead updated" } else { "Lead created" });
                    self.render();
                    return Ok(());
                }
                Err(SubmitError::Invalid(errors)) => {
                    for error in errors.errors() {
                        println!("  {}", error.message);
                    }
                }
                Err(e) => println!("{}", e),
            }

            if !confirm("Edit the form again?") {
                self.dashboard.close_editor();
                return Ok(());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing(args.log_file_path.as_deref());

    let (mut config, config_path) = match args.config {
        Some(path) => (
            ClientConfig::load_from(&path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            path,
        ),
        None => ClientConfig::load().context("Failed to load config")?,
    };
    if let Some(base_url) = args.base_url {
        config.api.base_url = base_url;
    }
    tracing::info!(
        "Loaded config from {}, backend at {}",
        config_path.display(),
        config.api.base_url
    );

    let client = Arc::new(ApiClient::new(&config.api).context("Failed to create API client")?);
    let shell = Shell {
        client: client.clone(),
        gate: SessionGate::new(client.clone(), &config.session),
        dashboard: Dashboard::new(client, &config.dashboard),
        ansi: io::stdout().is_terminal(),
    };

    shell.run().await
}
