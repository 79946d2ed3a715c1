use clap::Parser;
use hitl_client::commands::{parse_decision, Command, DECISION_HELP, HELP};
use hitl_client::{recover, ApiClient, ClientError, PollConfig, Recovery};
use hitl_contract::{AgentResponse, InterruptData, Outcome};
use std::io::Write;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "hitl-client")]
struct Args {
    #[arg(long, env = "HITL_API_BASE", default_value = "http://localhost:8001")]
    api_base: String,

    /// Interval between status checks while a session is running.
    #[arg(long, env = "HITL_POLL_INTERVAL_MS", default_value_t = 1000)]
    poll_interval_ms: u64,

    /// Status checks before a running session is abandoned.
    #[arg(long, env = "HITL_POLL_ATTEMPTS", default_value_t = 30)]
    poll_attempts: u32,

    /// Per-request timeout; invoke and resume wait for the engine.
    #[arg(long, env = "HITL_REQUEST_TIMEOUT_SECS", default_value_t = 120)]
    request_timeout_secs: u64,

    /// Skip the user id prompt.
    #[arg(long)]
    user_id: Option<String>,
}

struct Console {
    lines: Lines<BufReader<Stdin>>,
}

impl Console {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// `None` on end of input.
    async fn ask(&mut self, prompt: &str) -> Option<String> {
        print!("{prompt}");
        let _ = std::io::stdout().flush();
        match self.lines.next_line().await {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "failed to read input");
                None
            }
        }
    }
}

struct Session {
    client: ApiClient,
    user_id: String,
    session_id: String,
}

impl Session {
    fn start_new(&mut self) {
        self.session_id = new_session_id();
        println!("New session: {}", self.session_id);
    }

    /// Drive an invoke/resume response until it settles, prompting for decisions.
    async fn settle(
        &self,
        console: &mut Console,
        mut response: AgentResponse,
    ) -> Result<(), ClientError> {
        loop {
            let interrupt = match &response.outcome {
                Outcome::Completed { .. } => {
                    println!("\n{}\n", response.final_message().unwrap_or("(no answer)"));
                    return Ok(());
                }
                Outcome::Error { message } => {
                    println!("\nError: {message}\n");
                    return Ok(());
                }
                Outcome::Interrupted { interrupt_data } => interrupt_data.clone(),
            };
            let Some(next) = self.review(console, &interrupt).await? else {
                return Ok(());
            };
            response = next;
        }
    }

    /// Prompt for a decision and resume. `None` when input ends before a decision is given.
    async fn review(
        &self,
        console: &mut Console,
        interrupt: &InterruptData,
    ) -> Result<Option<AgentResponse>, ClientError> {
        println!("\n{}\n", interrupt.description);
        loop {
            let Some(line) = console.ask("decision> ").await else {
                return Ok(None);
            };
            match parse_decision(&line, interrupt) {
                Ok(decision) if !decision.permitted_by(&interrupt.config) => {
                    println!("'{}' is not allowed here.", decision.kind());
                }
                Ok(decision) => {
                    let response = self
                        .client
                        .resume(&self.user_id, &self.session_id, &decision)
                        .await?;
                    return Ok(Some(response));
                }
                Err(e) => println!("{e}\n{DECISION_HELP}"),
            }
        }
    }

    async fn restore(
        &mut self,
        console: &mut Console,
        poll: PollConfig,
    ) -> Result<(), ClientError> {
        let active = match self.client.active_session(&self.user_id).await {
            Ok(active) => active,
            Err(e) => {
                tracing::warn!(error = %e, "could not look up active session");
                String::new()
            }
        };
        if active.is_empty() {
            self.start_new();
            return Ok(());
        }

        self.session_id = active;
        println!("Restoring session {}", self.session_id);
        match recover(&self.client, &self.user_id, &self.session_id, poll).await {
            Recovery::ResumePending(interrupt) => {
                println!("A refund is waiting for your decision.");
                if let Some(response) = self.review(console, &interrupt).await? {
                    self.settle(console, response).await?;
                }
            }
            Recovery::Fresh { prior } => {
                if let Some(prior) = prior {
                    println!("Last result:\n{prior}\n");
                }
            }
            Recovery::Reuse => {}
            Recovery::Abandon => {
                println!("Session {} is still busy.", self.session_id);
                self.start_new();
            }
        }
        Ok(())
    }

    /// Returns `false` when the loop should stop.
    async fn handle(
        &mut self,
        console: &mut Console,
        command: Command,
    ) -> Result<bool, ClientError> {
        match command {
            Command::Exit => return Ok(false),
            Command::Empty => {}
            Command::Help => println!("{HELP}"),
            Command::New => self.start_new(),
            Command::Status => {
                let view = self.client.status(&self.user_id, &self.session_id).await?;
                println!("{}", serde_json::to_string_pretty(&view)?);
            }
            Command::Sessions => {
                let ids = self.client.list_sessions(&self.user_id).await?;
                if ids.is_empty() {
                    println!("No sessions.");
                }
                for id in ids {
                    let marker = if id == self.session_id { "*" } else { " " };
                    println!("{marker} {id}");
                }
            }
            Command::Active => {
                let active = self.client.active_session(&self.user_id).await?;
                let shown = if active.is_empty() { "(none)" } else { active.as_str() };
                println!("Active session: {shown}");
            }
            Command::System => {
                let info = self.client.system_info().await?;
                println!("{}", serde_json::to_string_pretty(&info)?);
            }
            Command::Delete => {
                let removed = self
                    .client
                    .delete_session_idempotent(&self.user_id, &self.session_id)
                    .await?;
                if removed {
                    println!("Session {} deleted.", self.session_id);
                } else {
                    println!("Session {} was already gone.", self.session_id);
                }
                self.start_new();
            }
            Command::Remember(info) => {
                let stored = self.client.write_preference(&self.user_id, &info).await?;
                println!("Remembered ({}).", stored.memory_id);
            }
            Command::Query(query) => {
                let response = self
                    .client
                    .invoke(&self.user_id, &self.session_id, &query)
                    .await?;
                self.settle(console, response).await?;
            }
        }
        Ok(true)
    }
}

fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let args = Args::parse();
    let client = match ApiClient::new(&args.api_base)
        .and_then(|client| client.with_timeout(Duration::from_secs(args.request_timeout_secs)))
    {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(2);
        }
    };
    let poll = PollConfig {
        interval: Duration::from_millis(args.poll_interval_ms),
        attempts: args.poll_attempts,
    };

    println!("Session service: {}", client.base_url());

    let mut console = Console::new();
    let user_id = match args.user_id {
        Some(user_id) => user_id,
        None => loop {
            match console.ask("User id: ").await {
                Some(line) if !line.trim().is_empty() => break line.trim().to_string(),
                Some(_) => continue,
                None => return,
            }
        },
    };

    let mut session = Session {
        client,
        user_id,
        session_id: String::new(),
    };
    if let Err(e) = session.restore(&mut console, poll).await {
        eprintln!("{e}");
    }
    println!("{HELP}");

    loop {
        let prompt = format!("[{}] > ", session.session_id);
        let Some(line) = console.ask(&prompt).await else {
            break;
        };
        match session.handle(&mut console, Command::parse(&line)).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(e) => eprintln!("{e}"),
        }
    }
    println!("Bye.");
}
