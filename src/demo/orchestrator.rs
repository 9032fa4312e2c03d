//! Interactive menu runner
//!
//! Starts the demo server as a child process of this binary, checks on it
//! through `/health`, and runs the client flows against it.

use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::process::{Child, Command};

use crate::config::Config;
use crate::demo::{ai_mcp, function_calling, heading, simple};
use crate::error::{Result, ServerError};
use crate::mcp::http::{probe_health, Health};

/// Health polls before giving up on a fresh server
const HEALTH_ATTEMPTS: u32 = 5;
const HEALTH_INTERVAL: Duration = Duration::from_secs(1);
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// A server started by this process; killed when dropped
#[derive(Debug)]
pub struct ServerProcess {
    child: Child,
}

impl ServerProcess {
    /// Spawn `<this binary> serve --transport http` on `host:port`
    pub fn spawn(host: &str, port: u16) -> Result<Self> {
        let exe = std::env::current_exe()?;
        let port = port.to_string();
        let child = Command::new(exe)
            .args(["serve", "--transport", "http"])
            .args(["--host", host, "--port", port.as_str()])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        tracing::debug!(pid = ?child.id(), "spawned MCP server");
        Ok(Self { child })
    }

    pub fn id(&self) -> Option<u32> {
        self.child.id()
    }

    /// Whether the child has already exited
    pub fn has_exited(&mut self) -> Result<bool> {
        Ok(self.child.try_wait()?.is_some())
    }

    pub async fn stop(mut self) -> Result<()> {
        self.child.kill().await?;
        tracing::debug!("MCP server process stopped");
        Ok(())
    }
}

/// Poll `url` until the server answers or the attempts run out
pub async fn wait_healthy(url: &str, attempts: u32, interval: Duration) -> Result<Health> {
    for attempt in 1..=attempts {
        if let Some(health) = probe_health(url, PROBE_TIMEOUT).await {
            return Ok(health);
        }
        if attempt < attempts {
            println!("Waiting for server... ({}/{})", attempt, attempts);
            tokio::time::sleep(interval).await;
        }
    }
    Err(ServerError::NotHealthy {
        url: url.to_string(),
    }
    .into())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    StartServer,
    StopServer,
    Status,
    SimpleClient,
    AiClient,
    FunctionCalling,
    RunAll,
    Quit,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 8] = [
        MenuChoice::StartServer,
        MenuChoice::StopServer,
        MenuChoice::Status,
        MenuChoice::SimpleClient,
        MenuChoice::AiClient,
        MenuChoice::FunctionCalling,
        MenuChoice::RunAll,
        MenuChoice::Quit,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::StartServer => "Start MCP server",
            MenuChoice::StopServer => "Stop MCP server",
            MenuChoice::Status => "Server status",
            MenuChoice::SimpleClient => "Simple MCP client (no AI)",
            MenuChoice::AiClient => "AI + MCP client",
            MenuChoice::FunctionCalling => "Function calling client",
            MenuChoice::RunAll => "Run all demos",
            MenuChoice::Quit => "Quit",
        }
    }
}

impl FromStr for MenuChoice {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1" | "start" => Ok(MenuChoice::StartServer),
            "2" | "stop" => Ok(MenuChoice::StopServer),
            "3" | "status" => Ok(MenuChoice::Status),
            "4" | "simple" => Ok(MenuChoice::SimpleClient),
            "5" | "ai" => Ok(MenuChoice::AiClient),
            "6" | "functions" | "function-calling" => Ok(MenuChoice::FunctionCalling),
            "7" | "all" => Ok(MenuChoice::RunAll),
            "8" | "q" | "quit" | "exit" => Ok(MenuChoice::Quit),
            other => Err(format!("unknown choice: {}", other)),
        }
    }
}

/// Pass/fail of one menu step
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub step: &'static str,
    pub passed: bool,
    pub detail: Option<String>,
}

impl StepReport {
    fn from_result(step: &'static str, result: Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                step,
                passed: true,
                detail: None,
            },
            Err(e) => Self {
                step,
                passed: false,
                detail: Some(e.to_string()),
            },
        }
    }

    fn print(&self) {
        match &self.detail {
            _ if self.passed => println!("[PASS] {}", self.step),
            Some(detail) => println!("[FAIL] {}: {}", self.step, detail),
            None => println!("[FAIL] {}", self.step),
        }
    }
}

pub struct Orchestrator {
    config: Config,
    server: Option<ServerProcess>,
}

impl Orchestrator {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            server: None,
        }
    }

    pub fn is_managing_server(&self) -> bool {
        self.server.is_some()
    }

    /// Start the server unless one already answers at the configured URL
    pub async fn start_server(&mut self) -> Result<()> {
        let health_url = self.config.health_url();
        if let Some(health) = probe_health(&health_url, PROBE_TIMEOUT).await {
            println!("{} {} is already running at {}", health.name, health.version, self.config.server_url);
            return Ok(());
        }

        let port = self.config.local_server_port().ok_or_else(|| ServerError::NotLocal {
            url: self.config.server_url.clone(),
        })?;
        if port != self.config.port {
            tracing::info!(
                configured = self.config.port,
                port,
                "serving on the port of the client URL"
            );
        }

        println!("Starting MCP server on {}:{}", self.config.host, port);
        let mut process = ServerProcess::spawn(&self.config.host, port)?;
        let health = wait_healthy(&health_url, HEALTH_ATTEMPTS, HEALTH_INTERVAL).await;

        match health {
            Ok(health) => {
                println!(
                    "{} is running at {} (PID {})",
                    health.name,
                    self.config.server_url,
                    process.id().map_or_else(|| "?".to_string(), |id| id.to_string())
                );
                self.server = Some(process);
                Ok(())
            }
            Err(e) => {
                if process.has_exited()? {
                    tracing::warn!("MCP server process exited during startup");
                } else {
                    process.stop().await?;
                }
                Err(e)
            }
        }
    }

    /// Kill the server this menu started
    pub async fn stop_server(&mut self) -> Result<()> {
        let Some(process) = self.server.take() else {
            if probe_health(&self.config.health_url(), PROBE_TIMEOUT).await.is_some() {
                println!("The server at {} was not started from this menu", self.config.server_url);
            }
            return Err(ServerError::NotRunning.into());
        };

        process.stop().await?;
        if probe_health(&self.config.health_url(), PROBE_TIMEOUT).await.is_some() {
            println!("Server might still be running - check manually");
        } else {
            println!("Server stopped");
        }
        Ok(())
    }

    pub async fn status(&self) -> Result<Health> {
        match probe_health(&self.config.health_url(), PROBE_TIMEOUT).await {
            Some(health) => {
                println!(
                    "{} {} is {} at {}",
                    health.name, health.version, health.status, self.config.server_url
                );
                Ok(health)
            }
            None => {
                println!("No MCP server responding at {}", self.config.server_url);
                Err(ServerError::NotRunning.into())
            }
        }
    }

    /// Run one menu entry; `Quit` yields no steps
    pub async fn execute(&mut self, choice: MenuChoice) -> Vec<StepReport> {
        let steps: &[MenuChoice] = match choice {
            MenuChoice::Quit => &[],
            MenuChoice::RunAll => &[
                MenuChoice::StartServer,
                MenuChoice::Status,
                MenuChoice::SimpleClient,
                MenuChoice::AiClient,
                MenuChoice::FunctionCalling,
            ],
            _ => std::slice::from_ref(&choice),
        };

        let mut reports = Vec::with_capacity(steps.len());
        for step in steps {
            let report = self.step(*step).await;
            report.print();
            reports.push(report);
        }

        if choice == MenuChoice::RunAll {
            print_summary(&reports);
        }
        reports
    }

    async fn step(&mut self, choice: MenuChoice) -> StepReport {
        heading(choice.label());
        let result = match choice {
            MenuChoice::StartServer => self.start_server().await,
            MenuChoice::StopServer => self.stop_server().await,
            MenuChoice::Status => self.status().await.map(|_| ()),
            MenuChoice::SimpleClient => simple::run_http(&self.config).await,
            MenuChoice::AiClient => ai_mcp::run_http(&self.config).await,
            MenuChoice::FunctionCalling => function_calling::run_local(&self.config).await,
            MenuChoice::RunAll | MenuChoice::Quit => Ok(()),
        };
        StepReport::from_result(choice.label(), result)
    }

    /// Read menu choices from `input` until quit or end of input
    pub async fn run_menu<R>(&mut self, input: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = input.lines();
        loop {
            print_menu();
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if line.trim().is_empty() {
                continue;
            }

            match line.parse::<MenuChoice>() {
                Ok(MenuChoice::Quit) => break,
                Ok(choice) => {
                    self.execute(choice).await;
                }
                Err(e) => println!("{}", e),
            }
        }

        if self.server.is_some() {
            self.stop_server().await?;
        }
        println!("Goodbye!");
        Ok(())
    }
}

fn print_menu() {
    heading("MCP DEMO MENU");
    for (i, choice) in MenuChoice::ALL.iter().enumerate() {
        println!("  {}. {}", i + 1, choice.label());
    }
    println!("Choice:");
}

fn print_summary(reports: &[StepReport]) {
    heading("SUMMARY");
    for report in reports {
        report.print();
    }
    let passed = reports.iter().filter(|r| r.passed).count();
    println!("{}/{} steps passed", passed, reports.len());
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::io::BufReader;

    /// Configuration pointing at a port nothing listens on
    fn idle_config() -> Config {
        let port = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let vars: HashMap<&str, String> = [("MCP_DEMO_PORT", port.to_string())].into();
        Config::from_lookup(|k| vars.get(k).cloned()).unwrap()
    }

    #[test]
    fn test_menu_choice_parsing() {
        assert_eq!("1".parse::<MenuChoice>().unwrap(), MenuChoice::StartServer);
        assert_eq!(" Status ".parse::<MenuChoice>().unwrap(), MenuChoice::Status);
        assert_eq!("q".parse::<MenuChoice>().unwrap(), MenuChoice::Quit);
        assert!("9".parse::<MenuChoice>().is_err());
    }

    #[test]
    fn test_menu_numbers_match_order() {
        for (i, choice) in MenuChoice::ALL.iter().enumerate() {
            assert_eq!((i + 1).to_string().parse::<MenuChoice>().unwrap(), *choice);
        }
    }

    #[tokio::test]
    async fn test_status_without_server_fails() {
        let mut orchestrator = Orchestrator::new(idle_config());
        let reports = orchestrator.execute(MenuChoice::Status).await;
        assert_eq!(reports.len(), 1);
        assert!(!reports[0].passed);
    }

    #[tokio::test]
    async fn test_stop_without_server_fails() {
        let mut orchestrator = Orchestrator::new(idle_config());
        let err = orchestrator.stop_server().await.unwrap_err();
        assert!(matches!(err, crate::error::DemoError::Server(ServerError::NotRunning)));
    }

    #[tokio::test]
    async fn test_function_calling_step_needs_no_server() {
        let mut orchestrator = Orchestrator::new(idle_config());
        let reports = orchestrator.execute(MenuChoice::FunctionCalling).await;
        assert!(reports[0].passed);
    }

    #[tokio::test]
    async fn test_menu_quits_and_skips_garbage() {
        let mut orchestrator = Orchestrator::new(idle_config());
        let input = BufReader::new(&b"bogus\n\n3\nquit\n"[..]);
        orchestrator.run_menu(input).await.unwrap();
        assert!(!orchestrator.is_managing_server());
    }

    #[tokio::test]
    async fn test_menu_ends_on_eof() {
        let mut orchestrator = Orchestrator::new(idle_config());
        orchestrator.run_menu(BufReader::new(&b""[..])).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_refuses_remote_url() {
        let config = idle_config().with_server_url("http://192.0.2.10:8765");
        let mut orchestrator = Orchestrator::new(config);

        let reports = orchestrator.execute(MenuChoice::StartServer).await;
        assert!(!reports[0].passed);
        assert!(reports[0].detail.as_deref().unwrap().contains("not a local address"));
        assert!(!orchestrator.is_managing_server());
    }

    #[tokio::test]
    async fn test_wait_healthy_gives_up() {
        let config = idle_config();
        let err = wait_healthy(&config.health_url(), 2, Duration::from_millis(10))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::DemoError::Server(ServerError::NotHealthy { .. })));
    }
}
