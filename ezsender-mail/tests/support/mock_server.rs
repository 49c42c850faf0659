//! Mock SMTP relay for exercising the SMTP mailer
//!
//! The server speaks just enough SMTP for a plaintext submission:
#![allow(dead_code)] // Test utility module - not all methods used in every test
//! - Scripted replies for the greeting, `MAIL FROM`, `RCPT TO` and end of data
//! - Per-recipient `RCPT TO` overrides to inject failures for one address
//! - A record of every command received

use std::{collections::HashMap, fmt::Write, net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    time::timeout,
};

/// SMTP command received by the mock server
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    /// Message content (after DATA)
    MessageContent(String),
    Quit,
    Other(String),
}

#[derive(Debug, Clone)]
struct SmtpResponse {
    code: u16,
    message: String,
}

impl SmtpResponse {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        format!("{} {}\r\n", self.code, self.message).into_bytes()
    }
}

#[derive(Debug, Clone)]
struct MockServerConfig {
    greeting: SmtpResponse,
    capabilities: Vec<String>,
    mail_from_response: SmtpResponse,
    rcpt_to_response: SmtpResponse,
    rcpt_overrides: HashMap<String, SmtpResponse>,
    data_end_response: SmtpResponse,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: SmtpResponse::new(220, "Mock SMTP Server"),
            capabilities: vec!["localhost".to_string(), "SIZE 10000000".to_string()],
            mail_from_response: SmtpResponse::new(250, "OK"),
            rcpt_to_response: SmtpResponse::new(250, "OK"),
            rcpt_overrides: HashMap::new(),
            data_end_response: SmtpResponse::new(250, "OK: Message accepted"),
        }
    }
}

impl MockServerConfig {
    fn ehlo_bytes(&self) -> Vec<u8> {
        let mut response = String::new();
        let last = self.capabilities.len().saturating_sub(1);
        for (i, cap) in self.capabilities.iter().enumerate() {
            let separator = if i < last { '-' } else { ' ' };
            let _ = write!(&mut response, "250{separator}{cap}\r\n");
        }
        response.into_bytes()
    }

    fn rcpt_response(&self, argument: &str) -> &SmtpResponse {
        self.rcpt_overrides
            .iter()
            .find(|(address, _)| argument.contains(address.as_str()))
            .map_or(&self.rcpt_to_response, |(_, response)| response)
    }
}

/// Mock SMTP server for testing
pub struct MockSmtpServer {
    addr: SocketAddr,
    commands_received: Arc<RwLock<Vec<SmtpCommand>>>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder {
            config: MockServerConfig::default(),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.commands_received.read().await.clone()
    }

    async fn handle_client(
        mut stream: TcpStream,
        config: Arc<MockServerConfig>,
        commands: Arc<RwLock<Vec<SmtpCommand>>>,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let (reader, mut writer) = stream.split();
        let mut reader = BufReader::new(reader);
        let mut line = String::new();

        writer.write_all(&config.greeting.to_bytes()).await?;
        writer.flush().await?;
        if config.greeting.code != 220 {
            return Ok(());
        }

        loop {
            line.clear();
            let Ok(read) = timeout(Duration::from_secs(10), reader.read_line(&mut line)).await
            else {
                return Ok(());
            };
            if read? == 0 {
                return Ok(());
            }

            let cmd_line = line.trim();
            let (verb, argument) = cmd_line.split_once(' ').unwrap_or((cmd_line, ""));

            let (response, command) = match verb.to_uppercase().as_str() {
                "EHLO" => (config.ehlo_bytes(), SmtpCommand::Ehlo(argument.to_string())),
                "MAIL" => (
                    config.mail_from_response.to_bytes(),
                    SmtpCommand::MailFrom(argument.to_string()),
                ),
                "RCPT" => (
                    config.rcpt_response(argument).to_bytes(),
                    SmtpCommand::RcptTo(argument.to_string()),
                ),
                "DATA" => (
                    SmtpResponse::new(354, "End data with <CR><LF>.<CR><LF>").to_bytes(),
                    SmtpCommand::Data,
                ),
                "RSET" | "NOOP" => (
                    SmtpResponse::new(250, "OK").to_bytes(),
                    SmtpCommand::Other(cmd_line.to_string()),
                ),
                "QUIT" => {
                    commands.write().await.push(SmtpCommand::Quit);
                    writer
                        .write_all(&SmtpResponse::new(221, "Bye").to_bytes())
                        .await?;
                    writer.flush().await?;
                    return Ok(());
                }
                _ => (
                    SmtpResponse::new(500, "Unknown command").to_bytes(),
                    SmtpCommand::Other(cmd_line.to_string()),
                ),
            };

            let is_data = command == SmtpCommand::Data;
            commands.write().await.push(command);
            writer.write_all(&response).await?;
            writer.flush().await?;

            if is_data {
                let mut content = String::new();
                let mut data_line = String::new();
                loop {
                    data_line.clear();
                    if reader.read_line(&mut data_line).await? == 0 {
                        return Ok(());
                    }
                    if data_line.trim_end() == "." {
                        break;
                    }
                    content.push_str(&data_line);
                }

                commands
                    .write()
                    .await
                    .push(SmtpCommand::MessageContent(content));
                writer
                    .write_all(&config.data_end_response.to_bytes())
                    .await?;
                writer.flush().await?;
            }
        }
    }
}

/// Builder for configuring a `MockSmtpServer`
pub struct MockSmtpServerBuilder {
    config: MockServerConfig,
}

impl MockSmtpServerBuilder {
    #[must_use]
    pub fn with_greeting(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.greeting = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.mail_from_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.rcpt_to_response = SmtpResponse::new(code, message);
        self
    }

    /// Reply to `RCPT TO` for one address only
    #[must_use]
    pub fn with_rcpt_to_response_for(
        mut self,
        address: &str,
        code: u16,
        message: impl Into<String>,
    ) -> Self {
        self.config
            .rcpt_overrides
            .insert(address.to_string(), SmtpResponse::new(code, message));
        self
    }

    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_end_response = SmtpResponse::new(code, message);
        self
    }

    /// Bind to a random local port and start serving
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to a port
    pub async fn build(self) -> Result<MockSmtpServer, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let config = Arc::new(self.config);
        let commands = Arc::new(RwLock::new(Vec::new()));

        let commands_clone = Arc::clone(&commands);
        tokio::spawn(async move {
            while let Ok((stream, _peer)) = listener.accept().await {
                let config = Arc::clone(&config);
                let commands = Arc::clone(&commands_clone);

                tokio::spawn(async move {
                    if let Err(e) = MockSmtpServer::handle_client(stream, config, commands).await {
                        tracing::debug!("Mock server client error: {}", e);
                    }
                });
            }
        });

        Ok(MockSmtpServer {
            addr,
            commands_received: commands,
        })
    }
}
