//! Feature collaborators the handlers call into.
//!
//! Everything is built once at startup into a `Services` value that the
//! dispatch loop owns and lends to each handler.

pub mod apps;
pub mod codegen;
pub mod contacts;
pub mod evaluator;
pub mod mail;
pub mod mcp;
pub mod music;
pub mod notes;
pub mod store;
pub mod system;
pub mod tasks;
pub mod web;

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::config::AssistantConfig;

use apps::{AppLauncher, SystemAppLauncher};
use codegen::CodeGenerator;
use contacts::ContactBook;
use evaluator::AgentEvaluator;
use mail::{create_mail_transport, MailTransport};
use mcp::McpClient;
use music::MusicPlayer;
use notes::NotesStore;
use system::{PowerControl, SystemMonitor, SystemPower};
use tasks::TaskStore;
use web::WebClient;

pub struct Services {
    pub apps: Box<dyn AppLauncher>,
    pub music: MusicPlayer,
    pub notes: NotesStore,
    pub tasks: TaskStore,
    pub contacts: ContactBook,
    pub mail: Arc<dyn MailTransport>,
    pub system: SystemMonitor,
    pub power: Box<dyn PowerControl>,
    pub web: WebClient,
    pub codegen: CodeGenerator,
    pub evaluator: AgentEvaluator,
    pub mcp: McpClient,
}

impl Services {
    pub fn new(config: &AssistantConfig, data_dir: &Path) -> Self {
        let music_dir = config.music_dir(data_dir);
        let mail = create_mail_transport(&config.mail, data_dir);
        info!(
            music_dir = %music_dir.display(),
            mail = mail.name(),
            "Services ready"
        );
        Self {
            apps: Box::new(SystemAppLauncher::new(config.apps.clone())),
            music: MusicPlayer::new(music_dir),
            notes: NotesStore::open(data_dir),
            tasks: TaskStore::open(data_dir),
            contacts: ContactBook::open(data_dir),
            mail,
            system: SystemMonitor::new(),
            power: Box::new(SystemPower),
            web: WebClient::new(config.web.clone()),
            codegen: CodeGenerator::new(config.llm.clone(), data_dir),
            evaluator: AgentEvaluator::new(data_dir),
            mcp: McpClient::new(config.mcp.server_url.clone()),
        }
    }
}
