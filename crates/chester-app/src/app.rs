//! Application facade. Owns the adapters and managers and resolves the
//! acting user once per call before handing it to the core.

use std::rc::Rc;

use chester_core::community::CommunityFeed;
use chester_core::conversation::{Conversation, SendOutcome};
use chester_core::event_bus::EventBus;
use chester_core::identity::require_user;
use chester_core::journal::JournalStore;
use chester_core::ports::{AuthPort, CompletionPort, DataPort};
use chester_core::session::SessionManager;
use chester_platform::llm::OpenAiCompatProvider;
use chester_platform::memory::MemoryGateway;
use chester_platform::supabase::{SupabaseAuth, SupabaseClient, SupabaseGateway};
use chester_types::{
    Result,
    community::CommunityEntry,
    config::ChesterConfig,
    journal::{JournalEntry, JournalStats},
    session::SessionSummary,
    user::UserIdentity,
};

pub struct ChesterApp {
    config: ChesterConfig,
    event_bus: EventBus,
    data: Rc<dyn DataPort>,
    auth: Rc<dyn AuthPort>,
    sessions: SessionManager,
    journal: JournalStore,
    community: CommunityFeed,
}

impl ChesterApp {
    /// Hosted backend plus the configured completion provider.
    pub fn from_config(config: ChesterConfig) -> Result<Self> {
        config.validate()?;
        let client = SupabaseClient::new(&config.backend);
        let data: Rc<dyn DataPort> = Rc::new(SupabaseGateway::new(client.clone()));
        let auth: Rc<dyn AuthPort> = Rc::new(SupabaseAuth::new(client));
        let completion: Rc<dyn CompletionPort> =
            Rc::new(OpenAiCompatProvider::new(config.llm.clone()));
        Ok(Self::with_ports(config, data, auth, completion))
    }

    /// Offline build: tables and accounts live in memory.
    pub fn in_memory(config: ChesterConfig, completion: Rc<dyn CompletionPort>) -> Self {
        let memory = Rc::new(MemoryGateway::new());
        Self::with_ports(config, memory.clone(), memory, completion)
    }

    pub fn with_ports(
        config: ChesterConfig,
        data: Rc<dyn DataPort>,
        auth: Rc<dyn AuthPort>,
        completion: Rc<dyn CompletionPort>,
    ) -> Self {
        let event_bus = EventBus::new();
        let sessions = SessionManager::new(
            data.clone(),
            completion,
            config.chat.clone(),
            event_bus.clone(),
        );
        log::info!("Chester wired to the {} backend", data.backend_name());
        Self {
            journal: JournalStore::new(data.clone()),
            community: CommunityFeed::new(data.clone()),
            config,
            event_bus,
            data,
            auth,
            sessions,
        }
    }

    pub fn config(&self) -> &ChesterConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    pub fn journal(&self) -> &JournalStore {
        &self.journal
    }

    pub fn community(&self) -> &CommunityFeed {
        &self.community
    }

    pub fn backend_name(&self) -> &str {
        self.data.backend_name()
    }

    // ─── Account ─────────────────────────────────────────────

    /// The acting user, or `Unauthenticated`.
    pub async fn current_user(&self) -> Result<UserIdentity> {
        require_user(self.auth.as_ref()).await
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<UserIdentity> {
        self.auth.sign_in(email, password).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<UserIdentity> {
        self.auth.sign_up(email, password).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.auth.sign_out().await
    }

    // ─── Chat ────────────────────────────────────────────────

    pub fn new_conversation(&self) -> Conversation {
        self.sessions.open_conversation()
    }

    pub async fn open_session(&self, session_id: &str) -> Result<Conversation> {
        let user = self.current_user().await?;
        self.sessions.resume_conversation(&user, session_id).await
    }

    pub async fn send(&self, conversation: &Conversation, text: &str) -> Result<SendOutcome> {
        let user = self.current_user().await?;
        conversation.send(&user, text).await
    }

    pub async fn chat_list(&self) -> Result<Vec<SessionSummary>> {
        let user = self.current_user().await?;
        self.sessions.list_sessions(&user).await
    }

    pub async fn delete_conversation(&self, conversation: &Conversation) -> Result<()> {
        let user = self.current_user().await?;
        conversation.delete(&user).await
    }

    // ─── Journal ─────────────────────────────────────────────

    pub async fn save_entry(
        &self,
        existing_id: Option<&str>,
        title: Option<&str>,
        content: &str,
        mood: Option<&str>,
    ) -> Result<String> {
        let user = self.current_user().await?;
        self.journal
            .save_entry(&user, existing_id, title, content, mood)
            .await
    }

    pub async fn delete_entry(&self, entry_id: &str) -> Result<()> {
        let user = self.current_user().await?;
        self.journal.soft_delete_entry(&user, entry_id).await
    }

    pub async fn entries(&self) -> Result<Vec<JournalEntry>> {
        let user = self.current_user().await?;
        self.journal.list_active(&user).await
    }

    pub async fn entry(&self, entry_id: &str) -> Result<JournalEntry> {
        let user = self.current_user().await?;
        self.journal.get_entry(&user, entry_id).await
    }

    pub async fn stats(&self) -> Result<JournalStats> {
        let user = self.current_user().await?;
        self.journal.compute_stats(&user).await
    }

    // ─── Community ───────────────────────────────────────────

    pub async fn refresh_community(&mut self) -> Result<&[CommunityEntry]> {
        self.current_user().await?;
        self.community.refresh().await
    }

    pub async fn toggle_resonate(&mut self, entry_id: &str) -> Result<bool> {
        self.current_user().await?;
        self.community.toggle_resonate(entry_id).await
    }
}
