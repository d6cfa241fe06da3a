use chrono::Local;
use ratatui::widgets::ScrollbarState;
use std::path::PathBuf;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::config::Config;
use crate::conversation::{ChatReply, Conversation};
use crate::instructions::compose;
use crate::llm::{is_deep_research, LlmClient};
use crate::source::{is_unrestricted, SourceTable, NO_RESTRICTION};
use crate::transcript::{self, TranscriptMeta};

/// Connection status for the LLM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    /// No API key for the selected model's provider
    NotConfigured,
    /// Ready to send messages
    Ready,
    /// Waiting for a reply
    Sending,
    /// The last request failed
    Error(String),
}

/// Mask an API key for display, showing only first and last 4 characters.
///
/// Examples:
/// - "sk-ant-api03-abc123xyz789" -> "sk-a...9789"
/// - "short" -> "*****"
/// - "" -> ""
pub fn mask_api_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.is_empty() {
        return String::new();
    }
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

/// Menu items available in the settings menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuItem {
    DataSource,
    Model,
    ExportTranscript,
    Exit,
}

impl MenuItem {
    /// Returns all menu items in display order.
    pub const fn all() -> &'static [MenuItem] {
        &[
            MenuItem::DataSource,
            MenuItem::Model,
            MenuItem::ExportTranscript,
            MenuItem::Exit,
        ]
    }

    /// Returns the display label for this menu item.
    pub const fn label(&self) -> &'static str {
        match self {
            MenuItem::DataSource => "Data Source",
            MenuItem::Model => "Model",
            MenuItem::ExportTranscript => "Export Transcript",
            MenuItem::Exit => "Exit",
        }
    }

    /// Check if this menu item has a submenu.
    pub const fn has_submenu(&self) -> bool {
        matches!(self, MenuItem::DataSource | MenuItem::Model)
    }
}

/// The line being typed.
#[derive(Debug, Default)]
pub struct InputState {
    /// Current input text
    pub text: String,
    /// Cursor position, in characters
    pub cursor_position: usize,
}

impl InputState {
    fn byte_index(&self) -> usize {
        self.text
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len())
    }

    /// Insert a character at the cursor.
    pub fn handle_char(&mut self, c: char) {
        let index = self.byte_index();
        self.text.insert(index, c);
        self.cursor_position += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let index = self.byte_index();
            self.text.remove(index);
        }
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        if self.cursor_position < self.text.chars().count() {
            self.cursor_position += 1;
        }
    }

    /// Text before and after the cursor.
    pub fn split_at_cursor(&self) -> (&str, &str) {
        self.text.split_at(self.byte_index())
    }

    /// Clear input and reset cursor.
    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor_position = 0;
    }
}

/// Scroll state for the chat area, in rendered lines.
#[derive(Debug)]
pub struct ScrollState {
    /// First visible line
    pub offset: usize,
    /// Largest valid offset, updated on every draw
    pub max: usize,
    /// Stick to the bottom as new lines arrive
    pub follow: bool,
    /// Scrollbar state for ratatui
    pub scrollbar: ScrollbarState,
}

impl Default for ScrollState {
    fn default() -> Self {
        Self {
            offset: 0,
            max: 0,
            follow: true,
            scrollbar: ScrollbarState::default(),
        }
    }
}

impl ScrollState {
    /// Scroll up one line.
    pub fn scroll_up(&mut self) {
        self.offset = self.offset.saturating_sub(1);
        self.follow = false;
    }

    /// Scroll down one line.
    pub fn scroll_down(&mut self) {
        self.offset = (self.offset + 1).min(self.max);
        self.follow = self.offset == self.max;
    }

    /// Scroll up by page size.
    pub fn scroll_page_up(&mut self, page_size: usize) {
        self.offset = self.offset.saturating_sub(page_size);
        self.follow = false;
    }

    /// Scroll down by page size.
    pub fn scroll_page_down(&mut self, page_size: usize) {
        self.offset = (self.offset + page_size).min(self.max);
        self.follow = self.offset == self.max;
    }

    /// Scroll to top.
    pub fn scroll_to_top(&mut self) {
        self.offset = 0;
        self.follow = false;
    }

    /// Scroll to bottom and keep following.
    pub fn scroll_to_bottom(&mut self) {
        self.offset = self.max;
        self.follow = true;
    }

    /// Fit the offset to the content height and update the scrollbar.
    pub fn update(&mut self, total_lines: usize, viewport: usize) {
        self.max = total_lines.saturating_sub(viewport);
        self.offset = if self.follow { self.max } else { self.offset.min(self.max) };
        self.scrollbar = self.scrollbar.content_length(self.max + 1).position(self.offset);
    }
}

/// Menu-related state for the settings overlay.
#[derive(Debug, Default)]
pub struct MenuState {
    /// Whether the menu overlay is visible
    pub visible: bool,
    /// Currently selected menu item index
    pub selected: usize,
    /// Whether we're in a submenu
    pub in_submenu: bool,
    /// Currently selected submenu item index
    pub submenu_selected: usize,
}

impl MenuState {
    /// Toggle menu visibility.
    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        if self.visible {
            self.selected = 0;
            self.in_submenu = false;
            self.submenu_selected = 0;
        }
    }

    /// Move menu selection up.
    pub fn up(&mut self) {
        if self.in_submenu {
            self.submenu_selected = self.submenu_selected.saturating_sub(1);
        } else {
            self.selected = self.selected.saturating_sub(1);
        }
    }

    /// Move menu selection down.
    pub fn down(&mut self, menu_items_count: usize, submenu_items_count: usize) {
        if self.in_submenu {
            if self.submenu_selected < submenu_items_count.saturating_sub(1) {
                self.submenu_selected += 1;
            }
        } else if self.selected < menu_items_count.saturating_sub(1) {
            self.selected += 1;
        }
    }

    /// Enter the submenu with `current` preselected.
    pub fn enter_submenu(&mut self, current: usize) {
        self.in_submenu = true;
        self.submenu_selected = current;
    }

    /// Exit submenu back to main menu.
    pub fn exit_submenu(&mut self) {
        self.in_submenu = false;
        self.submenu_selected = 0;
    }

    /// Close the menu entirely.
    pub fn close(&mut self) {
        self.visible = false;
        self.in_submenu = false;
        self.selected = 0;
        self.submenu_selected = 0;
    }
}

/// LLM-related state: the client and the request in flight.
pub struct LlmState {
    /// Routes requests to a provider by model
    pub client: LlmClient,
    /// Current connection status
    pub status: ConnectionStatus,
    /// Receiver for the reply to the request in flight
    pub reply_rx: Option<oneshot::Receiver<ChatReply>>,
}

impl LlmState {
    /// Create a new LlmState for the selected model.
    pub fn new(client: LlmClient, model: &str) -> Self {
        let status = Self::idle_status(&client, model);
        Self {
            client,
            status,
            reply_rx: None,
        }
    }

    /// Status shown when nothing is in flight.
    fn idle_status(client: &LlmClient, model: &str) -> ConnectionStatus {
        if client.is_configured_for(model) {
            ConnectionStatus::Ready
        } else {
            ConnectionStatus::NotConfigured
        }
    }

    /// Check if a request is in flight.
    pub fn is_sending(&self) -> bool {
        self.reply_rx.is_some()
    }
}

/// Application state for the chat CLI.
pub struct App {
    /// The conversation store
    pub conversation: Conversation,
    /// The line being typed
    pub input: InputState,
    /// Scroll state for the chat area
    pub scroll: ScrollState,
    /// Menu state: visibility, selection
    pub menu: MenuState,
    /// LLM state: client, status, reply in flight
    pub llm: LlmState,
    /// Data sources offered in the menu
    pub sources: SourceTable,
    /// Selected data source identifier
    pub selected_source: String,
    /// Models offered in the menu
    pub models: Vec<String>,
    /// Selected model identifier
    pub selected_model: String,
    /// Cursor blink visibility state
    pub cursor_visible: bool,
    /// One-line message shown in the status bar
    pub notice: Option<String>,
    transcript_dir: Option<PathBuf>,
    open_transcript: bool,
}

impl App {
    /// Create a new App from config, with providers from file and env.
    pub fn new_with_config(config: &Config) -> Self {
        Self::with_client(config, LlmClient::new(Some(&config.llm)))
    }

    /// Create a new App from config with a given client.
    pub fn with_client(config: &Config, client: LlmClient) -> Self {
        let sources = config.sources.table();
        let models = config.model_choices();
        let selected_model = config.llm.default_model.clone();

        let selected_source = if is_unrestricted(&config.sources.default) {
            NO_RESTRICTION.to_string()
        } else if sources.get(&config.sources.default).is_some() {
            config.sources.default.clone()
        } else {
            warn!(source = %config.sources.default, "unknown default source, using no restriction");
            NO_RESTRICTION.to_string()
        };

        Self {
            conversation: Conversation::new(config.llm.system_prompt.clone()),
            input: InputState::default(),
            scroll: ScrollState::default(),
            menu: MenuState::default(),
            llm: LlmState::new(client, &selected_model),
            sources,
            selected_source,
            models,
            selected_model,
            cursor_visible: true,
            notice: None,
            transcript_dir: config.behavior.transcript_dir.clone(),
            open_transcript: config.behavior.open_transcript,
        }
    }

    /// Toggle cursor visibility for blinking effect.
    pub fn toggle_cursor(&mut self) {
        self.cursor_visible = !self.cursor_visible;
    }

    /// Check if a request is in flight.
    pub fn is_sending(&self) -> bool {
        self.llm.is_sending()
    }

    /// Input accepts typing and Enter only when nothing is in flight.
    pub fn is_input_enabled(&self) -> bool {
        !self.is_sending()
    }

    /// Submit the current input as a message.
    ///
    /// Must be called from within a tokio runtime.
    pub fn submit_message(&mut self) {
        if !self.is_input_enabled() {
            return;
        }
        let raw = self.input.text.trim();
        if raw.is_empty() {
            return;
        }

        let content = compose(raw, &self.selected_source, &self.sources);
        self.conversation.push_user(content);

        let request = self
            .conversation
            .request(&self.selected_model, &self.selected_source);
        self.llm.reply_rx = Some(self.llm.client.send(request));
        self.llm.status = ConnectionStatus::Sending;
        self.notice = None;

        self.input.clear();
        self.scroll.scroll_to_bottom();
    }

    /// Poll for the reply to the request in flight. Call this in the event loop.
    ///
    /// Returns true if a request finished.
    pub fn process_reply(&mut self) -> bool {
        let Some(mut rx) = self.llm.reply_rx.take() else {
            return false;
        };

        match rx.try_recv() {
            Ok(reply) => {
                let error = reply.error.clone();
                self.conversation.apply_reply(reply);
                self.finish_send(error);
                true
            }
            Err(oneshot::error::TryRecvError::Empty) => {
                // Still pending, put the receiver back
                self.llm.reply_rx = Some(rx);
                false
            }
            Err(oneshot::error::TryRecvError::Closed) => {
                let reply = ChatReply::error("request ended without a reply");
                let error = reply.error.clone();
                self.conversation.apply_reply(reply);
                self.finish_send(error);
                true
            }
        }
    }

    fn finish_send(&mut self, error: Option<String>) {
        self.llm.reply_rx = None;
        self.llm.status = match error {
            Some(message) => ConnectionStatus::Error(message),
            None => LlmState::idle_status(&self.llm.client, &self.selected_model),
        };
        self.scroll.scroll_to_bottom();
    }

    /// Status bar text for the current state.
    pub fn status_text(&self) -> String {
        match &self.llm.status {
            ConnectionStatus::NotConfigured => "● No API Key".to_string(),
            ConnectionStatus::Ready => "● Ready".to_string(),
            ConnectionStatus::Sending if is_deep_research(&self.selected_model) => {
                "● Deep research in progress, this can take several minutes...".to_string()
            }
            ConnectionStatus::Sending => "● Eugene is thinking...".to_string(),
            ConnectionStatus::Error(_) => "● Error".to_string(),
        }
    }

    /// Handle a character input.
    pub fn handle_char(&mut self, c: char) {
        if self.is_input_enabled() {
            self.input.handle_char(c);
        }
    }

    /// Handle backspace key.
    pub fn handle_backspace(&mut self) {
        if self.is_input_enabled() {
            self.input.handle_backspace();
        }
    }

    /// Move cursor left.
    pub fn move_cursor_left(&mut self) {
        self.input.move_cursor_left();
    }

    /// Move cursor right.
    pub fn move_cursor_right(&mut self) {
        self.input.move_cursor_right();
    }

    /// Toggle the menu.
    pub fn toggle_menu(&mut self) {
        self.menu.toggle();
    }

    /// Get all menu items.
    pub fn menu_items() -> &'static [MenuItem] {
        MenuItem::all()
    }

    /// Get currently selected menu item.
    pub fn selected_menu_item(&self) -> Option<MenuItem> {
        Self::menu_items().get(self.menu.selected).copied()
    }

    /// Source identifiers offered in the Data Source submenu.
    pub fn source_choices(&self) -> Vec<&str> {
        self.sources.choices()
    }

    /// Number of rows in the submenu of a menu item.
    pub fn submenu_len(&self, item: MenuItem) -> usize {
        match item {
            MenuItem::DataSource => self.source_choices().len(),
            MenuItem::Model => self.models.len(),
            MenuItem::ExportTranscript | MenuItem::Exit => 0,
        }
    }

    /// Index of the current selection within a submenu.
    pub fn submenu_current(&self, item: MenuItem) -> usize {
        match item {
            MenuItem::DataSource => self
                .source_choices()
                .iter()
                .position(|id| *id == self.selected_source)
                .unwrap_or(0),
            MenuItem::Model => self
                .models
                .iter()
                .position(|m| *m == self.selected_model)
                .unwrap_or(0),
            MenuItem::ExportTranscript | MenuItem::Exit => 0,
        }
    }

    /// Select a data source. Unknown identifiers are ignored.
    pub fn select_source(&mut self, id: &str) -> bool {
        let id = if is_unrestricted(id) { NO_RESTRICTION } else { id };
        if id != NO_RESTRICTION && self.sources.get(id).is_none() {
            warn!(source = id, "ignoring unknown source");
            return false;
        }

        self.selected_source = id.to_string();
        info!(source = id, "data source selected");
        self.notice = Some(format!("Source: {}", self.sources.label_for(id)));
        true
    }

    /// Select a model.
    pub fn select_model(&mut self, model: &str) {
        self.selected_model = model.to_string();
        if !self.is_sending() {
            self.llm.status = LlmState::idle_status(&self.llm.client, model);
        }
        info!(model, "model selected");
        self.notice = Some(format!("Model: {}", model));
    }

    /// Apply the highlighted submenu row.
    pub fn apply_submenu_selection(&mut self) {
        let row = self.menu.submenu_selected;
        match self.selected_menu_item() {
            Some(MenuItem::DataSource) => {
                if let Some(id) = self.source_choices().get(row).map(|id| id.to_string()) {
                    self.select_source(&id);
                }
            }
            Some(MenuItem::Model) => {
                if let Some(model) = self.models.get(row).cloned() {
                    self.select_model(&model);
                }
            }
            _ => {}
        }
        self.menu.close();
    }

    /// Write the conversation to an HTML file and optionally open it.
    pub fn export_transcript(&mut self) -> anyhow::Result<PathBuf> {
        let meta = TranscriptMeta {
            model: self.selected_model.clone(),
            source_label: self.sources.label_for(&self.selected_source).to_string(),
            created: Local::now(),
        };
        let dir = match &self.transcript_dir {
            Some(dir) => dir.clone(),
            None => std::env::current_dir()?,
        };

        let path = transcript::export(&self.conversation, &meta, &dir)?;
        if self.open_transcript {
            if let Err(err) = open::that(&path) {
                warn!(error = %err, path = %path.display(), "could not open transcript");
            }
        }

        self.notice = Some(format!("Transcript saved to {}", path.display()));
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ChatRequest, LlmProvider, Provider, ProviderResult};
    use async_trait::async_trait;
    use std::sync::Arc;

    struct CannedProvider {
        reply: ChatReply,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn provider(&self) -> Provider {
            Provider::OpenAi
        }

        fn is_configured(&self) -> bool {
            true
        }

        fn handles_model(&self, _model: &str) -> bool {
            true
        }

        async fn complete(&self, _request: &ChatRequest) -> ProviderResult<ChatReply> {
            Ok(self.reply.clone())
        }
    }

    fn app_with(reply: ChatReply) -> App {
        let mut config = Config::default();
        config.behavior.open_transcript = false;
        let client = LlmClient::from_provider(Arc::new(CannedProvider { reply }));
        App::with_client(&config, client)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.handle_char(c);
        }
    }

    async fn wait_for_reply(app: &mut App) {
        for _ in 0..200 {
            if app.process_reply() {
                return;
            }
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        }
        panic!("no reply arrived");
    }

    #[test]
    fn test_mask_api_key_normal() {
        assert_eq!(mask_api_key("sk-ant-REDACTED"), "sk-a...mnop");
    }

    #[test]
    fn test_mask_api_key_short() {
        assert_eq!(mask_api_key("short"), "*****");
        assert_eq!(mask_api_key("12345678"), "********");
    }

    #[test]
    fn test_mask_api_key_empty() {
        assert_eq!(mask_api_key(""), "");
    }

    #[test]
    fn test_mask_api_key_exactly_nine_chars() {
        // 9 chars should show first 4 and last 4, which overlaps but works
        assert_eq!(mask_api_key("123456789"), "1234...6789");
    }

    #[test]
    fn test_input_handles_multibyte_chars() {
        let mut input = InputState::default();
        for c in "café".chars() {
            input.handle_char(c);
        }
        input.move_cursor_left();
        input.handle_char('!');
        assert_eq!(input.text, "caf!é");
        input.handle_backspace();
        assert_eq!(input.split_at_cursor(), ("caf", "é"));
    }

    #[test]
    fn test_scroll_follows_until_user_scrolls() {
        let mut scroll = ScrollState::default();
        scroll.update(50, 10);
        assert_eq!(scroll.offset, 40);

        scroll.scroll_up();
        scroll.update(60, 10);
        assert_eq!(scroll.offset, 39);

        scroll.scroll_to_bottom();
        scroll.update(70, 10);
        assert_eq!(scroll.offset, 60);
    }

    #[test]
    fn test_menu_items_and_submenus() {
        let app = app_with(ChatReply::text("hi"));
        assert_eq!(App::menu_items().len(), 4);
        assert!(MenuItem::DataSource.has_submenu());
        assert!(!MenuItem::ExportTranscript.has_submenu());
        assert_eq!(app.submenu_len(MenuItem::DataSource), app.sources.len() + 1);
        assert_eq!(app.submenu_current(MenuItem::DataSource), 0);
    }

    #[test]
    fn test_select_unknown_source_is_ignored() {
        let mut app = app_with(ChatReply::text("hi"));
        assert!(app.select_source("gov"));
        assert!(!app.select_source("atlantis"));
        assert_eq!(app.selected_source, "gov");
        assert!(app.select_source(""));
        assert_eq!(app.selected_source, NO_RESTRICTION);
    }

    #[test]
    fn test_deep_research_status_text() {
        let mut app = app_with(ChatReply::text("hi"));
        app.llm.status = ConnectionStatus::Sending;
        assert_eq!(app.status_text(), "● Eugene is thinking...");
        app.select_model("o4-mini-deep-research");
        app.llm.status = ConnectionStatus::Sending;
        assert!(app.status_text().contains("Deep research"));
    }

    #[tokio::test]
    async fn test_submit_composes_and_disables_input() {
        let mut app = app_with(ChatReply::text("Hello!"));
        app.select_source("census");
        type_text(&mut app, "Population?");
        app.submit_message();

        assert!(app.is_sending());
        assert_eq!(app.llm.status, ConnectionStatus::Sending);
        assert!(app.input.text.is_empty());

        let stored = &app.conversation.messages()[1].content;
        assert!(stored.starts_with("Population?\n\n[INSTRUCTIONS: Start by searching site:census.gov."));

        type_text(&mut app, "ignored");
        assert!(app.input.text.is_empty());

        wait_for_reply(&mut app).await;
        assert!(app.is_input_enabled());
        assert_eq!(app.llm.status, ConnectionStatus::Ready);
        assert_eq!(app.conversation.last_visible().unwrap().content, "Hello!");
    }

    #[tokio::test]
    async fn test_failed_reply_reenables_input() {
        let mut app = app_with(ChatReply::error("Network error: connection refused"));
        type_text(&mut app, "Hi");
        app.submit_message();
        wait_for_reply(&mut app).await;

        assert!(app.is_input_enabled());
        assert!(matches!(app.llm.status, ConnectionStatus::Error(_)));
        assert_eq!(
            app.conversation.last_visible().unwrap().content,
            "Error: Network error: connection refused"
        );
    }

    #[test]
    fn test_dropped_channel_reenables_input() {
        let mut app = app_with(ChatReply::text("unused"));
        let (tx, rx) = oneshot::channel::<ChatReply>();
        drop(tx);
        app.llm.reply_rx = Some(rx);

        assert!(app.process_reply());
        assert!(app.is_input_enabled());
        assert!(app
            .conversation
            .last_visible()
            .unwrap()
            .content
            .starts_with("Error: "));
    }

    #[test]
    fn test_blank_input_is_not_sent() {
        let mut app = app_with(ChatReply::text("unused"));
        type_text(&mut app, "   ");
        app.submit_message();
        assert!(!app.is_sending());
        assert_eq!(app.conversation.visible_len(), 0);
    }

    #[test]
    fn test_export_transcript_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.behavior.open_transcript = false;
        config.behavior.transcript_dir = Some(dir.path().to_path_buf());
        let mut app = App::with_client(
            &config,
            LlmClient::from_provider(Arc::new(CannedProvider {
                reply: ChatReply::empty(),
            })),
        );
        app.conversation.push_user("Hi");

        let path = app.export_transcript().unwrap();
        assert!(path.starts_with(dir.path()));
        assert!(std::fs::read_to_string(&path).unwrap().contains("Hi"));
        assert!(app.notice.as_deref().unwrap().starts_with("Transcript saved to"));
    }
}
