//! Chat application state and rendering.

use std::time::Instant;

use crossterm::event::KeyCode;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph},
    Frame,
};

use kollabx_chat::{ChatSession, NotificationCenter, SendOutcome};
use kollabx_sdk::KollabClient;

use crate::tui::Action;
use crate::view::TerminalMessageList;

#[derive(Debug, PartialEq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(PartialEq)]
enum ActivePane {
    Channels,
    Compose,
}

pub struct ChatApp {
    pub session: ChatSession<KollabClient, TerminalMessageList>,
    pub notifications: NotificationCenter<KollabClient>,
    should_quit: bool,

    // UI State
    input: String,
    input_mode: InputMode,
    active_pane: ActivePane,
    channel_state: ListState,

    // Toasts
    toast: Option<(String, Instant)>,
}

impl ChatApp {
    pub fn new(client: KollabClient) -> Self {
        let session = ChatSession::new(client.clone(), TerminalMessageList::new());
        let notifications = NotificationCenter::new(client);
        let mut app = Self {
            session,
            notifications,
            should_quit: false,
            input: String::new(),
            input_mode: InputMode::Normal,
            active_pane: ActivePane::Channels,
            channel_state: ListState::default(),
            toast: None,
        };
        app.channel_state.select(Some(0));
        app
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn show_toast(&mut self, message: String) {
        self.toast = Some((message, Instant::now()));
    }

    pub async fn update(&mut self, action: Action) {
        match action {
            Action::Key(key) => match self.input_mode {
                InputMode::Normal => self.handle_normal_key(key.code).await,
                InputMode::Editing => self.handle_editing_key(key.code).await,
            },
            Action::Tick | Action::Resize(..) => {}
        }

        if let Some((_, time)) = &self.toast {
            if time.elapsed().as_secs() > 3 {
                self.toast = None;
            }
        }
    }

    async fn handle_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Tab | KeyCode::Char('i') => {
                self.active_pane = ActivePane::Compose;
                self.input_mode = InputMode::Editing;
            }
            KeyCode::Down => self.move_channel_selection(1),
            KeyCode::Up => self.move_channel_selection(-1),
            KeyCode::PageUp => self.session.view_mut().scroll_up(),
            KeyCode::PageDown => self.session.view_mut().scroll_down(),
            KeyCode::Char('r') => {
                if let Err(e) = self.notifications.mark_all_read().await {
                    self.show_toast(format!("Error: {e}"));
                }
            }
            KeyCode::Enter => {
                let target = self
                    .channel_state
                    .selected()
                    .and_then(|i| self.session.channels().get(i))
                    .map(|c| c.id);
                if let Some(channel) = target {
                    if self.session.active_channel() != Some(channel) {
                        if let Err(e) = self.session.select_channel(channel).await {
                            self.show_toast(format!("Error: {e}"));
                        }
                    }
                }
            }
            _ => {}
        }
    }

    async fn handle_editing_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                // Cleared before the remote insert; a failed send keeps the
                // box empty and surfaces a toast instead of resending.
                let draft = std::mem::take(&mut self.input);
                match self.session.send_message(&draft).await {
                    Ok(SendOutcome::Sent) => {}
                    // Blank input keeps whatever is in the box.
                    Ok(SendOutcome::Ignored) => self.input = draft,
                    Err(e) => self.show_toast(format!("Error: {e}")),
                }
            }
            KeyCode::Esc => {
                self.active_pane = ActivePane::Channels;
                self.input_mode = InputMode::Normal;
            }
            KeyCode::Char(c) => self.input.push(c),
            KeyCode::Backspace => {
                self.input.pop();
            }
            _ => {}
        }
    }

    fn move_channel_selection(&mut self, delta: i32) {
        let len = self.session.channels().len();
        if len == 0 {
            return;
        }
        let current = self.channel_state.selected().unwrap_or(0) as i32;
        let next = (current + delta).rem_euclid(len as i32) as usize;
        self.channel_state.select(Some(next));
    }

    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(f.area());

        let main_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(25), Constraint::Percentage(75)])
            .split(chunks[0]);

        // Left: channel list with the unread badge in the title
        let items: Vec<ListItem> = self
            .session
            .channels()
            .iter()
            .map(|c| {
                let marker = if self.session.active_channel() == Some(c.id) {
                    "*"
                } else {
                    " "
                };
                ListItem::new(format!("{marker} #{}", c.name))
            })
            .collect();

        let channel_style = if self.active_pane == ActivePane::Channels {
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };

        let unread = self.notifications.unread();
        let channels_title = if unread > 0 {
            format!("Channels ({unread} unread)")
        } else {
            "Channels".to_string()
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(channels_title))
            .highlight_style(channel_style)
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, main_chunks[0], &mut self.channel_state);

        // Right: message timeline
        let timeline_title = self
            .session
            .active_channel()
            .and_then(|id| self.session.channels().iter().find(|c| c.id == id))
            .map_or_else(|| "Messages".to_string(), |c| format!("#{}", c.name));
        self.session
            .view()
            .draw(f, main_chunks[1], &timeline_title);

        // Bottom: input
        let input_style = match self.input_mode {
            InputMode::Normal => Style::default(),
            InputMode::Editing => Style::default().fg(Color::Yellow),
        };
        let hint = match self.input_mode {
            InputMode::Normal => {
                "[TAB] Compose | [ENTER] Open Channel | [r] Read All | 'q' Quit"
            }
            InputMode::Editing => "Type a message, [ENTER] Send, [ESC] Back",
        };
        let input = Paragraph::new(self.input.as_str())
            .style(input_style)
            .block(Block::default().borders(Borders::ALL).title(hint));
        f.render_widget(input, chunks[1]);

        // Toast overlay
        if let Some((msg, _)) = &self.toast {
            let area = centered_rect(60, 20, f.area());
            let block = Paragraph::new(msg.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Notification")
                    .style(Style::default().bg(Color::Blue).fg(Color::White)),
            );
            f.render_widget(Clear, area);
            f.render_widget(block, area);
        }
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
