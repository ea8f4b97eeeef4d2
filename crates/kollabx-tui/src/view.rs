//! Terminal rendering of the chat timeline.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use kollabx_chat::{MessageGroup, MessageListView};
use kollabx_models::{Message, MessageId};

/// What the timeline pane currently shows.
enum Timeline {
    Loading,
    Error(String),
    Empty,
    Groups(Vec<MessageGroup>),
}

/// Ratatui-backed message list. The session pushes state in through the
/// [`MessageListView`] calls; `draw` paints whatever was pushed last.
pub struct TerminalMessageList {
    timeline: Timeline,
    /// Lines scrolled up from the bottom. Reset on new activity.
    scroll_back: u16,
}

impl TerminalMessageList {
    pub fn new() -> Self {
        Self {
            timeline: Timeline::Loading,
            scroll_back: 0,
        }
    }

    pub fn scroll_up(&mut self) {
        self.scroll_back = self.scroll_back.saturating_add(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll_back = self.scroll_back.saturating_sub(1);
    }

    fn lines(&self) -> Vec<Line<'_>> {
        match &self.timeline {
            Timeline::Loading => vec![Line::from(Span::styled(
                "Loading messages...",
                Style::default().fg(Color::DarkGray),
            ))],
            Timeline::Error(msg) => vec![Line::from(Span::styled(
                format!("Could not load messages: {msg}"),
                Style::default().fg(Color::Red),
            ))],
            Timeline::Empty => vec![Line::from(Span::styled(
                "No messages yet. Say hello!",
                Style::default().fg(Color::DarkGray),
            ))],
            Timeline::Groups(groups) => {
                let mut lines = Vec::new();
                for group in groups {
                    let first_at = group
                        .messages
                        .first()
                        .map(|m| m.created_at.format("%H:%M").to_string())
                        .unwrap_or_default();
                    lines.push(Line::from(vec![
                        Span::styled(
                            group.author_name().to_string(),
                            Style::default()
                                .fg(Color::Cyan)
                                .add_modifier(Modifier::BOLD),
                        ),
                        Span::styled(
                            format!("  {first_at}"),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]));
                    for message in &group.messages {
                        lines.push(Line::from(format!("  {}", message.content)));
                    }
                    lines.push(Line::default());
                }
                lines
            }
        }
    }

    pub fn draw(&self, f: &mut Frame, area: ratatui::layout::Rect, title: &str) {
        let lines = self.lines();
        let inner_height = area.height.saturating_sub(2);
        let overflow = (lines.len() as u16).saturating_sub(inner_height);
        let scroll = overflow.saturating_sub(self.scroll_back.min(overflow));

        let paragraph = Paragraph::new(lines)
            .wrap(ratatui::widgets::Wrap { trim: false })
            .scroll((scroll, 0))
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        f.render_widget(paragraph, area);
    }
}

impl MessageListView for TerminalMessageList {
    fn show_loading(&mut self) {
        self.timeline = Timeline::Loading;
        self.scroll_back = 0;
    }

    fn show_error(&mut self, message: &str) {
        self.timeline = Timeline::Error(message.to_string());
    }

    fn show_empty(&mut self) {
        self.timeline = Timeline::Empty;
    }

    fn render(&mut self, groups: &[MessageGroup]) {
        self.timeline = Timeline::Groups(groups.to_vec());
    }

    fn append_group(&mut self, group: &MessageGroup) {
        match &mut self.timeline {
            Timeline::Groups(groups) => groups.push(group.clone()),
            _ => self.timeline = Timeline::Groups(vec![group.clone()]),
        }
    }

    fn append_to_last_group(&mut self, message: &Message) {
        if let Timeline::Groups(groups) = &mut self.timeline {
            if let Some(last) = groups.last_mut() {
                last.messages.push(message.clone());
            }
        }
    }

    fn update_message(&mut self, message: &Message) {
        if let Timeline::Groups(groups) = &mut self.timeline {
            for group in groups {
                if let Some(slot) = group.messages.iter_mut().find(|m| m.id == message.id) {
                    *slot = message.clone();
                    return;
                }
            }
        }
    }

    fn remove_message(&mut self, id: MessageId) {
        if let Timeline::Groups(groups) = &mut self.timeline {
            for group in groups.iter_mut() {
                group.messages.retain(|m| m.id != id);
            }
            groups.retain(|g| !g.messages.is_empty());
        }
    }

    fn scroll_to_latest(&mut self) {
        self.scroll_back = 0;
    }
}

impl Default for TerminalMessageList {
    fn default() -> Self {
        Self::new()
    }
}
