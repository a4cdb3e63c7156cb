//! Terminal front end: page preview with overlay and a status bar

use std::time::Duration;

use anyhow::Result;
use log::debug;
use ratatui::{
    Frame, Terminal,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::event_source::{Event, EventSource, KeyCode, KeyEvent, MouseButton, MouseEventKind};
use crate::overlay::OverlayStyle;
use crate::pdf::{DocumentBackend, Phase};
use crate::viewer::Viewer;
use crate::widget::PageView;

const TICK_RATE: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AppAction {
    Quit,
}

pub struct App<B: DocumentBackend> {
    viewer: Viewer<B>,
    page_view: PageView,
    style: OverlayStyle,
    title: String,
}

impl<B: DocumentBackend> App<B> {
    pub fn new(viewer: Viewer<B>, style: OverlayStyle, title: impl Into<String>) -> Self {
        Self {
            viewer,
            page_view: PageView::new(),
            style,
            title: title.into(),
        }
    }

    pub fn viewer(&self) -> &Viewer<B> {
        &self.viewer
    }

    pub fn viewer_mut(&mut self) -> &mut Viewer<B> {
        &mut self.viewer
    }

    pub fn handle_event(&mut self, event: &Event) -> Option<AppAction> {
        match event {
            Event::Key(key) => self.handle_key(*key),
            Event::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                if let Some((x, y)) = self.page_view.cell_to_viewport(mouse.column, mouse.row) {
                    let hit = self.viewer.toggle_at(x, y);
                    debug!("Click at ({x:.1}, {y:.1}) hit {hit:?}");
                }
                None
            }
            _ => None,
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<AppAction> {
        if key.kind != crossterm::event::KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(AppAction::Quit),
            KeyCode::Char('n') | KeyCode::Right => self.viewer.next_match(),
            KeyCode::Char('p') | KeyCode::Left => self.viewer.prev_match(),
            KeyCode::Char('j') | KeyCode::PageDown => self.viewer.next_page(),
            KeyCode::Char('k') | KeyCode::PageUp => self.viewer.prev_page(),
            KeyCode::Char('g') => self.viewer.select_page(1),
            KeyCode::Char('G') => {
                if let Some(count) = self.viewer.page_count() {
                    self.viewer.select_page(count);
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.viewer.toggle_current(),
            KeyCode::Char('c') => self.viewer.clear_highlight(),
            _ => {}
        }
        None
    }

    pub fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(3), Constraint::Length(1)])
            .split(f.area());

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" {} ", self.title))
            .border_style(Style::default().fg(Color::DarkGray));
        let inner = block.inner(chunks[0]);
        f.render_widget(block, chunks[0]);

        match self.viewer.displayed() {
            Some(page) => {
                let boxes = self.viewer.overlay();
                self.page_view
                    .render(f.buffer_mut(), inner, page, &boxes, &self.style);
            }
            None => {
                self.page_view.reset();
                let message = match self.viewer.phase() {
                    Phase::Loading => "Loading…",
                    _ => "No page to show",
                };
                f.render_widget(
                    Paragraph::new(message).style(Style::default().fg(Color::DarkGray)),
                    inner,
                );
            }
        }

        f.render_widget(Paragraph::new(self.status_line()), chunks[1]);
    }

    fn status_line(&self) -> Line<'static> {
        let viewer = &self.viewer;
        let separator = Span::styled(" │ ", Style::default().fg(Color::DarkGray));

        let page = match viewer.page_count() {
            Some(count) => format!("Page {} / {count}", viewer.current_page()),
            None => "Page - / -".to_string(),
        };

        let mut spans = vec![
            Span::styled(
                viewer.phase().as_str().to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            separator.clone(),
            Span::raw(page),
            separator.clone(),
            Span::raw(format!("Match {}", viewer.position())),
        ];

        if let Some(element) = viewer.highlighted_element() {
            spans.push(separator.clone());
            spans.push(Span::styled(
                element.display_name().to_string(),
                Style::default().fg(Color::Yellow),
            ));
        }

        if matches!(viewer.phase(), Phase::RenderFailed | Phase::Unloaded) {
            if let Some(error) = viewer.last_error() {
                spans.push(separator);
                spans.push(Span::styled(
                    format!("Error: {error}"),
                    Style::default().fg(Color::Red),
                ));
            }
        }

        Line::from(spans)
    }
}

/// Run the viewer until the user quits.
///
/// Render results are applied before every frame.
pub fn run_app_with_event_source<T, B>(
    terminal: &mut Terminal<T>,
    app: &mut App<B>,
    event_source: &mut dyn EventSource,
) -> Result<()>
where
    T: ratatui::backend::Backend,
    T::Error: Send + Sync + 'static,
    B: DocumentBackend,
{
    loop {
        app.viewer.pump();
        terminal.draw(|f| app.draw(f))?;

        let mut events_processed = 0;
        while event_source.poll(if events_processed == 0 {
            TICK_RATE
        } else {
            Duration::ZERO
        })? && events_processed < 50
        {
            let event = event_source.read()?;
            events_processed += 1;
            if app.handle_event(&event) == Some(AppAction::Quit) {
                return Ok(());
            }
        }
    }
}
