use std::cmp::min;
use std::mem;

use crossterm::event::KeyCode;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use ratatui::Frame;

use crate::dispatch::Dispatcher;
use crate::engine::{CatalogEngine, CatalogState, Change, Completion, DeletePrompt, Outcome};
use crate::error::CatalogError;
use crate::models::{Track, RATING_MAX, RATING_MIN};

use super::forms::{FormField, TrackForm};
use super::helpers::{centered_rect, query_line, stats_line, track_meta_line};

/// Footer space reserved for status messages and instructions.
const FOOTER_HEIGHT: u16 = 3;
/// Header space for the statistics and active query.
const HEADER_HEIGHT: u16 = 4;
/// Height allocation per track card.
const TRACK_CARD_HEIGHT: u16 = 4;
/// Step applied by the minimum rating shortcuts.
const MIN_RATING_STEP: f64 = 0.5;

/// Fine-grained modes layered over the track list.
enum Mode {
    Normal,
    Creating(TrackForm),
    Editing { id: i64, form: TrackForm },
    ConfirmDelete(DeletePrompt),
    Searching(SearchState),
}

/// State for an active inline search. The previous text is restored on Esc.
struct SearchState {
    previous: String,
}

/// Holds the footer message text plus its severity.
struct StatusMessage {
    text: String,
    kind: StatusKind,
}

/// Severity levels shown in the footer.
enum StatusKind {
    Info,
    Error,
}

impl StatusKind {
    fn style(&self) -> Style {
        match self {
            StatusKind::Info => Style::default().fg(Color::Green),
            StatusKind::Error => Style::default().fg(Color::Red),
        }
    }
}

/// Terminal front end state: the engine, the worker pool feeding it, and
/// whatever modal is open.
pub struct App {
    engine: CatalogEngine,
    dispatcher: Dispatcher,
    selected: usize,
    mode: Mode,
    status: Option<StatusMessage>,
}

impl App {
    pub fn new(engine: CatalogEngine, dispatcher: Dispatcher) -> Self {
        Self {
            engine,
            dispatcher,
            selected: 0,
            mode: Mode::Normal,
            status: None,
        }
    }

    pub fn engine(&self) -> &CatalogEngine {
        &self.engine
    }

    /// Kick off the initial load.
    pub fn start(&mut self) {
        if let Some(request) = self.engine.activate() {
            self.dispatcher.submit(request);
        }
    }

    /// Drop any outstanding work before the terminal is restored.
    pub fn shutdown(&mut self) {
        self.engine.teardown();
    }

    /// Apply every completion that has arrived since the last tick.
    pub fn process_completions(&mut self) {
        if self.engine.is_torn_down() {
            return;
        }
        for completion in self.dispatcher.drain() {
            self.apply_completion(completion);
        }
    }

    pub fn handle_key(&mut self, code: KeyCode) -> bool {
        let mut exit = false;
        let mode = mem::replace(&mut self.mode, Mode::Normal);

        self.mode = match mode {
            Mode::Normal => self.handle_normal_key(code, &mut exit),
            Mode::Creating(form) => self.handle_form(code, None, form),
            Mode::Editing { id, form } => self.handle_form(code, Some(id), form),
            Mode::ConfirmDelete(prompt) => self.handle_confirm_delete(code, prompt),
            Mode::Searching(state) => self.handle_search(code, state),
        };

        exit
    }

    /// Ctrl+L: drop the search text and minimum rating, keep the ordering.
    pub(crate) fn handle_ctrl_l(&mut self) {
        if !matches!(self.mode, Mode::Normal | Mode::Searching(_)) {
            return;
        }
        let mut query = self.engine.query().clone();
        query.text.clear();
        query.min_rating = RATING_MIN;
        self.engine.set_query(query);
        self.mode = Mode::Normal;
        self.clamp_selection();
        self.set_status("Filters cleared.", StatusKind::Info);
    }

    fn handle_normal_key(&mut self, code: KeyCode, exit: &mut bool) -> Mode {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                *exit = true;
                return Mode::Normal;
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.clear_status();
                let request = self.engine.reload();
                self.dispatcher.submit(request);
                return Mode::Normal;
            }
            _ => {}
        }

        if !self.engine.is_ready() {
            return Mode::Normal;
        }

        match code {
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::PageUp => self.move_selection(-5),
            KeyCode::PageDown => self.move_selection(5),
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = self.visible_count().saturating_sub(1),
            KeyCode::Char('+') => {
                self.clear_status();
                return Mode::Creating(TrackForm::default());
            }
            KeyCode::Char('e') | KeyCode::Char('E') => {
                if let Some(track) = self.current_track().cloned() {
                    self.clear_status();
                    return Mode::Editing {
                        id: track.id,
                        form: TrackForm::from_track(&track),
                    };
                }
                self.set_status("No track selected to edit.", StatusKind::Error);
            }
            KeyCode::Char('-') => {
                let Some(id) = self.current_track().map(|track| track.id) else {
                    self.set_status("No track selected to delete.", StatusKind::Error);
                    return Mode::Normal;
                };
                match self.engine.prepare_delete(id) {
                    Ok(prompt) => {
                        self.clear_status();
                        return Mode::ConfirmDelete(prompt);
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
            }
            KeyCode::Char('f') | KeyCode::Char('/') => {
                return Mode::Searching(SearchState {
                    previous: self.engine.query().text.clone(),
                });
            }
            KeyCode::Char('[') => self.adjust_min_rating(-MIN_RATING_STEP),
            KeyCode::Char(']') => self.adjust_min_rating(MIN_RATING_STEP),
            KeyCode::Char('s') | KeyCode::Char('S') => {
                let mut query = self.engine.query().clone();
                query.sort_key = query.sort_key.next();
                self.engine.set_query(query);
            }
            KeyCode::Char('d') | KeyCode::Char('D') => {
                let mut query = self.engine.query().clone();
                query.direction = query.direction.toggled();
                self.engine.set_query(query);
            }
            _ => {}
        }
        Mode::Normal
    }

    fn handle_form(&mut self, code: KeyCode, editing: Option<i64>, mut form: TrackForm) -> Mode {
        let mut keep_open = true;

        if form.is_pending() {
            // Only cancelling is possible while the remote answers. The request
            // still completes and updates the list.
            if code == KeyCode::Esc {
                self.set_status("Form closed; the save is still in progress.", StatusKind::Info);
                return Mode::Normal;
            }
            return Self::form_mode(editing, form);
        }

        match code {
            KeyCode::Esc => {
                let message = if editing.is_some() {
                    "Edit cancelled."
                } else {
                    "Creation cancelled."
                };
                self.set_status(message, StatusKind::Info);
                keep_open = false;
            }
            KeyCode::Tab | KeyCode::Down => form.next_field(),
            KeyCode::BackTab | KeyCode::Up => form.previous_field(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Enter => self.submit_form(editing, &mut form),
            KeyCode::Char(ch) => {
                form.push_char(ch);
            }
            _ => {}
        }

        if keep_open {
            Self::form_mode(editing, form)
        } else {
            Mode::Normal
        }
    }

    fn form_mode(editing: Option<i64>, form: TrackForm) -> Mode {
        match editing {
            Some(id) => Mode::Editing { id, form },
            None => Mode::Creating(form),
        }
    }

    fn submit_form(&mut self, editing: Option<i64>, form: &mut TrackForm) {
        let draft = match form.parse_inputs() {
            Ok(draft) => draft,
            Err(err) => {
                form.reject(&err);
                self.set_status(err.to_string(), StatusKind::Error);
                return;
            }
        };

        let begun = match editing {
            Some(id) => self.engine.begin_update(id, &draft),
            None => self.engine.begin_create(&draft),
        };

        match begun {
            Ok(request) => {
                form.pending = Some(request.id());
                form.error = None;
                self.dispatcher.submit(request);
                self.set_status("Saving…", StatusKind::Info);
            }
            Err(CatalogError::Validation(err)) => {
                form.reject(&err);
                self.set_status(err.to_string(), StatusKind::Error);
            }
            Err(err) => {
                let message = err.to_string();
                form.error = Some(message.clone());
                self.set_status(message, StatusKind::Error);
            }
        }
    }

    fn handle_confirm_delete(&mut self, code: KeyCode, prompt: DeletePrompt) -> Mode {
        match code {
            KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                self.set_status("Deletion cancelled.", StatusKind::Info);
                Mode::Normal
            }
            KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                let title = prompt.title.clone();
                match self.engine.begin_delete(prompt.confirm()) {
                    Ok(request) => {
                        self.dispatcher.submit(request);
                        self.set_status(format!("Deleting '{title}'…"), StatusKind::Info);
                    }
                    Err(err) => self.set_status(err.to_string(), StatusKind::Error),
                }
                Mode::Normal
            }
            _ => Mode::ConfirmDelete(prompt),
        }
    }

    fn handle_search(&mut self, code: KeyCode, state: SearchState) -> Mode {
        let mut query = self.engine.query().clone();
        match code {
            KeyCode::Esc => {
                query.text = state.previous;
                self.engine.set_query(query);
                self.clamp_selection();
                return Mode::Normal;
            }
            KeyCode::Enter => return Mode::Normal,
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            KeyCode::Backspace => {
                query.text.pop();
                self.engine.set_query(query);
                self.clamp_selection();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                query.text.push(ch);
                self.engine.set_query(query);
                self.selected = 0;
            }
            _ => {}
        }
        Mode::Searching(state)
    }

    fn apply_completion(&mut self, completion: Completion) {
        let request = completion.request;
        let outcome = self.engine.complete(completion);

        let form_waiting = match &mut self.mode {
            Mode::Creating(form) | Mode::Editing { form, .. } => {
                form.pending == Some(request)
            }
            _ => false,
        };

        if form_waiting {
            match &outcome {
                Outcome::Applied(_) => self.mode = Mode::Normal,
                Outcome::Failed(err) => {
                    if let Mode::Creating(form) | Mode::Editing { form, .. } = &mut self.mode {
                        form.pending = None;
                        form.error = Some(err.to_string());
                    }
                }
                Outcome::Discarded => {
                    if let Mode::Creating(form) | Mode::Editing { form, .. } = &mut self.mode {
                        form.pending = None;
                        form.error = Some("The track is no longer in the catalog.".to_string());
                    }
                }
            }
        }

        match outcome {
            Outcome::Applied(change) => self.report_change(change),
            Outcome::Failed(err) => self.set_status(err.to_string(), StatusKind::Error),
            Outcome::Discarded => {}
        }
        self.clamp_selection();
    }

    fn report_change(&mut self, change: Change) {
        match change {
            Change::Loaded { count } => {
                self.selected = 0;
                self.set_status(format!("Loaded {count} tracks."), StatusKind::Info);
            }
            Change::Created(track) => {
                self.focus_track(track.id);
                self.set_status(format!("Added '{}'.", track.title), StatusKind::Info);
            }
            Change::Updated(track) => {
                self.focus_track(track.id);
                self.set_status(format!("Updated '{}'.", track.title), StatusKind::Info);
            }
            Change::Deleted(track) => {
                self.set_status(format!("Deleted '{}'.", track.title), StatusKind::Info);
            }
        }
    }

    fn focus_track(&mut self, id: i64) {
        if let Some(index) = self.engine.view().items.iter().position(|t| t.id == id) {
            self.selected = index;
        }
    }

    fn adjust_min_rating(&mut self, delta: f64) {
        let mut query = self.engine.query().clone();
        query.min_rating = (query.min_rating + delta).clamp(RATING_MIN, RATING_MAX);
        self.engine.set_query(query);
        self.clamp_selection();
    }

    fn current_track(&self) -> Option<&Track> {
        self.engine.view().items.get(self.selected)
    }

    fn visible_count(&self) -> usize {
        self.engine.view().items.len()
    }

    fn move_selection(&mut self, offset: isize) {
        let len = self.visible_count();
        if len == 0 {
            self.selected = 0;
            return;
        }
        let target = self.selected as isize + offset;
        self.selected = target.clamp(0, len as isize - 1) as usize;
    }

    fn clamp_selection(&mut self) {
        let len = self.visible_count();
        if len == 0 {
            self.selected = 0;
        } else if self.selected >= len {
            self.selected = len - 1;
        }
    }

    fn set_status<S: Into<String>>(&mut self, text: S, kind: StatusKind) {
        self.status = Some(StatusMessage {
            text: text.into(),
            kind,
        });
    }

    fn clear_status(&mut self) {
        self.status = None;
    }

    pub(crate) fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(HEADER_HEIGHT.min(area.height)),
                Constraint::Min(0),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(area);

        self.draw_header(frame, chunks[0]);
        match self.engine.state() {
            CatalogState::Loading if self.engine.tracks().is_empty() => {
                self.draw_notice(frame, chunks[1], "Loading…", Style::default().fg(Color::Gray))
            }
            CatalogState::LoadFailed(message) => self.draw_notice(
                frame,
                chunks[1],
                &format!("Error: {message}\nPress r to retry."),
                Style::default().fg(Color::Red),
            ),
            _ => self.draw_track_list(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);

        match &self.mode {
            Mode::Creating(form) => self.draw_form(frame, area, "Add Track", form),
            Mode::Editing { form, .. } => self.draw_form(frame, area, "Edit Track", form),
            Mode::ConfirmDelete(prompt) => self.draw_confirm_delete(frame, area, prompt),
            Mode::Searching(_) => self.draw_search_bar(frame, chunks[0]),
            Mode::Normal => {}
        }
    }

    fn draw_header(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Track Catalog");
        let view = self.engine.view();
        let lines = vec![
            Line::from(Span::styled(
                stats_line(&view.stats),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(
                query_line(self.engine.query()),
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_notice(&self, frame: &mut Frame, area: Rect, text: &str, style: Style) {
        let paragraph = Paragraph::new(text.to_string())
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_track_list(&self, frame: &mut Frame, area: Rect) {
        let items = &self.engine.view().items;
        if items.is_empty() {
            let text = if self.engine.tracks().is_empty() {
                "The catalog is empty. Press + to add a track."
            } else {
                "No tracks match the current filters."
            };
            self.draw_notice(frame, area, text, Style::default().fg(Color::DarkGray));
            return;
        }
        self.render_track_cards(frame, area, items, self.selected);
    }

    fn render_track_cards(&self, frame: &mut Frame, area: Rect, tracks: &[Track], selected: usize) {
        if tracks.is_empty() || area.height == 0 {
            return;
        }

        let card_height = TRACK_CARD_HEIGHT as usize;
        let capacity = ((area.height as usize) / card_height).max(1);
        let len = tracks.len();
        let mut start = if selected >= capacity {
            selected + 1 - capacity
        } else {
            0
        };
        if start + capacity > len {
            start = len.saturating_sub(capacity);
        }
        let end = min(start + capacity, len);
        let visible_len = end.saturating_sub(start);
        if visible_len == 0 {
            return;
        }

        let constraints: Vec<Constraint> = (0..visible_len)
            .map(|_| Constraint::Length(TRACK_CARD_HEIGHT))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (idx, chunk) in rows.iter().enumerate() {
            if chunk.height == 0 {
                continue;
            }
            let track_index = start + idx;
            let Some(track) = tracks.get(track_index) else {
                break;
            };

            let mut block = Block::default().borders(Borders::ALL);
            let mut paragraph_style = Style::default();
            let title = if track_index == selected {
                block = block.style(Style::default().fg(Color::Yellow));
                paragraph_style = Style::default().fg(Color::Yellow);
                format!("▶ {}", track.title)
            } else {
                track.title.clone()
            };

            let lines = vec![
                Line::from(Span::styled(
                    title,
                    Style::default().add_modifier(Modifier::BOLD),
                )),
                Line::from(Span::styled(
                    track_meta_line(track),
                    Style::default().fg(Color::Gray),
                )),
            ];

            let paragraph = Paragraph::new(lines)
                .block(block)
                .wrap(Wrap { trim: true })
                .style(paragraph_style);
            frame.render_widget(paragraph, *chunk);
        }
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::TOP);
        frame.render_widget(block.clone(), area);
        let inner = block.inner(area);

        let status_line = match &self.status {
            Some(status) => Line::from(vec![Span::styled(status.text.clone(), status.kind.style())]),
            None => Line::from(""),
        };

        let paragraph = Paragraph::new(vec![status_line, self.footer_instructions()])
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    fn footer_instructions(&self) -> Line<'static> {
        let key_style = Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD);
        let pairs: &[(&str, &str)] = match &self.mode {
            Mode::Creating(_) | Mode::Editing { .. } => &[
                ("[Tab]", " Next field   "),
                ("[Enter]", " Save   "),
                ("[Esc]", " Cancel"),
            ],
            Mode::ConfirmDelete(_) => &[("[Y]", " Delete   "), ("[N/Esc]", " Keep")],
            Mode::Searching(_) => &[
                ("[Type]", " Filter titles   "),
                ("[Enter]", " Keep   "),
                ("[Esc]", " Revert"),
            ],
            Mode::Normal if !self.engine.is_ready() => &[("[r]", " Reload   "), ("[q]", " Quit")],
            Mode::Normal => &[
                ("[+]", " Add  "),
                ("[e]", " Edit  "),
                ("[-]", " Delete  "),
                ("[f]", " Search  "),
                ("[ ]", " Min ★  "),
                ("[s]", " Sort  "),
                ("[d]", " Direction  "),
                ("[r]", " Reload  "),
                ("[q]", " Quit"),
            ],
        };

        let spans: Vec<Span<'static>> = pairs
            .iter()
            .flat_map(|(key, label)| {
                [
                    Span::styled(key.to_string(), key_style),
                    Span::raw(label.to_string()),
                ]
            })
            .collect();
        Line::from(spans)
    }

    fn draw_search_bar(&self, frame: &mut Frame, area: Rect) {
        let height = 3u16.min(area.height);
        let popup_area = Rect {
            x: area.x,
            y: area.y,
            width: area.width,
            height,
        };
        frame.render_widget(Clear, popup_area);

        let text = &self.engine.query().text;
        let block = Block::default().borders(Borders::ALL).title("Search");
        let paragraph = Paragraph::new(Span::raw(format!("Search: {text}")))
            .block(block.clone())
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);

        let inner = block.inner(popup_area);
        let cursor_x = inner.x + "Search: ".len() as u16 + text.chars().count() as u16;
        frame.set_cursor_position((cursor_x, inner.y));
    }

    fn draw_form(&self, frame: &mut Frame, area: Rect, title: &str, form: &TrackForm) {
        let popup_area = centered_rect(70, 50, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title(title).borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let mut lines: Vec<Line> = FormField::ALL
            .iter()
            .map(|field| form.build_line(*field))
            .collect();
        lines.push(Line::from(""));

        if form.is_pending() {
            lines.push(Line::from(Span::styled(
                "Saving…",
                Style::default().fg(Color::Gray),
            )));
        } else if let Some(error) = &form.error {
            lines.push(Line::from(Span::styled(
                error.clone(),
                Style::default().fg(Color::Red),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "Enter to save • Tab to switch • Esc to cancel",
                Style::default().fg(Color::Gray),
            )));
        }

        frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);

        if !form.is_pending() {
            let row = FormField::ALL
                .iter()
                .position(|field| *field == form.active)
                .unwrap_or(0) as u16;
            let prefix = form.active.label().len() as u16 + 2;
            frame.set_cursor_position((
                inner.x + prefix + form.value_len(form.active) as u16,
                inner.y + row,
            ));
        }
    }

    fn draw_confirm_delete(&self, frame: &mut Frame, area: Rect, prompt: &DeletePrompt) {
        let popup_area = centered_rect(60, 30, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().title("Delete Track").borders(Borders::ALL);
        frame.render_widget(block.clone(), popup_area);
        let inner = block.inner(popup_area);

        let lines = vec![
            Line::from(format!("Delete '{}'?", prompt.title)),
            Line::from("The remote catalog will be asked to remove it."),
            Line::from(""),
            Line::from(Span::styled(
                "Press Y to confirm or N / Esc to cancel.",
                Style::default().fg(Color::Gray),
            )),
        ];

        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Left)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, inner);
    }

    /// Block until one completion arrives and apply it.
    #[cfg(test)]
    pub(crate) fn await_completion(&mut self) {
        if let Some(completion) = self.dispatcher.wait() {
            self.apply_completion(completion);
        }
    }

    #[cfg(test)]
    pub(crate) fn selected_track(&self) -> Option<&Track> {
        self.current_track()
    }

    #[cfg(test)]
    pub(crate) fn status_text(&self) -> Option<&str> {
        self.status.as_ref().map(|status| status.text.as_str())
    }

    #[cfg(test)]
    pub(crate) fn open_form(&self) -> Option<&TrackForm> {
        match &self.mode {
            Mode::Creating(form) | Mode::Editing { form, .. } => Some(form),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn is_confirming_delete(&self) -> bool {
        matches!(self.mode, Mode::ConfirmDelete(_))
    }
}
