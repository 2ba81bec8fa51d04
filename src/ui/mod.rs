use crate::settings::{FormAction, SettingsField, SettingsForm};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Frame, Terminal,
    backend::{Backend, CrosstermBackend},
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    text::Line,
    widgets::{Block, Borders, Paragraph},
};
use std::io;

/// Runs the settings editor until the user saves or cancels.
/// Returns `true` when the form was submitted.
pub fn run_settings_editor(form: &mut SettingsForm) -> io::Result<bool> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_form(&mut terminal, form);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_form<B: Backend>(terminal: &mut Terminal<B>, form: &mut SettingsForm) -> io::Result<bool> {
    loop {
        terminal.draw(|f| render_settings(f, form))?;

        if let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            match form.handle_key(key) {
                FormAction::Continue => {}
                FormAction::Save => return Ok(true),
                FormAction::Cancel => return Ok(false),
            }
        }
    }
}

pub fn render_settings(f: &mut Frame, form: &mut SettingsForm) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    let title = Paragraph::new(Line::from("Readeck Integration Settings".bold()));
    f.render_widget(title, chunks[0]);

    let fields = [
        (SettingsField::ApiUrl, chunks[1], chunks[2]),
        (SettingsField::ApiToken, chunks[3], chunks[4]),
    ];
    for (field, desc_area, input_area) in fields {
        let focused = form.focus == field;
        let border = if focused { Color::Green } else { Color::Reset };

        f.render_widget(
            Paragraph::new(field.description()).style(Style::default().fg(Color::DarkGray)),
            desc_area,
        );

        let textarea = form.field_mut(field);
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border))
                .title(field.label()),
        );
        textarea.set_cursor_line_style(Style::default());
        if focused {
            textarea.set_cursor_style(Style::default().add_modifier(Modifier::REVERSED));
        } else {
            // Hides the cursor of the unfocused field.
            textarea.set_cursor_style(Style::default());
        }
        f.render_widget(&*textarea, input_area);
    }

    let help = Paragraph::new("Enter save · Esc cancel · Tab switch field · Ctrl+R show token")
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(help, chunks[6]);
}
