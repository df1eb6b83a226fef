use anyhow::Result;
use chrono::{Local, NaiveDateTime};
use crossterm::event::KeyCode;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::Frame;
use rusqlite::Connection;

use super::forms::{input_line, FilterField};
use super::helpers::picker_list;
use super::screens::{
    BookingFocus, BookingScreen, DoctorsScreen, ManageFocus, ManageScreen, StatusMessage,
};

/// Footer space reserved for the status message and key hints.
const FOOTER_HEIGHT: u16 = 3;

/// The three workflows, one per screen. Keeping this explicit makes it easy
/// to reason about which state holder receives a keystroke.
#[derive(Copy, Clone, PartialEq, Eq)]
enum Tab {
    Doctors,
    Booking,
    Manage,
}

/// Central application state: the shared connection plus one state holder
/// per screen. All three are built eagerly at startup, mirroring the
/// load-on-construction behavior of the windows this replaces.
pub struct App {
    conn: Connection,
    tab: Tab,
    doctors: DoctorsScreen,
    booking: BookingScreen,
    manage: ManageScreen,
}

impl App {
    pub fn new(conn: Connection) -> Self {
        let now = Local::now().naive_local();
        let doctors = DoctorsScreen::new(&conn);
        let booking = BookingScreen::new(&conn, now);
        let manage = ManageScreen::new(&conn, now);
        Self {
            conn,
            tab: Tab::Doctors,
            doctors,
            booking,
            manage,
        }
    }

    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    /// Ctrl+D from the event loop: jump to the doctor list.
    pub fn show_doctors(&mut self) {
        self.tab = Tab::Doctors;
    }

    /// Ctrl+B from the event loop: jump to booking.
    pub fn show_booking(&mut self) {
        self.tab = Tab::Booking;
    }

    /// Ctrl+G from the event loop: jump to appointment management.
    pub fn show_manage(&mut self) {
        self.tab = Tab::Manage;
    }

    /// Ctrl+R from the event loop: reload the visible screen from the store.
    pub fn reload_current(&mut self) {
        match self.tab {
            Tab::Doctors => self.doctors.reload(&self.conn),
            Tab::Booking => self.booking.reload(&self.conn),
            Tab::Manage => self.manage.reload_patients(&self.conn),
        }
    }

    /// Route a key press to the visible screen. Returns `true` when the
    /// application should exit.
    pub fn handle_key(&mut self, code: KeyCode) -> Result<bool> {
        if code == KeyCode::Esc {
            return Ok(true);
        }
        match self.tab {
            Tab::Doctors => self.handle_doctors_key(code),
            Tab::Booking => self.handle_booking_key(code),
            Tab::Manage => self.handle_manage_key(code),
        }
        Ok(false)
    }

    fn handle_doctors_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char(ch) => self.doctors.push_filter_char(&self.conn, ch),
            KeyCode::Backspace => self.doctors.backspace_filter(&self.conn),
            KeyCode::Tab => self.doctors.filters.toggle_field(),
            KeyCode::Up => self.doctors.move_selection(-1),
            KeyCode::Down => self.doctors.move_selection(1),
            _ => {}
        }
    }

    fn handle_booking_key(&mut self, code: KeyCode) {
        let on_list = matches!(
            self.booking.focus,
            BookingFocus::Doctors | BookingFocus::Patients
        );
        match code {
            KeyCode::Enter => {
                let now = self.now();
                self.booking.submit(&self.conn, now);
            }
            KeyCode::Tab => self.booking.cycle_focus(),
            KeyCode::Up => self.booking.move_selection(-1),
            KeyCode::Down => self.booking.move_selection(1),
            KeyCode::Char(' ') if on_list => self.booking.mark_selection(),
            KeyCode::Char(ch) => self.booking.push_char(ch),
            KeyCode::Backspace => self.booking.backspace(),
            _ => {}
        }
    }

    fn handle_manage_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => {
                let now = self.now();
                self.manage.reschedule(&self.conn, now);
            }
            KeyCode::Delete => self.manage.delete(&self.conn),
            KeyCode::Tab => self.manage.cycle_focus(),
            KeyCode::Up => self.manage.move_selection(&self.conn, -1),
            KeyCode::Down => self.manage.move_selection(&self.conn, 1),
            KeyCode::Char(ch) => self.manage.push_date_char(ch),
            KeyCode::Backspace => self.manage.backspace_date(),
            _ => {}
        }
    }

    // -- drawing ----------------------------------------------------------

    pub fn draw(&mut self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(5),
                Constraint::Length(FOOTER_HEIGHT),
            ])
            .split(frame.area());

        self.draw_tabs(frame, chunks[0]);
        match self.tab {
            Tab::Doctors => self.draw_doctors(frame, chunks[1]),
            Tab::Booking => self.draw_booking(frame, chunks[1]),
            Tab::Manage => self.draw_manage(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_tabs(&self, frame: &mut Frame, area: Rect) {
        let entry = |label: &str, tab: Tab| {
            let style = if self.tab == tab {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            Span::styled(label.to_string(), style)
        };
        let line = Line::from(vec![
            entry(" Doctors [^D] ", Tab::Doctors),
            Span::raw("|"),
            entry(" Book [^B] ", Tab::Booking),
            Span::raw("|"),
            entry(" Manage [^G] ", Tab::Manage),
        ]);
        frame.render_widget(Paragraph::new(line), area);
    }

    fn draw_doctors(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(3)])
            .split(area);

        let filters = &self.doctors.filters;
        let lines = vec![
            input_line("Name", &filters.name, filters.active == FilterField::Name),
            input_line(
                "Specialty",
                &filters.specialty,
                filters.active == FilterField::Specialty,
            ),
        ];
        frame.render_widget(
            Paragraph::new(lines).block(Block::default().title("Filters").borders(Borders::ALL)),
            chunks[0],
        );

        let rows = self.doctors.doctors.iter().map(|doctor| {
            let text = if doctor.available {
                doctor.to_string()
            } else {
                format!("{doctor} [unavailable]")
            };
            (text, false)
        });
        let list = picker_list("Doctors", rows, self.doctors.selected, true);
        frame.render_widget(list, chunks[1]);
    }

    fn draw_booking(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(4)])
            .split(area);

        let lists = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);

        let booking = &self.booking;
        let doctor_rows = booking.doctors.iter().map(|doctor| {
            (
                doctor.to_string(),
                booking.selected_doctor == Some(doctor.id),
            )
        });
        frame.render_widget(
            picker_list(
                "Doctor (Space to choose)",
                doctor_rows,
                booking.doctor_cursor,
                booking.focus == BookingFocus::Doctors,
            ),
            lists[0],
        );

        let patient_rows = booking.patients.iter().map(|patient| {
            (
                patient.to_string(),
                booking.selected_patient == Some(patient.id),
            )
        });
        frame.render_widget(
            picker_list(
                "Patient (Space to choose)",
                patient_rows,
                booking.patient_cursor,
                booking.focus == BookingFocus::Patients,
            ),
            lists[1],
        );

        let inputs = vec![
            input_line(
                "Date",
                &booking.date.value,
                booking.focus == BookingFocus::Date,
            ),
            input_line(
                "Notes",
                &booking.notes.value,
                booking.focus == BookingFocus::Notes,
            ),
        ];
        frame.render_widget(
            Paragraph::new(inputs)
                .block(Block::default().title("Enter to book").borders(Borders::ALL)),
            chunks[1],
        );
    }

    fn draw_manage(&self, frame: &mut Frame, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(4), Constraint::Length(3)])
            .split(area);

        let lists = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(chunks[0]);

        let manage = &self.manage;
        let patient_rows = manage
            .patients
            .iter()
            .map(|patient| (patient.to_string(), false));
        frame.render_widget(
            picker_list(
                "Patients",
                patient_rows,
                manage.patient_cursor,
                manage.focus == ManageFocus::Patients,
            ),
            lists[0],
        );

        let appointment_rows = manage
            .appointments
            .iter()
            .map(|appointment| (appointment.summary(), false));
        frame.render_widget(
            picker_list(
                "Appointments (Del to remove)",
                appointment_rows,
                manage.appointment_cursor,
                manage.focus == ManageFocus::Appointments,
            ),
            lists[1],
        );

        let inputs = vec![input_line(
            "New date",
            &manage.date.value,
            manage.focus == ManageFocus::Date,
        )];
        frame.render_widget(
            Paragraph::new(inputs).block(
                Block::default()
                    .title("Enter to reschedule")
                    .borders(Borders::ALL),
            ),
            chunks[1],
        );
    }

    fn draw_footer(&self, frame: &mut Frame, area: Rect) {
        let (status, loading, hint) = match self.tab {
            Tab::Doctors => (
                &self.doctors.status,
                self.doctors.loading,
                "Type to filter | Tab switch filter | Up/Down select | ^R reload | Esc quit",
            ),
            Tab::Booking => (
                &self.booking.status,
                self.booking.loading,
                "Tab focus | Space choose | Enter book | ^R reload | Esc quit",
            ),
            Tab::Manage => (
                &self.manage.status,
                self.manage.loading,
                "Tab focus | Up/Down select | Enter reschedule | Del delete | Esc quit",
            ),
        };

        let status_line = match status {
            Some(StatusMessage { text, kind }) => {
                let text = if loading {
                    format!("{text} (working...)")
                } else {
                    text.clone()
                };
                Line::from(Span::styled(text, kind.style()))
            }
            None => Line::from(""),
        };

        let footer = Paragraph::new(vec![
            status_line,
            Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
        ])
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::TOP));
        frame.render_widget(footer, area);
    }
}
