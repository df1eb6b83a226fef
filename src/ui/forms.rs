use anyhow::{anyhow, Result};
use chrono::{Duration, NaiveDateTime};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

use crate::models::DATE_FORMAT;

/// Upper bound on the notes column, mirroring its VARCHAR width in the
/// schema the office database was set up with.
pub(crate) const NOTES_MAX_LEN: usize = 400;

/// Characters a date field can hold: `YYYY-MM-DD HH:MM`.
const DATE_INPUT_LEN: usize = 16;

/// Single-line text buffer for the appointment timestamp. Booking and
/// management both reuse it so the parse and future-date rules stay
/// identical between the two flows.
#[derive(Clone)]
pub(crate) struct DateInput {
    pub(crate) value: String,
}

impl DateInput {
    /// Seed the field with a concrete timestamp, pre-formatted for display.
    pub(crate) fn seeded(when: NaiveDateTime) -> Self {
        Self {
            value: when.format(DATE_FORMAT).to_string(),
        }
    }

    /// The default booking suggestion: this time tomorrow.
    pub(crate) fn tomorrow(now: NaiveDateTime) -> Self {
        Self::seeded(now + Duration::days(1))
    }

    /// Replace the buffer with a stored appointment's timestamp.
    pub(crate) fn set(&mut self, when: NaiveDateTime) {
        self.value = when.format(DATE_FORMAT).to_string();
    }

    /// Append a character, restricted to the digits and punctuation the
    /// date format can contain.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        let allowed = ch.is_ascii_digit() || matches!(ch, '-' | ':' | ' ');
        if allowed && self.value.len() < DATE_INPUT_LEN {
            self.value.push(ch);
            true
        } else {
            false
        }
    }

    /// Remove the last character.
    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    /// Parse the buffer into a timestamp.
    pub(crate) fn parse(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(self.value.trim(), DATE_FORMAT)
            .map_err(|_| anyhow!("Date must look like YYYY-MM-DD HH:MM."))
    }

    /// Parse and enforce the shared business rule that appointments are
    /// booked strictly in the future, measured at submission time.
    pub(crate) fn parse_future(&self, now: NaiveDateTime) -> Result<NaiveDateTime> {
        let when = self.parse()?;
        if when <= now {
            return Err(anyhow!("Appointment date must be in the future."));
        }
        Ok(when)
    }
}

/// Free-form notes buffer, capped at the schema's column width so an insert
/// can never be rejected for length.
#[derive(Default, Clone)]
pub(crate) struct NotesInput {
    pub(crate) value: String,
}

impl NotesInput {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !ch.is_control() && self.value.chars().count() < NOTES_MAX_LEN {
            self.value.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.value.pop();
    }

    pub(crate) fn clear(&mut self) {
        self.value.clear();
    }

    /// Blank notes are stored as NULL rather than an empty string.
    pub(crate) fn as_option(&self) -> Option<&str> {
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then_some(trimmed)
    }
}

/// The two substring filters on the doctor browsing screen.
#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum FilterField {
    #[default]
    Name,
    Specialty,
}

/// Filter inputs for the doctor list. Edits flow back to the screen which
/// reloads the list, so this type only owns the text.
#[derive(Default, Clone)]
pub(crate) struct DoctorFilters {
    pub(crate) name: String,
    pub(crate) specialty: String,
    pub(crate) active: FilterField,
}

impl DoctorFilters {
    /// Swap focus between the two filter fields.
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            FilterField::Name => FilterField::Specialty,
            FilterField::Specialty => FilterField::Name,
        };
    }

    /// Append a character to the active filter.
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if ch.is_control() {
            return false;
        }
        match self.active {
            FilterField::Name => self.name.push(ch),
            FilterField::Specialty => self.specialty.push(ch),
        }
        true
    }

    /// Remove the last character from the active filter. Returns whether
    /// anything changed so the caller can skip a pointless reload.
    pub(crate) fn backspace(&mut self) -> bool {
        match self.active {
            FilterField::Name => self.name.pop(),
            FilterField::Specialty => self.specialty.pop(),
        }
        .is_some()
    }

    /// Blank filters mean "match everything" and are passed as absent.
    pub(crate) fn name_filter(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    pub(crate) fn specialty_filter(&self) -> Option<&str> {
        non_blank(&self.specialty)
    }
}

fn non_blank(text: &str) -> Option<&str> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Render one labelled input line, highlighting the active field the same
/// way across every screen.
pub(crate) fn input_line(label: &str, value: &str, active: bool) -> Line<'static> {
    let label_style = if active {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::Gray)
    };
    let shown = if value.is_empty() && !active {
        "<empty>".to_string()
    } else if active {
        format!("{value}_")
    } else {
        value.to_string()
    };
    Line::from(vec![
        Span::styled(format!("{label}: "), label_style),
        Span::raw(shown),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2030, 6, day)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn date_input_round_trips_through_the_display_format() {
        let input = DateInput::seeded(noon(5));
        assert_eq!(input.value, "2030-06-05 12:00");
        assert_eq!(input.parse().expect("parse"), noon(5));
    }

    #[test]
    fn garbage_dates_are_rejected_with_a_format_hint() {
        let input = DateInput {
            value: "next tuesday".into(),
        };
        let err = input.parse().unwrap_err();
        assert!(err.to_string().contains("YYYY-MM-DD HH:MM"));
    }

    #[test]
    fn past_and_present_dates_fail_the_future_rule() {
        let input = DateInput::seeded(noon(5));
        assert!(input.parse_future(noon(6)).is_err());
        assert!(input.parse_future(noon(5)).is_err());
        assert!(input.parse_future(noon(4)).is_ok());
    }

    #[test]
    fn date_input_only_accepts_date_characters() {
        let mut input = DateInput { value: String::new() };
        assert!(input.push_char('2'));
        assert!(input.push_char('-'));
        assert!(!input.push_char('x'));
        assert_eq!(input.value, "2-");
    }

    #[test]
    fn notes_are_capped_at_the_column_width() {
        let mut notes = NotesInput::default();
        for _ in 0..NOTES_MAX_LEN {
            assert!(notes.push_char('a'));
        }
        assert!(!notes.push_char('a'));
        assert_eq!(notes.value.len(), NOTES_MAX_LEN);
    }

    #[test]
    fn blank_notes_become_none() {
        let mut notes = NotesInput::default();
        assert_eq!(notes.as_option(), None);
        notes.push_char(' ');
        assert_eq!(notes.as_option(), None);
        notes.push_char('x');
        assert_eq!(notes.as_option(), Some("x"));
    }

    #[test]
    fn blank_filters_match_everything() {
        let mut filters = DoctorFilters::default();
        assert_eq!(filters.name_filter(), None);
        filters.push_char('a');
        assert_eq!(filters.name_filter(), Some("a"));
        filters.toggle_field();
        filters.push_char(' ');
        assert_eq!(filters.specialty_filter(), None);
    }
}
