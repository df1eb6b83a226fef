use anyhow::Error;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, List, ListItem};

/// Build the bordered list widget every screen uses for its pickers. The
/// border highlights when the list has keyboard focus, and the marker column
/// distinguishes the cursor row from an explicitly selected row.
pub(crate) fn picker_list<'a>(
    title: &'a str,
    rows: impl Iterator<Item = (String, bool)>,
    cursor: usize,
    focused: bool,
) -> List<'a> {
    let items: Vec<ListItem> = rows
        .enumerate()
        .map(|(idx, (text, marked))| {
            let marker = if marked { "*" } else { " " };
            let line = format!("{marker} {text}");
            let mut style = Style::default();
            if idx == cursor {
                style = style.add_modifier(Modifier::REVERSED);
            }
            ListItem::new(Line::from(line)).style(style)
        })
        .collect();

    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    List::new(items).block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(border_style),
    )
}

/// Extract the most relevant error message from a chained error.
pub(crate) fn surface_error(err: &Error) -> String {
    err.chain()
        .last()
        .map(|cause| cause.to_string())
        .unwrap_or_else(|| err.to_string())
}
