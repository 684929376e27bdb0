mod html;
mod spreadsheet;

pub use html::{render_email_body, write_email_body};
pub use spreadsheet::write_suggestion_workbook;

pub const COLUMN_PADDING: usize = 5;
pub const MAX_COLUMN_WIDTH: usize = 60;

/// Longest cell (in characters) plus padding, capped at [`MAX_COLUMN_WIDTH`].
pub fn column_width<'a>(cells: impl IntoIterator<Item = &'a str>) -> usize {
    let longest = cells
        .into_iter()
        .map(|cell| cell.chars().count())
        .max()
        .unwrap_or(0);

    (longest + COLUMN_PADDING).min(MAX_COLUMN_WIDTH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn width_follows_longest_cell() {
        let cells = ["abc".to_string(), "x".repeat(50), "y".repeat(10)];
        assert_eq!(column_width(cells.iter().map(String::as_str)), 55);
    }

    #[test]
    fn width_is_capped() {
        let long = "z".repeat(200);
        assert_eq!(column_width([long.as_str(), "short"]), MAX_COLUMN_WIDTH);
    }

    #[test]
    fn empty_column_gets_padding_only() {
        assert_eq!(column_width(["", ""]), COLUMN_PADDING);
        assert_eq!(column_width(std::iter::empty()), COLUMN_PADDING);
    }

    #[test]
    fn width_counts_characters_not_bytes() {
        assert_eq!(column_width(["✅✅✅"]), 8);
    }
}
