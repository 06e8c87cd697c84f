//! A1-notation helpers.

/// Column letters for a 0-based column index: 0 → `A`, 25 → `Z`, 26 → `AA`.
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Quote a worksheet title for use in a range (`My Sheet` → `'My Sheet'`).
pub fn quote_sheet(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

/// A whole worksheet as a range.
pub fn sheet_range(title: &str) -> String {
    quote_sheet(title)
}

/// A single cell: 0-based column, 1-based row number as shown in the UI.
pub fn cell(title: &str, column: usize, row_number: usize) -> String {
    format!("{}!{}{}", quote_sheet(title), column_letters(column), row_number)
}
