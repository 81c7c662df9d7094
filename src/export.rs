//! Rendering the grid for people: CSV files and terminal tables

use crate::recon::{Grid, Summary};
use chrono::{Datelike, NaiveDate};
use itertools::Itertools;
use std::{fmt, io};

/// Write `grid` as CSV: one row per user, one column per date, then total confirmed hours.
///
/// Cells use the compact [`CellStatus`](crate::recon::CellStatus) text.
/// The total is fractional hours, e.g. `12.5`.
///
/// # Errors
///
/// Whatever the writer reports.
pub fn write_csv<W: io::Write>(grid: &Grid, writer: W) -> Result<(), csv::Error> {
    let mut out = csv::Writer::from_writer(writer);

    let header = std::iter::once("user".to_string())
        .chain(grid.dates().iter().map(NaiveDate::to_string))
        .chain(std::iter::once("total_hours".to_string()));
    out.write_record(header)?;

    for row in grid.rows() {
        let record = std::iter::once(row.user.display_name.clone())
            .chain(row.cells.iter().map(|cell| cell.status.to_string()))
            .chain(std::iter::once(row.confirmed_total().hours().to_string()));
        out.write_record(record)?;
    }

    out.flush()?;
    Ok(())
}

/// Column header for a date, e.g. `07/10 Wed`.
fn date_label(date: NaiveDate) -> String {
    format!("{:02}/{:02} {}", date.month(), date.day(), date.weekday())
}

/// Write `grid` as an aligned text table with one line per date and one column per user.
///
/// The last line holds each user's confirmed total.
///
/// # Errors
///
/// Whatever the writer reports.
pub fn write_table<W: fmt::Write>(grid: &Grid, out: &mut W) -> fmt::Result {
    let labels = grid.dates().iter().copied().map(date_label).collect_vec();
    let label_width = labels.iter().map(String::len).max().unwrap_or(0).max("total".len());

    let columns = grid
        .rows()
        .iter()
        .map(|row| {
            let texts = row
                .cells
                .iter()
                .map(|cell| cell.status.to_string())
                .collect_vec();
            let total = row.confirmed_total().to_string();
            let width = texts
                .iter()
                .map(|text| text.chars().count())
                .chain([row.user.display_name.chars().count(), total.chars().count()])
                .max()
                .unwrap_or(0);
            (row.user.display_name.as_str(), texts, total, width)
        })
        .collect_vec();

    write!(out, "{:label_width$}", "")?;
    for (name, _, _, width) in &columns {
        write!(out, "  {name:<width$}")?;
    }
    writeln!(out)?;

    for (i, label) in labels.iter().enumerate() {
        write!(out, "{label:<label_width$}")?;
        for (_, texts, _, width) in &columns {
            let text = texts.get(i).map_or("", String::as_str);
            write!(out, "  {text:<width$}")?;
        }
        writeln!(out)?;
    }

    write!(out, "{:<label_width$}", "total")?;
    for (_, _, total, width) in &columns {
        write!(out, "  {total:<width$}")?;
    }
    writeln!(out)
}

/// One line of counts, such as
/// `confirmed 3 · pending 5 · unavailable 1 · not submitted 7 · 12h30m confirmed`.
pub fn summary_line(summary: &Summary) -> String {
    let Summary {
        confirmed,
        pending,
        unavailable,
        not_submitted,
        confirmed_time,
        ..
    } = *summary;
    format!(
        "confirmed {confirmed} · pending {pending} · unavailable {unavailable} · \
         not submitted {not_submitted} · {confirmed_time} confirmed",
    )
}
