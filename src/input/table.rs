use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use flate2::read::MultiGzDecoder;

use crate::input::{CellValue, InputError, SheetTable, TableSource, source_name};

pub fn open_maybe_gz(path: &Path) -> Result<Box<dyn BufRead>, InputError> {
    let file = File::open(path)?;
    if path.extension().is_some_and(|ext| ext == "gz") {
        Ok(Box::new(BufReader::new(MultiGzDecoder::new(file))))
    } else {
        Ok(Box::new(BufReader::new(file)))
    }
}

fn delimiter_for(path: &Path) -> u8 {
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    let name = name.as_deref().unwrap_or("");
    let name = name.strip_suffix(".gz").unwrap_or(name);
    if name.ends_with(".csv") { b',' } else { b'\t' }
}

/// Splits one line into fields. Tab-delimited lines split plainly; comma
/// lines honor double-quoted fields with `""` escapes, which spreadsheet
/// CSV exports produce for values containing commas.
fn split_fields(line: &str, delim: u8) -> Vec<String> {
    if delim == b'\t' {
        return line.split('\t').map(|s| s.to_string()).collect();
    }
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        if in_quotes {
            if ch == '"' {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            } else {
                field.push(ch);
            }
        } else if ch == '"' {
            in_quotes = true;
        } else if ch == delim as char {
            fields.push(std::mem::take(&mut field));
        } else {
            field.push(ch);
        }
    }
    fields.push(field);
    fields
}

fn parse_cell(raw: &str) -> CellValue {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return CellValue::Blank;
    }
    // Keys like "007" or "+45" must survive as text; only canonical numeric
    // forms become numbers.
    let padded_zero =
        trimmed.len() > 1 && trimmed.starts_with('0') && !trimmed.starts_with("0.");
    if !padded_zero && !trimmed.starts_with('+') {
        if let Ok(n) = trimmed.parse::<f64>() {
            if n.is_finite() {
                return CellValue::Number(n);
            }
        }
    }
    CellValue::Text(trimmed.to_string())
}

/// Reads one delimited export (TSV or CSV, optionally gzipped) into a
/// [`SheetTable`]. The first non-empty line is the header; zero data rows is
/// a valid, empty table.
pub fn load_table(path: &Path) -> Result<TableSource, InputError> {
    if !path.exists() {
        return Err(InputError::MissingInput(format!(
            "table file {} does not exist",
            path.display()
        )));
    }
    let delim = delimiter_for(path);
    let mut reader = open_maybe_gz(path)?;
    let mut buf = String::new();

    let columns = loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            return Err(InputError::Parse(format!(
                "table file {} has no header line",
                path.display()
            )));
        }
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        break split_fields(line, delim)
            .into_iter()
            .map(|s| s.trim().to_string())
            .collect::<Vec<_>>();
    };

    let mut rows = Vec::new();
    loop {
        buf.clear();
        let read = reader.read_line(&mut buf)?;
        if read == 0 {
            break;
        }
        let line = buf.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() {
            continue;
        }
        let mut cells: Vec<CellValue> =
            split_fields(line, delim).iter().map(|f| parse_cell(f)).collect();
        // Ragged exports are common; pad short rows so column lookups stay
        // in bounds.
        while cells.len() < columns.len() {
            cells.push(CellValue::Blank);
        }
        rows.push(cells);
    }

    let name = source_name(path);
    tracing::info!(
        table = %name,
        columns = columns.len(),
        rows = rows.len(),
        "loaded table"
    );

    Ok(TableSource {
        available_tables: vec![name.clone()],
        table: SheetTable {
            name,
            columns,
            rows,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static DIR_COUNTER: AtomicUsize = AtomicUsize::new(0);

    fn make_temp_dir() -> PathBuf {
        let mut dir = std::env::temp_dir();
        let id = DIR_COUNTER.fetch_add(1, Ordering::SeqCst);
        dir.push(format!("apptally_table_test_{}_{}", std::process::id(), id));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn write_file(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    fn write_gz(path: &Path, contents: &str) {
        let file = File::create(path).unwrap();
        let mut enc = flate2::write::GzEncoder::new(file, flate2::Compression::default());
        enc.write_all(contents.as_bytes()).unwrap();
        enc.finish().unwrap();
    }

    #[test]
    fn test_load_tsv_table() {
        let dir = make_temp_dir();
        let path = dir.join("register.tsv");
        write_file(
            &path,
            "Ministry\tDepartment\tDivision\tApplication ID\tStatus\n\
             Finance\tBudget\tPlanning\tAPP-1\tDraft\n\
             Finance\tBudget\t\tAPP-2\tSubmitted\n",
        );
        let source = load_table(&path).unwrap();
        assert_eq!(source.table.name, "register");
        assert_eq!(source.available_tables, vec!["register".to_string()]);
        assert_eq!(source.table.columns.len(), 5);
        assert_eq!(source.table.rows.len(), 2);
        assert_eq!(source.table.rows[1][2], CellValue::Blank);
    }

    #[test]
    fn test_load_csv_with_quotes_and_numbers() {
        let dir = make_temp_dir();
        let path = dir.join("export.csv");
        write_file(
            &path,
            "Ministry,Department,Division,Application ID,Status\n\
             \"Health, Public\",Clinics,North,101,Approved\n",
        );
        let source = load_table(&path).unwrap();
        let row = &source.table.rows[0];
        assert_eq!(row[0], CellValue::Text("Health, Public".to_string()));
        assert_eq!(row[3], CellValue::Number(101.0));
    }

    #[test]
    fn test_load_gz_table() {
        let dir = make_temp_dir();
        let path = dir.join("register.tsv.gz");
        write_gz(
            &path,
            "Ministry\tDepartment\tDivision\tApplication ID\tStatus\nA\tB\tC\tX-1\tDraft\n",
        );
        let source = load_table(&path).unwrap();
        assert_eq!(source.table.rows.len(), 1);
    }

    #[test]
    fn test_zero_row_table_is_not_an_error() {
        let dir = make_temp_dir();
        let path = dir.join("empty.tsv");
        write_file(&path, "Ministry\tDepartment\tDivision\tApplication ID\tStatus\n");
        let source = load_table(&path).unwrap();
        assert!(source.table.rows.is_empty());
    }

    #[test]
    fn test_missing_file_and_empty_file() {
        let dir = make_temp_dir();
        let missing = load_table(&dir.join("nope.tsv"));
        assert!(matches!(missing, Err(InputError::MissingInput(_))));

        let path = dir.join("blank.tsv");
        write_file(&path, "");
        let empty = load_table(&path);
        assert!(matches!(empty, Err(InputError::Parse(_))));
    }

    #[test]
    fn test_leading_zero_key_stays_text() {
        assert_eq!(parse_cell("007"), CellValue::Text("007".to_string()));
        assert_eq!(parse_cell("0"), CellValue::Number(0.0));
        assert_eq!(parse_cell("0.5"), CellValue::Number(0.5));
        assert_eq!(parse_cell(" 12 "), CellValue::Number(12.0));
    }

    #[test]
    fn test_split_fields_quoted_escapes() {
        assert_eq!(
            split_fields("a,\"b\"\"c\",d", b','),
            vec!["a", "b\"c", "d"]
        );
        assert_eq!(split_fields("a\tb\tc", b'\t'), vec!["a", "b", "c"]);
    }
}
