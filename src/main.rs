use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use simpledb::driver::{Connection, Driver};
use simpledb::DbConfig;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

/// Reads `;`-terminated SQL statements from stdin and runs each in its own
/// transaction against the database named by `SIMPLEDB_PATH`.
fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let mut conn = match Driver::open_with_config(DbConfig::from_env()) {
        Ok(conn) => conn,
        Err(e) => {
            error!(error = %e, "cannot open database");
            return ExitCode::from(1);
        }
    };

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    let mut pending = String::new();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                error!(error = %e, "cannot read stdin");
                break;
            }
        };
        pending.push_str(&line);
        pending.push('\n');
        for sql in take_statements(&mut pending) {
            if let Err(e) = run(&mut conn, &sql, &mut stdout) {
                report(&mut stdout, &e);
            }
        }
    }
    if !pending.trim().is_empty() {
        if let Err(e) = run(&mut conn, pending.trim(), &mut stdout) {
            report(&mut stdout, &e);
        }
    }
    if let Err(e) = conn.close() {
        error!(error = %e, "closing connection failed");
    }
    ExitCode::SUCCESS
}

/// Removes every complete statement from `buffer`. A `;` inside a string
/// literal does not end a statement.
fn take_statements(buffer: &mut String) -> Vec<String> {
    let mut statements = Vec::new();
    let mut start = 0;
    let mut in_string = false;
    for (i, c) in buffer.char_indices() {
        match c {
            '\'' => in_string = !in_string,
            ';' if !in_string => {
                let sql = buffer[start..i].trim();
                if !sql.is_empty() {
                    statements.push(sql.to_string());
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    buffer.drain(..start);
    statements
}

/// Prints a failed statement's error where its output would have gone.
fn report(out: &mut impl Write, err: &simpledb::DbError) {
    if let Err(e) = writeln!(out, "error: {err}") {
        error!(error = %e, "cannot write to stdout");
    }
}

fn run(conn: &mut Connection, sql: &str, out: &mut impl Write) -> simpledb::Result<()> {
    let is_query = sql
        .split_whitespace()
        .next()
        .is_some_and(|word| word.eq_ignore_ascii_case("select"));
    if !is_query {
        let count = conn.exec(sql)?;
        writeln!(out, "{count} record(s) affected")?;
        return Ok(());
    }

    let mut rows = conn.query(sql)?;
    writeln!(out, "{}", rows.columns().join("\t"))?;
    let mut count = 0;
    while let Some(row) = rows.next()? {
        let fields: Vec<String> = row
            .iter()
            .map(|value| match value.as_str() {
                Some(s) => s.to_string(),
                None => value.to_string(),
            })
            .collect();
        writeln!(out, "{}", fields.join("\t"))?;
        count += 1;
    }
    writeln!(out, "({count} row(s))")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_statements() {
        let mut buffer = String::from("select a from t; insert into t (b) values ('x;y');\nselect");
        let statements = take_statements(&mut buffer);
        assert_eq!(
            statements,
            vec![
                "select a from t".to_string(),
                "insert into t (b) values ('x;y')".to_string(),
            ]
        );
        assert_eq!(buffer, "\nselect");
    }

    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_report_error() {
        let err = simpledb::DbError::Parse("unexpected end".into());
        let mut out = Vec::new();
        report(&mut out, &err);
        assert_eq!(String::from_utf8(out).unwrap(), "error: syntax error: unexpected end\n");

        // a broken stdout is logged, not fatal
        report(&mut ClosedPipe, &err);
    }
}
