use super::*;

pub fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub fn ensure_schema(connection: &Connection) -> Result<()> {
    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS docs (
          doc_id TEXT PRIMARY KEY,
          filename TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          page_count INTEGER,
          outline_rows INTEGER,
          dtc_sections INTEGER,
          extracted_at TEXT
        );

        CREATE TABLE IF NOT EXISTS solutions (
          doc_id TEXT NOT NULL,
          record_seq INTEGER NOT NULL,
          pdf_file TEXT NOT NULL,
          section TEXT,
          observation TEXT,
          dtc TEXT NOT NULL,
          solution_name TEXT,
          solution TEXT,
          PRIMARY KEY(doc_id, record_seq),
          FOREIGN KEY(doc_id) REFERENCES docs(doc_id)
        );

        CREATE INDEX IF NOT EXISTS idx_solutions_dtc ON solutions(dtc);
        ",
    )?;

    connection.execute(
        "
        INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
        ON CONFLICT(key) DO UPDATE SET value=excluded.value
        ",
        params![DB_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// Replace everything stored for one manual with a fresh extraction.
pub fn write_manual(
    transaction: &Transaction<'_>,
    manual: &ManualExtraction,
    records: &[SolutionRecord],
    extracted_at: &str,
) -> Result<usize> {
    let doc_id = doc_id_for(&manual.pdf);

    transaction
        .execute(
            "
            INSERT INTO docs(doc_id, filename, sha256, page_count, outline_rows, dtc_sections, extracted_at)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(doc_id) DO UPDATE SET
              filename=excluded.filename,
              sha256=excluded.sha256,
              page_count=excluded.page_count,
              outline_rows=excluded.outline_rows,
              dtc_sections=excluded.dtc_sections,
              extracted_at=excluded.extracted_at
            ",
            params![
                doc_id,
                manual.pdf.filename,
                manual.pdf.sha256,
                manual.page_count as i64,
                manual.outline_rows as i64,
                manual.sections.len() as i64,
                extracted_at,
            ],
        )
        .with_context(|| format!("failed to upsert doc {}", doc_id))?;

    transaction
        .execute("DELETE FROM solutions WHERE doc_id = ?1", params![doc_id])
        .with_context(|| format!("failed to clear solutions of {}", doc_id))?;

    let mut statement = transaction.prepare(
        "
        INSERT INTO solutions(doc_id, record_seq, pdf_file, section, observation, dtc, solution_name, solution)
        VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        ",
    )?;

    for (record_seq, record) in records.iter().enumerate() {
        statement
            .execute(params![
                doc_id,
                record_seq as i64,
                record.pdf_file,
                record.section,
                record.observation,
                record.dtc,
                record.solution_name,
                record.solution,
            ])
            .with_context(|| format!("failed to insert solution record {} of {}", record_seq, doc_id))?;
    }

    Ok(records.len())
}

pub fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

/// Manuals are keyed by file stem.
pub fn doc_id_for(pdf: &PdfEntry) -> String {
    Path::new(&pdf.filename)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(&pdf.filename)
        .to_string()
}
