use rusqlite::{Connection, OptionalExtension};

/// Opens the in-memory record store and creates the schema.
///
/// All five collections are keyed by natural identifiers. Case-insensitive
/// key rules (student/event ids, mark subject/exam) are carried by
/// `COLLATE NOCASE` on the key columns so that lookups, UNIQUE constraints,
/// and upsert conflict targets all fold case the same way.
pub fn open_store() -> anyhow::Result<Connection> {
    let conn = Connection::open_in_memory()?;

    conn.execute(
        "CREATE TABLE students(
            id TEXT PRIMARY KEY COLLATE NOCASE,
            name TEXT NOT NULL,
            class_name TEXT NOT NULL,
            phone TEXT,
            email TEXT,
            status TEXT NOT NULL DEFAULT 'Active',
            notes TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE events(
            id TEXT PRIMARY KEY COLLATE NOCASE,
            title TEXT NOT NULL,
            date TEXT,
            venue TEXT,
            description TEXT
        )",
        [],
    )?;

    // No foreign key on student_id: attendance deliberately accepts rows
    // for ids the roster has never seen (the shell is the only gate), and
    // listings resolve the student at read time instead. Cascade on
    // student delete is explicit.
    conn.execute(
        "CREATE TABLE attendance(
            id TEXT PRIMARY KEY,
            date TEXT NOT NULL,
            student_id TEXT NOT NULL COLLATE NOCASE,
            status TEXT NOT NULL,
            UNIQUE(date, student_id)
        )",
        [],
    )?;
    conn.execute("CREATE INDEX idx_attendance_date ON attendance(date)", [])?;
    conn.execute(
        "CREATE INDEX idx_attendance_student ON attendance(student_id)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE fees(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL UNIQUE COLLATE NOCASE,
            total REAL NOT NULL,
            paid REAL NOT NULL,
            status TEXT NOT NULL,
            remarks TEXT
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE marks(
            id TEXT PRIMARY KEY,
            student_id TEXT NOT NULL COLLATE NOCASE,
            subject TEXT NOT NULL COLLATE NOCASE,
            exam TEXT NOT NULL COLLATE NOCASE,
            obtained REAL NOT NULL,
            total REAL NOT NULL,
            UNIQUE(student_id, subject, exam)
        )",
        [],
    )?;
    conn.execute("CREATE INDEX idx_marks_student ON marks(student_id)", [])?;

    Ok(conn)
}

pub fn count_students(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM students", [], |r| r.get(0))
}

/// (present, total, percent) for one date. A day with no records is 0%,
/// never a division by zero.
pub fn daily_attendance(conn: &Connection, date: &str) -> rusqlite::Result<(i64, i64, i64)> {
    let (present, total): (i64, i64) = conn.query_row(
        "SELECT
           COUNT(CASE WHEN status = 'Present' THEN 1 END),
           COUNT(*)
         FROM attendance WHERE date = ?",
        [date],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let percent = if total == 0 {
        0
    } else {
        (100.0 * present as f64 / total as f64).round() as i64
    };
    Ok((present, total, percent))
}

/// The short profile the scripted assistant reads for id-shaped questions.
#[derive(Debug, Clone)]
pub struct StudentBrief {
    pub id: String,
    pub name: String,
    pub class_name: String,
    pub status: String,
    pub phone: Option<String>,
}

pub fn find_student_brief(conn: &Connection, id: &str) -> rusqlite::Result<Option<StudentBrief>> {
    conn.query_row(
        "SELECT id, name, class_name, status, phone FROM students WHERE id = ?",
        [id],
        |r| {
            Ok(StudentBrief {
                id: r.get(0)?,
                name: r.get(1)?,
                class_name: r.get(2)?,
                status: r.get(3)?,
                phone: r.get(4)?,
            })
        },
    )
    .optional()
}
