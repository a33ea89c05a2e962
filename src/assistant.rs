use crate::db;
use regex::Regex;
use rusqlite::Connection;

/// Scripted assistant: an ordered list of substring rules evaluated
/// first-match-wins over the lowercased question. Order is load-bearing:
/// several needles can match one input (for example a question containing
/// "attendance today" is answered by the attendance-help rule, which sits
/// earlier). Do not reorder without checking the overlaps.
enum Reply {
    Text(&'static str),
    StudentCount,
    AttendanceToday,
}

struct Rule {
    needles: &'static [&'static str],
    reply: Reply,
}

const RULES: &[Rule] = &[
    Rule {
        needles: &["hello", "hi"],
        reply: Reply::Text(
            "Hello! Ask anything about students, attendance, events, fees or marks in Campus Hub.",
        ),
    },
    Rule {
        needles: &["what can you do", "help"],
        reply: Reply::Text(
            "I can guide you how to use each section: add/search/update/delete students, manage events, mark attendance, update fees and marks, and export or print tables.",
        ),
    },
    Rule {
        needles: &["add student"],
        reply: Reply::Text(
            "Go to the Students section, fill Student ID, Name, Class and other fields, then click Save. The student appears in the Student list table.",
        ),
    },
    Rule {
        needles: &["search student", "find student"],
        reply: Reply::Text(
            "Use the search box in the Students section. You can search by name, ID or class to filter the student table.",
        ),
    },
    Rule {
        needles: &["delete student"],
        reply: Reply::Text(
            "In the Student list table, click Del next to the student, or click Edit then use the Delete student button in the form.",
        ),
    },
    Rule {
        needles: &["mark attendance", "attendance"],
        reply: Reply::Text(
            "Open the Attendance section, choose a date and class, set Present/Absent/Leave for each student, then click Save attendance. You can see history in the Attendance log table.",
        ),
    },
    Rule {
        needles: &["fee", "fees"],
        reply: Reply::Text(
            "In the Fees section, enter an existing Student ID, fill total fee, paid amount and status, then click Save / Update. All fee records are shown in the Fee records table and can be exported to Excel or printed.",
        ),
    },
    Rule {
        needles: &["mark sheet", "marks"],
        reply: Reply::Text(
            "Go to the Marks section, enter Student ID, Subject, Exam name, Marks obtained and Total marks, then click Save / Update. Marks will show in the Marks sheet table.",
        ),
    },
    Rule {
        needles: &["excel", "export"],
        reply: Reply::Text(
            "Every table has an 'Export to Excel' button that downloads the visible data as an .xlsx file.",
        ),
    },
    Rule {
        needles: &["print"],
        reply: Reply::Text(
            "Click the 'Print view' button above a table to open a clean printable page and use your browser's print dialog.",
        ),
    },
    Rule {
        needles: &["how many students", "total students"],
        reply: Reply::StudentCount,
    },
    Rule {
        needles: &["today attendance", "attendance today"],
        reply: Reply::AttendanceToday,
    },
];

const FALLBACK: &str = "This is an on-page assistant, not a full internet AI. Try asking about how to use students, attendance, events, fees, marks, Excel export or print in this website.";

/// Answers one question, reading live aggregates from the store where a
/// rule calls for them.
pub fn answer(conn: &Connection, question: &str) -> anyhow::Result<String> {
    let q = question.to_lowercase();

    for rule in RULES {
        if !rule.needles.iter().any(|n| q.contains(n)) {
            continue;
        }
        return Ok(match &rule.reply {
            Reply::Text(t) => (*t).to_string(),
            Reply::StudentCount => {
                let count = db::count_students(conn)?;
                format!(
                    "Right now there are {} students saved in this session.",
                    count
                )
            }
            Reply::AttendanceToday => {
                let today = chrono::Local::now().format("%Y-%m-%d").to_string();
                let (_, _, percent) = db::daily_attendance(conn, &today)?;
                format!("Today's attendance rate is {}%.", percent)
            }
        });
    }

    // One dynamic lookup: an id-shaped token anywhere in the question.
    let id_pattern = Regex::new(r"stu[0-9]+")?;
    if let Some(m) = id_pattern.find(&q) {
        let token = m.as_str();
        return Ok(match db::find_student_brief(conn, token)? {
            Some(st) => format!(
                "Student {} is {} in {} with status {}. Phone: {}.",
                st.id,
                st.name,
                st.class_name,
                st.status,
                st.phone.filter(|p| !p.is_empty()).unwrap_or_else(|| "not set".to_string())
            ),
            None => format!(
                "I could not find any student with ID {} in the current data.",
                token
            ),
        });
    }

    Ok(FALLBACK.to_string())
}
