//! CSV rendering of task listings

use taskboard_types::Task;

const HEADER: [&str; 3] = ["ID", "Name", "Description"];

/// Render tasks as CSV with an `ID,Name,Description` header.
///
/// Fields containing a comma, quote or line break are quoted and inner
/// quotes doubled (RFC 4180). Lines end with CRLF.
pub fn render_tasks(tasks: &[Task]) -> String {
    let mut out = String::new();
    write_record(&mut out, HEADER.iter().copied());

    for task in tasks {
        let id = task.id.to_string();
        write_record(
            &mut out,
            [id.as_str(), task.name.as_str(), task.description.as_str()].into_iter(),
        );
    }

    out
}

fn write_record<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push_str("\r\n");
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_only_when_empty() {
        assert_eq!(render_tasks(&[]), "ID,Name,Description\r\n");
    }

    #[test]
    fn test_plain_rows() {
        let tasks = vec![Task::new(1, "Alpha", "first"), Task::new(2, "Beta", "second")];
        assert_eq!(
            render_tasks(&tasks),
            "ID,Name,Description\r\n1,Alpha,first\r\n2,Beta,second\r\n"
        );
    }

    #[test]
    fn test_escaping() {
        let tasks = vec![Task::new(3, "a,b", "say \"hi\"\nthen leave")];
        assert_eq!(
            render_tasks(&tasks),
            "ID,Name,Description\r\n3,\"a,b\",\"say \"\"hi\"\"\nthen leave\"\r\n"
        );
    }
}
