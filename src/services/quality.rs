//! Static quality checks for written source files.
//!
//! The Reality Engine runs these at write time. A placeholder function
//! body is a hard rejection; TODO markers with no adjacent
//! implementation and missing type annotations are non-blocking
//! warnings. Checks are line-level heuristics, not parsers: they only
//! need to catch an agent handing back a shell of a file.

use std::path::Path;

use crate::domain::models::QualityFinding;

/// Source extensions the quality gate recognizes. Everything else
/// (config, SQL, docs) skips static checks entirely.
const RECOGNIZED_EXTENSIONS: &[&str] = &["rs", "py", "js", "ts", "tsx", "go"];

/// Whether a path names a recognized source-code file.
pub fn is_recognized_source(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RECOGNIZED_EXTENSIONS.contains(&ext))
}

/// Run every static check against a file body.
pub fn check_source(path: &str, content: &str) -> Vec<QualityFinding> {
    if !is_recognized_source(path) {
        return Vec::new();
    }

    let lines: Vec<&str> = content.lines().collect();
    let mut findings = Vec::new();

    for (idx, raw) in lines.iter().enumerate() {
        let line = raw.trim();
        let lineno = idx + 1;

        if let Some(reason) = placeholder_marker(line) {
            findings.push(QualityFinding::blocker(lineno, reason));
        }

        if is_function_head(path, line) {
            if body_is_placeholder(path, &lines, idx) {
                findings.push(QualityFinding::blocker(
                    lineno,
                    "function body is a bare no-op placeholder",
                ));
            }
            if lacks_type_annotations(path, line) {
                findings.push(QualityFinding::warning(
                    lineno,
                    "function signature is missing type annotations",
                ));
            }
        }

        if line.contains("TODO") && !has_adjacent_implementation(&lines, idx) {
            findings.push(QualityFinding::warning(
                lineno,
                "TODO marker with no adjacent implementation",
            ));
        }
    }

    findings
}

/// Explicit not-implemented markers that are placeholders wherever they
/// appear in a body.
fn placeholder_marker(line: &str) -> Option<&'static str> {
    if line.starts_with("todo!(") || line.starts_with("unimplemented!(") {
        return Some("body is a todo!/unimplemented! stub");
    }
    if line.contains("throw new Error(\"Not implemented\")")
        || line.contains("throw new Error('Not implemented')")
    {
        return Some("body throws a not-implemented error");
    }
    if line.contains("panic(\"not implemented\")") || line.contains("panic(\"TODO\")") {
        return Some("body panics as not-implemented");
    }
    None
}

fn is_function_head(path: &str, line: &str) -> bool {
    match extension(path) {
        "py" => line.starts_with("def ") || line.starts_with("async def "),
        "rs" => {
            (line.starts_with("fn ")
                || line.starts_with("pub fn ")
                || line.starts_with("pub(crate) fn ")
                || line.starts_with("async fn ")
                || line.starts_with("pub async fn "))
                && line.contains('(')
        }
        "js" | "ts" | "tsx" => line.starts_with("function ") || line.contains("=> {"),
        "go" => line.starts_with("func ") && line.contains('('),
        _ => false,
    }
}

/// A function head whose entire body is a no-op.
fn body_is_placeholder(path: &str, lines: &[&str], head_idx: usize) -> bool {
    let head = lines[head_idx].trim();

    // One-line empty bodies: `fn x() {}`, `function x() {}`, `func x() {}`
    if head.ends_with("{}") || head.ends_with("{ }") {
        return true;
    }

    // Python: the body is the indented suite after the colon.
    if extension(path) == "py" && head.ends_with(':') {
        let body = lines
            .iter()
            .skip(head_idx + 1)
            .map(|l| l.trim())
            .find(|l| !l.is_empty() && !l.starts_with('#'));
        return matches!(body, Some("pass") | Some("..."));
    }

    // Brace languages: a body that opens and immediately closes.
    if head.ends_with('{') {
        let body = lines
            .iter()
            .skip(head_idx + 1)
            .map(|l| l.trim())
            .find(|l| !l.is_empty());
        return matches!(body, Some("}"));
    }

    false
}

/// Whether a TODO line is followed by real code rather than silence.
fn has_adjacent_implementation(lines: &[&str], idx: usize) -> bool {
    lines
        .iter()
        .skip(idx + 1)
        .map(|l| l.trim())
        .find(|l| !l.is_empty())
        .is_some_and(|next| {
            !next.starts_with('}')
                && !next.starts_with('#')
                && !next.starts_with("//")
                && next != "pass"
        })
}

fn lacks_type_annotations(path: &str, line: &str) -> bool {
    let params = match param_list(line) {
        Some(p) => p,
        None => return false,
    };

    match extension(path) {
        "py" => {
            let meaningful: Vec<&str> = params
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty() && *p != "self" && *p != "cls")
                .collect();
            !meaningful.is_empty() && meaningful.iter().all(|p| !p.contains(':'))
        }
        "ts" | "tsx" => {
            let meaningful: Vec<&str> = params
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .collect();
            !meaningful.is_empty() && meaningful.iter().all(|p| !p.contains(':'))
        }
        _ => false,
    }
}

fn param_list(line: &str) -> Option<&str> {
    let open = line.find('(')?;
    let close = line.rfind(')')?;
    (open < close).then(|| &line[open + 1..close])
}

fn extension(path: &str) -> &str {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FindingSeverity;

    fn blockers(path: &str, content: &str) -> usize {
        check_source(path, content)
            .iter()
            .filter(|f| f.severity == FindingSeverity::Blocker)
            .count()
    }

    fn warnings(path: &str, content: &str) -> usize {
        check_source(path, content)
            .iter()
            .filter(|f| f.severity == FindingSeverity::Warning)
            .count()
    }

    #[test]
    fn test_unrecognized_files_skip_checks() {
        assert!(check_source("notes.md", "TODO everything").is_empty());
        assert!(check_source("schema.sql", "-- TODO").is_empty());
    }

    #[test]
    fn test_python_pass_body_is_blocker() {
        let content = "def handler(event):\n    pass\n";
        assert_eq!(blockers("app.py", content), 1);
    }

    #[test]
    fn test_python_ellipsis_body_is_blocker() {
        let content = "def handler(event):\n    ...\n";
        assert_eq!(blockers("app.py", content), 1);
    }

    #[test]
    fn test_python_real_body_passes() {
        let content = "def handler(event: dict) -> str:\n    return event[\"id\"]\n";
        assert_eq!(blockers("app.py", content), 0);
    }

    #[test]
    fn test_rust_todo_macro_is_blocker() {
        let content = "pub fn schedule(&self) -> Vec<Task> {\n    todo!()\n}\n";
        assert_eq!(blockers("engine.rs", content), 1);
    }

    #[test]
    fn test_rust_empty_body_is_blocker() {
        assert_eq!(blockers("engine.rs", "fn run() {}\n"), 1);
    }

    #[test]
    fn test_js_empty_function_is_blocker() {
        assert_eq!(blockers("app.js", "function handler(req) {}\n"), 1);
    }

    #[test]
    fn test_go_empty_body_is_blocker() {
        let content = "func Handle(w http.ResponseWriter) {\n}\n";
        assert_eq!(blockers("handler.go", content), 1);
    }

    #[test]
    fn test_todo_without_implementation_warns() {
        let content = "fn run() {\n    // TODO handle retries\n}\n";
        assert_eq!(warnings("engine.rs", content), 1);
        assert_eq!(blockers("engine.rs", content), 0);
    }

    #[test]
    fn test_todo_with_implementation_does_not_warn() {
        let content = "fn run() {\n    // TODO tighten the bound\n    let n = 3;\n    drain(n);\n}\n";
        assert_eq!(warnings("engine.rs", content), 0);
    }

    #[test]
    fn test_python_missing_annotations_warns() {
        let content = "def compute(width, height):\n    return width * height\n";
        assert_eq!(warnings("calc.py", content), 1);
        assert_eq!(blockers("calc.py", content), 0);
    }

    #[test]
    fn test_python_annotated_params_pass() {
        let content = "def compute(width: int, height: int) -> int:\n    return width * height\n";
        assert_eq!(warnings("calc.py", content), 0);
    }
}
